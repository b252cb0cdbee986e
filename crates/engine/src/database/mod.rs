//! Database struct and open logic
//!
//! The Database owns everything the record operations share:
//! - the ordered store (`records.redb` or in-memory)
//! - the per-tenant lock registry
//! - the delete-queue cache
//! - the loaded `dialogdb.toml`
//!
//! Record operations live in sibling modules as further `impl Database`
//! blocks (tables, dialogs, spaces, users, entities).

pub mod config;

pub use config::{Backend, DatabaseConfig, FanoutConfig, CONFIG_FILE_NAME, STORE_FILE_NAME};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dialogdb_concurrency::{DeleteQueue, TenantLocks};
use dialogdb_core::{Error, Result};
use dialogdb_storage::{MemoryStore, OrderedStore, RedbStore};
use tracing::info;

use crate::query::QueryEngine;

/// Embedded multi-tenant record database
///
/// Create one with [`Database::open`] (disk, configured by `dialogdb.toml`)
/// or [`Database::ephemeral`] (memory). Share it as `Arc<Database>`.
///
/// # Example
///
/// ```ignore
/// use dialogdb_engine::Database;
///
/// let db = Database::open("/path/to/data")?;
/// let dialog = db.create_dialog("user_1", "Support chat").await?;
/// db.append_message(&dialog.id, json!({"text": "hello"})).await?;
/// let latest = db.get_latest_messages(&dialog.id, 20)?;
/// ```
pub struct Database {
    /// Data directory path (`None` for ephemeral databases)
    data_dir: Option<PathBuf>,

    /// Ordered store shared by every operation
    store: Arc<dyn OrderedStore>,

    /// Serializes read-check-write sequences per tenant
    locks: TenantLocks,

    /// Ids whose delete is in flight, consulted by read paths
    deletes: DeleteQueue,

    config: DatabaseConfig,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("data_dir", &self.data_dir)
            .field("backend", &self.store.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl Database {
    /// Open a database in `path`, creating it if needed
    ///
    /// Creates the directory and a default `dialogdb.toml` when missing,
    /// then opens the configured backend.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|e| Error::store("open", e))?;

        let config_path = data_dir.join(CONFIG_FILE_NAME);
        DatabaseConfig::write_default_if_missing(&config_path)?;
        let cfg = DatabaseConfig::from_file(&config_path)?;

        Self::open_at(data_dir, cfg)
    }

    /// Open a database in `path` with an explicit configuration
    ///
    /// The configuration is written to `dialogdb.toml` so a later
    /// [`Database::open`] picks up the same settings.
    pub fn open_with_config<P: AsRef<Path>>(path: P, cfg: DatabaseConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        let data_dir = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir).map_err(|e| Error::store("open", e))?;
        cfg.write_to_file(&data_dir.join(CONFIG_FILE_NAME))?;

        Self::open_at(data_dir, cfg)
    }

    fn open_at(data_dir: PathBuf, cfg: DatabaseConfig) -> Result<Arc<Self>> {
        let store: Arc<dyn OrderedStore> = match cfg.backend()? {
            Backend::Disk => Arc::new(RedbStore::open_with_chunk_size(
                data_dir.join(STORE_FILE_NAME),
                cfg.scan_chunk_size,
            )?),
            Backend::Memory => Arc::new(MemoryStore::with_chunk_size(cfg.scan_chunk_size)),
        };
        info!(
            target: "dialogdb::db",
            path = ?data_dir,
            backend = store.backend_name(),
            "Database opened"
        );
        Ok(Arc::new(Self::assemble(Some(data_dir), store, cfg)))
    }

    /// Create an in-memory database with default settings
    ///
    /// Nothing touches the filesystem; data is lost on drop.
    pub fn ephemeral() -> Arc<Self> {
        let cfg = DatabaseConfig::memory();
        let store = Arc::new(MemoryStore::with_chunk_size(cfg.scan_chunk_size));
        Arc::new(Self::assemble(None, store, cfg))
    }

    /// Build a database over a caller-supplied store
    ///
    /// `cfg.backend` is ignored; the remaining settings apply.
    pub fn with_store(store: Arc<dyn OrderedStore>, cfg: DatabaseConfig) -> Result<Arc<Self>> {
        cfg.validate()?;
        Ok(Arc::new(Self::assemble(None, store, cfg)))
    }

    fn assemble(data_dir: Option<PathBuf>, store: Arc<dyn OrderedStore>, config: DatabaseConfig) -> Self {
        Self {
            data_dir,
            store,
            locks: TenantLocks::with_timeout(config.lock_timeout()),
            deletes: DeleteQueue::new(),
            config,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Data directory (`None` for ephemeral databases)
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Active configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// The underlying ordered store
    pub fn store(&self) -> &dyn OrderedStore {
        self.store.as_ref()
    }

    /// Per-tenant lock registry
    pub fn locks(&self) -> &TenantLocks {
        &self.locks
    }

    /// Delete-queue cache
    pub fn delete_queue(&self) -> &DeleteQueue {
        &self.deletes
    }

    /// Range query engine over this database's store and delete queue
    pub fn query(&self) -> QueryEngine<'_> {
        QueryEngine::new(
            self.store(),
            &self.deletes,
            self.config.default_page_size,
            self.config.max_page_size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_writes_default_config_and_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db");

        let db = Database::open(&path).unwrap();
        assert_eq!(db.data_dir(), Some(path.as_path()));
        assert_eq!(db.store().backend_name(), "redb");
        assert!(path.join(CONFIG_FILE_NAME).exists());
        assert!(path.join(STORE_FILE_NAME).exists());
    }

    #[test]
    fn test_open_honours_memory_backend() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "backend = \"memory\"\n").unwrap();

        let db = Database::open(dir.path()).unwrap();
        assert_eq!(db.store().backend_name(), "memory");
        assert!(!dir.path().join(STORE_FILE_NAME).exists());
    }

    #[test]
    fn test_open_with_config_persists_settings() {
        let dir = TempDir::new().unwrap();
        let cfg = DatabaseConfig {
            lock_timeout_ms: Some(100),
            ..DatabaseConfig::default()
        };
        let db = Database::open_with_config(dir.path(), cfg).unwrap();
        assert_eq!(db.locks().timeout(), Some(std::time::Duration::from_millis(100)));
        drop(db);

        let reloaded = DatabaseConfig::from_file(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(reloaded.lock_timeout_ms, Some(100));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "scan_chunk_size = 0\n").unwrap();
        assert!(matches!(Database::open(dir.path()), Err(Error::Config(_))));
    }

    #[test]
    fn test_ephemeral_has_no_directory() {
        let db = Database::ephemeral();
        assert!(db.data_dir().is_none());
        assert_eq!(db.store().backend_name(), "memory");
    }
}
