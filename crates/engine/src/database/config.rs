//! Database configuration via `dialogdb.toml`
//!
//! On first open, a default `dialogdb.toml` is created in the data
//! directory. To change settings, edit the file and reopen the database.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use dialogdb_core::{Error, Result};

/// Config file name placed in the database data directory.
pub const CONFIG_FILE_NAME: &str = "dialogdb.toml";

/// Store file name placed in the database data directory.
pub const STORE_FILE_NAME: &str = "records.redb";

/// Fan-out read settings, persisted under `[fanout]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FanoutConfig {
    /// Per-server request timeout in milliseconds (default: 5000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Path appended to each server address before `/{id}`
    #[serde(default = "default_read_path")]
    pub read_path: String,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

fn default_read_path() -> String {
    "/api/v1/db/read".to_string()
}

impl Default for FanoutConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            read_path: default_read_path(),
        }
    }
}

impl FanoutConfig {
    /// Per-server request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Storage backend selected by `backend`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `records.redb` in the data directory
    Disk,
    /// In-memory, lost on drop
    Memory,
}

/// Database configuration loaded from `dialogdb.toml`.
///
/// # Example
///
/// ```toml
/// backend = "disk"
/// # lock_timeout_ms = 10000
/// scan_chunk_size = 256
///
/// [fanout]
/// request_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Storage backend: `"disk"` or `"memory"`.
    #[serde(default = "default_backend_str")]
    pub backend: String,
    /// Bounded wait for a tenant lock; unset waits indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_timeout_ms: Option<u64>,
    /// Entries fetched per read transaction during iteration.
    #[serde(default = "default_scan_chunk_size")]
    pub scan_chunk_size: usize,
    /// Page size used when a listing does not specify one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Upper clamp for any requested page size.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
    /// Fan-out read settings.
    #[serde(default)]
    pub fanout: FanoutConfig,
}

fn default_backend_str() -> String {
    "disk".to_string()
}

fn default_scan_chunk_size() -> usize {
    256
}

fn default_page_size() -> usize {
    50
}

fn default_max_page_size() -> usize {
    1000
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: default_backend_str(),
            lock_timeout_ms: None,
            scan_chunk_size: default_scan_chunk_size(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            fanout: FanoutConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Config for an in-memory database, all other settings default.
    pub fn memory() -> Self {
        Self {
            backend: "memory".to_string(),
            ..Self::default()
        }
    }

    /// Parse the backend string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not `"disk"` or `"memory"`.
    pub fn backend(&self) -> Result<Backend> {
        match self.backend.as_str() {
            "disk" => Ok(Backend::Disk),
            "memory" => Ok(Backend::Memory),
            other => Err(Error::Config(format!(
                "Invalid backend '{}' in {}. Expected \"disk\" or \"memory\".",
                other, CONFIG_FILE_NAME
            ))),
        }
    }

    /// Tenant lock wait bound, if any.
    pub fn lock_timeout(&self) -> Option<Duration> {
        self.lock_timeout_ms.map(Duration::from_millis)
    }

    /// Check every value eagerly.
    pub fn validate(&self) -> Result<()> {
        self.backend()?;
        if self.scan_chunk_size == 0 {
            return Err(Error::Config("scan_chunk_size must be at least 1".into()));
        }
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(Error::Config("page sizes must be at least 1".into()));
        }
        if self.default_page_size > self.max_page_size {
            return Err(Error::Config(format!(
                "default_page_size ({}) exceeds max_page_size ({})",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.fanout.request_timeout_ms == 0 {
            return Err(Error::Config("fanout.request_timeout_ms must be at least 1".into()));
        }
        if !self.fanout.read_path.starts_with('/') {
            return Err(Error::Config(format!(
                "fanout.read_path '{}' must start with '/'",
                self.fanout.read_path
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# DialogDB configuration
#
# Storage backend: "disk" (default) or "memory"
#   "disk"   = records.redb in this directory
#   "memory" = nothing persisted, data lost when the process exits
backend = "disk"

# Bounded wait for a tenant lock, in milliseconds.
# Unset (default) waits indefinitely.
# lock_timeout_ms = 10000

# Entries fetched per read transaction while iterating a range.
scan_chunk_size = 256

# Page sizes for listings.
default_page_size = 50
max_page_size = 1000

[fanout]
# Per-server timeout for cross-server reads.
request_timeout_ms = 5000
# Requests go to {server}{read_path}/{id}
read_path = "/api/v1/db/read"
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: DatabaseConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::Config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::Config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_disk() {
        let config = DatabaseConfig::default();
        assert_eq!(config.backend().unwrap(), Backend::Disk);
        assert!(config.lock_timeout().is_none());
        config.validate().unwrap();
    }

    #[test]
    fn default_toml_parses_correctly() {
        let config: DatabaseConfig = toml::from_str(DatabaseConfig::default_toml()).unwrap();
        assert_eq!(config, DatabaseConfig::default());
    }

    #[test]
    fn parse_invalid_backend_returns_error() {
        let config: DatabaseConfig = toml::from_str("backend = \"tape\"").unwrap();
        assert!(matches!(config.backend(), Err(Error::Config(_))));
    }

    #[test]
    fn page_sizes_are_checked() {
        let config: DatabaseConfig =
            toml::from_str("default_page_size = 100\nmax_page_size = 10").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn read_path_must_be_absolute() {
        let config: DatabaseConfig = toml::from_str("[fanout]\nread_path = \"read\"").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn write_default_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        assert!(!path.exists());

        DatabaseConfig::write_default_if_missing(&path).unwrap();
        assert!(path.exists());

        let config = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config.backend, "disk");
    }

    #[test]
    fn write_default_does_not_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        std::fs::write(&path, "backend = \"memory\"\n").unwrap();
        DatabaseConfig::write_default_if_missing(&path).unwrap();

        let config = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config.backend().unwrap(), Backend::Memory);
    }

    #[test]
    fn from_file_with_missing_fields_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();

        let config = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(config, DatabaseConfig::default());
    }

    #[test]
    fn from_file_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "backend = [").unwrap();
        assert!(matches!(DatabaseConfig::from_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn lock_timeout_and_fanout_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let config = DatabaseConfig {
            lock_timeout_ms: Some(250),
            fanout: FanoutConfig {
                request_timeout_ms: 1500,
                read_path: "/read".to_string(),
            },
            ..DatabaseConfig::default()
        };
        config.write_to_file(&path).unwrap();

        let loaded = DatabaseConfig::from_file(&path).unwrap();
        assert_eq!(loaded.lock_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(loaded.fanout.request_timeout(), Duration::from_millis(1500));
        assert_eq!(loaded.fanout.read_path, "/read");
    }

    #[test]
    fn unset_lock_timeout_is_not_serialized() {
        let toml_str = toml::to_string_pretty(&DatabaseConfig::default()).unwrap();
        assert!(!toml_str.contains("lock_timeout_ms"));
        assert!(toml_str.contains("[fanout]"));
    }
}
