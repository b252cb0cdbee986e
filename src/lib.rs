//! DialogDB - embedded multi-tenant record storage
//!
//! DialogDB keeps dialogs, messages, tables, spaces and users in one ordered
//! key-value store. Keys are designed so every listing is a prefix range and
//! creation order equals key order.
//!
//! # Quick Start
//!
//! ```ignore
//! use dialogdb::{Database, Direction};
//! use serde_json::json;
//!
//! // Disk-backed database with dialogdb.toml in the directory
//! let db = Database::open("/path/to/data")?;
//!
//! let dialog = db.create_dialog("user_1", "Support").await?;
//! db.append_message(&dialog.id, json!({"role": "user", "text": "hi"})).await?;
//!
//! // Newest first
//! let latest = db.get_latest_messages(&dialog.id, 20)?;
//! ```
//!
//! # Architecture
//!
//! | Layer | Crate |
//! |-------|-------|
//! | Keys, errors, records | `dialogdb-core` |
//! | Ordered store (redb / memory) | `dialogdb-storage` |
//! | Tenant locks, delete queue | `dialogdb-concurrency` |
//! | Database, pagination, registry | `dialogdb-engine` |
//! | Cross-server reads | `dialogdb-remote` |
//! | Boundary handlers | `dialogdb-api` |

pub use dialogdb_api::{CreateTableRequest, CreateTableResponse, Handlers};
pub use dialogdb_core::{
    keys, ColumnDef, DeleteOutcome, DeletedKeys, DialogRecord, Error, IndexDef, Key, KeyRange,
    MessageRecord, Record, Result, SortableId, SpaceMember, TableMetadata,
};
pub use dialogdb_engine::{Database, DatabaseConfig, ListScope, Page, PageRequest};
pub use dialogdb_remote::{FanoutReader, HttpRecordSource, RecordSource, SourcedRecord};
pub use dialogdb_storage::{Direction, MemoryStore, OrderedStore, RedbStore};
