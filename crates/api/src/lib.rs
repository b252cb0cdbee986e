//! Tool-facing API layer for DialogDB
//!
//! Callers at this boundary (tool invocations, RPC glue) want a payload they
//! can hand back verbatim, not a Rust error:
//! - **Create/delete** handlers return `{ success, ..., error }` payloads
//! - **List** handlers degrade to an empty result and log a warning
//! - **Cross-server reads** return the tagged record or the per-server
//!   failures
//!
//! ## Quick Start
//!
//! ```ignore
//! use dialogdb_api::{CreateTableRequest, Handlers};
//!
//! let handlers = Handlers::new(Database::open("/path/to/data")?);
//! let created = handlers.create_table(CreateTableRequest::new("tenant_1", "orders", "Orders")).await;
//! assert!(created.success);
//! let tables = handlers.list_tables("tenant_1");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod handlers;
pub mod types;

pub use handlers::Handlers;
pub use types::{
    CreateTableRequest, CreateTableResponse, DeleteMessagesResponse, ErrorPayload, ReadResponse,
};
