//! Core types for DialogDB
//!
//! This crate defines the foundational types used throughout the system:
//! - Error: Error taxonomy and `Result` alias
//! - Key / KeyRange: Ordered keys and prefix ranges
//! - keys: The key scheme (identifier to key derivations)
//! - SortableId: Time-ordered unique identifiers for creation-ordered keys
//! - Records: Table metadata, dialogs, messages, space members

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod key;
pub mod keys;
pub mod records;
pub mod sortable;

pub use error::{Error, Result, ServerFailure};
pub use key::{validate_identifier, Key, KeyError, KeyRange};
pub use records::{
    ColumnDef, DeleteOutcome, DeletedKeys, DialogRecord, IndexDef, MessageRecord, Record,
    SpaceMember, TableMetadata,
};
pub use sortable::{IdGenerator, SortableId};
