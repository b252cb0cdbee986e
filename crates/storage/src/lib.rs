//! Storage layer for DialogDB
//!
//! This crate implements the ordered store adapter:
//! - OrderedStore: get/put/delete/batch/iterate contract
//! - RangeSpec + RangeIter: lazy, chunked, one-shot range iteration
//! - WriteBatch: atomic multi-key writes
//! - RedbStore: disk-backed engine on `redb`
//! - MemoryStore: BTreeMap-based engine for ephemeral databases and tests
//!
//! # Ordering
//!
//! Both backends iterate in byte-lexicographic key order. Keys built by the
//! key scheme embed sortable suffixes, so byte order is creation order.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod batch;
pub mod disk;
pub mod memory;
pub mod range;
pub mod store;

pub use batch::{BatchOp, WriteBatch};
pub use disk::RedbStore;
pub use memory::MemoryStore;
pub use range::{ChunkRequest, Direction, Entry, RangeIter, RangeSpec, RawEntry, DEFAULT_SCAN_CHUNK};
pub use store::{OrderedStore, RecordStoreExt, StoreIter};
