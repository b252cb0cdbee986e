//! Concurrency layer for DialogDB
//!
//! This crate holds the in-process coordination primitives:
//! - TenantLocks: per-tenant FIFO mutual exclusion for read-check-write
//!   sequences (existence check + create, metadata + index writes)
//! - DeleteQueue: per-owner set of ids whose delete is in flight, used by
//!   read paths to mask records that are about to disappear
//!
//! Neither primitive is process-wide; each database instance owns its own.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod delete_queue;
pub mod tenant_lock;

pub use delete_queue::{DeleteQueue, PendingDelete};
pub use tenant_lock::{TenantLocks, TenantPermit};
