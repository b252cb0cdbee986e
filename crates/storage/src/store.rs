//! The ordered store contract
//!
//! ## Contract
//!
//! - `get` distinguishes an absent key (`None`) from a stored JSON `null`
//! - `commit` applies a [`WriteBatch`] atomically; partial application is
//!   never observable
//! - `iterate` yields entries in byte-lexicographic key order (or its
//!   reverse); the iterator is lazy and one-shot
//! - Engine failures surface as `StoreUnavailable` and are not retried
//!
//! The store is shared process-wide; implementations are `Send + Sync` and
//! serialize single-key writes themselves.

use serde::de::DeserializeOwned;
use serde::Serialize;

use dialogdb_core::{Error, Key, Result};

use crate::batch::WriteBatch;
use crate::range::{ChunkRequest, RangeIter, RangeSpec, RawEntry};

/// Iterator returned by [`OrderedStore::iterate`]
pub type StoreIter<'a> = RangeIter<'a>;

/// Disk- or memory-backed ordered key-value engine
pub trait OrderedStore: Send + Sync {
    /// Read the encoded record at `key`
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>>;

    /// Write an encoded record at `key` (last write wins)
    fn put(&self, key: &Key, value: &[u8]) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &Key) -> Result<()>;

    /// Start an empty batch
    fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Apply every operation of `batch` atomically
    fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Fetch at most `request.max` entries inside the request bounds
    ///
    /// This is the primitive [`RangeIter`] is built on; callers use
    /// [`iterate`](OrderedStore::iterate).
    fn scan_chunk(&self, request: &ChunkRequest<'_>) -> Result<Vec<RawEntry>>;

    /// Lazily iterate a range
    fn iterate(&self, range: RangeSpec) -> StoreIter<'_>;

    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;
}

/// Typed JSON access on top of [`OrderedStore`]
///
/// Blanket-implemented for every store, including `dyn OrderedStore`.
pub trait RecordStoreExt: OrderedStore {
    /// Decode the record at `key`, `None` if absent
    fn get_record<T: DeserializeOwned>(&self, key: &Key) -> Result<Option<T>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Decode the record at `key`, `NotFound` if absent
    fn fetch_record<T: DeserializeOwned>(&self, key: &Key) -> Result<T> {
        self.get_record(key)?
            .ok_or_else(|| Error::not_found(key.as_str()))
    }

    /// Encode and write a record
    fn put_record<T: Serialize + ?Sized>(&self, key: &Key, record: &T) -> Result<()> {
        let bytes = serde_json::to_vec(record)?;
        self.put(key, &bytes)
    }

    /// Check whether `key` exists
    fn exists(&self, key: &Key) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<S: OrderedStore + ?Sized> RecordStoreExt for S {}
