//! MemoryStore: in-memory ordered store
//!
//! - `BTreeMap<Vec<u8>, Vec<u8>>` for ordered key storage
//! - `parking_lot::RwLock` for thread-safe access
//!
//! Used by ephemeral databases and tests. Batches apply under one write
//! lock, so readers never observe half a batch.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use tracing::debug;

use dialogdb_core::{Key, Result};

use crate::batch::{BatchOp, WriteBatch};
use crate::range::{
    is_empty_interval, slice_bound, ChunkRequest, Direction, RangeIter, RangeSpec, RawEntry,
    DEFAULT_SCAN_CHUNK,
};
use crate::store::{OrderedStore, StoreIter};

/// In-memory ordered store
#[derive(Debug)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    chunk_size: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_SCAN_CHUNK)
    }

    /// Create an empty store with a custom iteration chunk size
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Check whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}

impl OrderedStore for MemoryStore {
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key.as_bytes()).cloned())
    }

    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        self.data.write().insert(key.as_bytes().to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &Key) -> Result<()> {
        self.data.write().remove(key.as_bytes());
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch.len();
        let mut data = self.data.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    data.insert(key.into_string().into_bytes(), value);
                }
                BatchOp::Delete { key } => {
                    data.remove(key.as_bytes());
                }
            }
        }
        debug!(target: "dialogdb::store", backend = "memory", ops, "Batch committed");
        Ok(())
    }

    fn scan_chunk(&self, request: &ChunkRequest<'_>) -> Result<Vec<RawEntry>> {
        if is_empty_interval(request.lower, request.upper) {
            return Ok(Vec::new());
        }
        let data = self.data.read();
        let range = data.range::<[u8], _>((slice_bound(request.lower), slice_bound(request.upper)));
        let take = |(k, v): (&Vec<u8>, &Vec<u8>)| {
            let value = if request.keys_only { Vec::new() } else { v.clone() };
            (k.clone(), value)
        };
        let chunk = match request.direction {
            Direction::Forward => range.take(request.max).map(take).collect(),
            Direction::Reverse => range.rev().take(request.max).map(take).collect(),
        };
        Ok(chunk)
    }

    fn iterate(&self, range: RangeSpec) -> StoreIter<'_> {
        RangeIter::new(self, range, self.chunk_size)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
