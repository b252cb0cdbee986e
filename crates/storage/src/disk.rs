//! RedbStore: disk-backed ordered store on `redb`
//!
//! One table, `records: &[u8] -> &[u8]`, created when the file is opened so
//! that read transactions never race table creation.
//!
//! Every operation runs in its own redb transaction. Iteration reads one
//! chunk per read transaction (see [`RangeIter`]), so long scans never pin
//! an old snapshot of the file.

use std::path::{Path, PathBuf};

use redb::{Database, ReadableTable, TableDefinition};
use tracing::{debug, info};

use dialogdb_core::{Error, Key, Result};

use crate::batch::{BatchOp, WriteBatch};
use crate::range::{
    is_empty_interval, slice_bound, ChunkRequest, Direction, RangeIter, RangeSpec, RawEntry,
    DEFAULT_SCAN_CHUNK,
};
use crate::store::{OrderedStore, StoreIter};

const RECORDS: TableDefinition<&[u8], &[u8]> = TableDefinition::new("records");

/// Disk-backed ordered store
pub struct RedbStore {
    db: Database,
    path: PathBuf,
    chunk_size: usize,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("path", &self.path)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl RedbStore {
    /// Open or create the store file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_chunk_size(path, DEFAULT_SCAN_CHUNK)
    }

    /// Open or create the store file with a custom iteration chunk size
    pub fn open_with_chunk_size(path: impl AsRef<Path>, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::create(&path).map_err(|e| Error::store("open", e))?;

        let txn = db.begin_write().map_err(|e| Error::store("open", e))?;
        {
            txn.open_table(RECORDS).map_err(|e| Error::store("open", e))?;
        }
        txn.commit().map_err(|e| Error::store("open", e))?;

        info!(target: "dialogdb::store", path = ?path, "Opened redb store");
        Ok(Self {
            db,
            path,
            chunk_size: chunk_size.max(1),
        })
    }

    /// File backing this store
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OrderedStore for RedbStore {
    fn get(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        let txn = self.db.begin_read().map_err(|e| Error::store("get", e))?;
        let table = txn.open_table(RECORDS).map_err(|e| Error::store("get", e))?;
        let value = table
            .get(key.as_bytes())
            .map_err(|e| Error::store("get", e))?
            .map(|guard| guard.value().to_vec());
        Ok(value)
    }

    fn put(&self, key: &Key, value: &[u8]) -> Result<()> {
        let txn = self.db.begin_write().map_err(|e| Error::store("put", e))?;
        {
            let mut table = txn.open_table(RECORDS).map_err(|e| Error::store("put", e))?;
            table
                .insert(key.as_bytes(), value)
                .map_err(|e| Error::store("put", e))?;
        }
        txn.commit().map_err(|e| Error::store("put", e))
    }

    fn delete(&self, key: &Key) -> Result<()> {
        let txn = self.db.begin_write().map_err(|e| Error::store("delete", e))?;
        {
            let mut table = txn
                .open_table(RECORDS)
                .map_err(|e| Error::store("delete", e))?;
            table
                .remove(key.as_bytes())
                .map_err(|e| Error::store("delete", e))?;
        }
        txn.commit().map_err(|e| Error::store("delete", e))
    }

    fn commit(&self, batch: WriteBatch) -> Result<()> {
        let ops = batch.len();
        let txn = self.db.begin_write().map_err(|e| Error::store("commit", e))?;
        {
            let mut table = txn
                .open_table(RECORDS)
                .map_err(|e| Error::store("commit", e))?;
            for op in batch.ops() {
                match op {
                    BatchOp::Put { key, value } => {
                        table
                            .insert(key.as_bytes(), value.as_slice())
                            .map_err(|e| Error::store("commit", e))?;
                    }
                    BatchOp::Delete { key } => {
                        table
                            .remove(key.as_bytes())
                            .map_err(|e| Error::store("commit", e))?;
                    }
                }
            }
        }
        // Dropping an uncommitted write transaction aborts it, so an early
        // return above leaves the file untouched.
        txn.commit().map_err(|e| Error::store("commit", e))?;
        debug!(target: "dialogdb::store", backend = "redb", ops, "Batch committed");
        Ok(())
    }

    fn scan_chunk(&self, request: &ChunkRequest<'_>) -> Result<Vec<RawEntry>> {
        if is_empty_interval(request.lower, request.upper) {
            return Ok(Vec::new());
        }
        let txn = self.db.begin_read().map_err(|e| Error::store("iterate", e))?;
        let table = txn
            .open_table(RECORDS)
            .map_err(|e| Error::store("iterate", e))?;
        let range = table
            .range::<&[u8]>((slice_bound(request.lower), slice_bound(request.upper)))
            .map_err(|e| Error::store("iterate", e))?;

        let items: Box<dyn Iterator<Item = _> + '_> = match request.direction {
            Direction::Forward => Box::new(range),
            Direction::Reverse => Box::new(range.rev()),
        };

        let mut chunk = Vec::with_capacity(request.max.min(self.chunk_size));
        for item in items.take(request.max) {
            let (k, v) = item.map_err(|e| Error::store("iterate", e))?;
            let value = if request.keys_only {
                Vec::new()
            } else {
                v.value().to_vec()
            };
            chunk.push((k.value().to_vec(), value));
        }
        Ok(chunk)
    }

    fn iterate(&self, range: RangeSpec) -> StoreIter<'_> {
        RangeIter::new(self, range, self.chunk_size)
    }

    fn backend_name(&self) -> &'static str {
        "redb"
    }
}
