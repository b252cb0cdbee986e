//! Atomic multi-key write batches
//!
//! A [`WriteBatch`] buffers puts and deletes; [`OrderedStore::commit`]
//! applies them all or none. Operations apply in insertion order, so a later
//! operation on the same key wins.
//!
//! [`OrderedStore::commit`]: crate::store::OrderedStore::commit

use serde::Serialize;

use dialogdb_core::{Key, Result};

/// One buffered operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Write `value` at `key`
    Put {
        /// Target key
        key: Key,
        /// Encoded record
        value: Vec<u8>,
    },
    /// Remove `key`
    Delete {
        /// Target key
        key: Key,
    },
}

impl BatchOp {
    /// Key touched by this operation
    pub fn key(&self) -> &Key {
        match self {
            BatchOp::Put { key, .. } | BatchOp::Delete { key } => key,
        }
    }
}

/// Buffered set of writes committed as a unit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a raw put
    pub fn put(&mut self, key: Key, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Put { key, value });
        self
    }

    /// Buffer a put of a JSON-encoded record
    pub fn put_record<T: Serialize + ?Sized>(&mut self, key: Key, record: &T) -> Result<&mut Self> {
        let value = serde_json::to_vec(record)?;
        Ok(self.put(key, value))
    }

    /// Buffer a delete
    pub fn delete(&mut self, key: Key) -> &mut Self {
        self.ops.push(BatchOp::Delete { key });
        self
    }

    /// Number of buffered operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check whether the batch is empty
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Buffered operations in order
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consume into the buffered operations
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_batch_preserves_order() {
        let a = Key::raw("a").unwrap();
        let b = Key::raw("b").unwrap();
        let mut batch = WriteBatch::new();
        batch.put(a.clone(), b"1".to_vec()).delete(b.clone()).delete(a.clone());

        assert_eq!(batch.len(), 3);
        let keys: Vec<&Key> = batch.ops().iter().map(BatchOp::key).collect();
        assert_eq!(keys, vec![&a, &b, &a]);
    }

    #[test]
    fn test_put_record_encodes_json() {
        let key = Key::raw("user-u1").unwrap();
        let mut batch = WriteBatch::new();
        batch.put_record(key, &json!({"name": "Ada"})).unwrap();

        match &batch.ops()[0] {
            BatchOp::Put { value, .. } => {
                let decoded: serde_json::Value = serde_json::from_slice(value).unwrap();
                assert_eq!(decoded["name"], "Ada");
            }
            other => panic!("unexpected op {:?}", other),
        }
    }
}
