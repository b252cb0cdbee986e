//! Public entities at `public-{entityId}`
//!
//! Entity ids go through the key scheme like every other identifier, so an
//! entity operation can only ever touch keys under `public-`. Reads are
//! masked while a delete of the same entity is in flight.

use dialogdb_core::{keys, DeleteOutcome, Key, Record, Result};
use dialogdb_storage::RecordStoreExt;
use tracing::debug;

use crate::database::Database;

impl Database {
    /// Store a record for `entity_id` (last write wins)
    pub fn put_public_entity(&self, entity_id: &str, record: &Record) -> Result<Key> {
        let key = keys::public_entity_key(entity_id)?;
        self.store().put_record(&key, record)?;
        Ok(key)
    }

    /// Read an entity, `None` if absent or pending deletion
    pub fn get_public_entity(&self, entity_id: &str) -> Result<Option<Record>> {
        let key = keys::public_entity_key(entity_id)?;
        let entities = keys::public_entities_range();
        if self.delete_queue().is_pending(entities.prefix(), entity_id) {
            return Ok(None);
        }
        self.store().get_record(&key)
    }

    /// Delete an entity
    ///
    /// Absence is reported as `success: false`, not as an error.
    pub async fn delete_public_entity(&self, entity_id: &str) -> Result<DeleteOutcome> {
        let key = keys::public_entity_key(entity_id)?;
        let entities = keys::public_entities_range();
        self.locks()
            .with_lock(key.as_str(), || async {
                let _pending = self.delete_queue().guard(entities.prefix(), [entity_id]);
                if !self.store().exists(&key)? {
                    return Ok(DeleteOutcome::not_found(&key));
                }
                self.store().delete(&key)?;
                debug!(target: "dialogdb::db", entity_id, "Public entity deleted");
                Ok(DeleteOutcome::deleted(&key))
            })
            .await
    }
}
