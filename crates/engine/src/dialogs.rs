//! Dialogs and their messages
//!
//! - `dialog-{dialogId}` holds the dialog record
//! - `userdialog-{ownerId}-{dialogId}` indexes it under its owner
//! - `dialog-{dialogId}-msg-{messageId}` holds each message
//!
//! Dialog and message ids are sortable, so every listing is a plain prefix
//! scan in creation order (or its reverse for "latest first").
//!
//! Appending to a dialog, deleting its messages and deleting the dialog all
//! hold the dialog id's lock, so a message can never be written after the
//! delete that should have removed it.

use chrono::Utc;
use dialogdb_core::{
    keys, DeletedKeys, DialogRecord, Error, Key, MessageRecord, Record, Result, SortableId,
};
use dialogdb_storage::{Direction, RecordStoreExt};
use tracing::{debug, info};

use crate::database::Database;
use crate::query::{ListScope, Page, PageRequest};

impl Database {
    /// Create a dialog owned by `owner_id`
    ///
    /// The dialog record and the owner's index entry are written in one
    /// batch under the owner's lock.
    pub async fn create_dialog(&self, owner_id: &str, title: &str) -> Result<DialogRecord> {
        let id = SortableId::generate().into_string();
        let dialog_key = keys::dialog_key(&id)?;
        let index_key = keys::user_dialog_key(owner_id, &id)?;
        let dialog = DialogRecord {
            id,
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };

        self.locks()
            .with_lock(owner_id, || async {
                let mut batch = self.store().batch();
                batch
                    .put_record(dialog_key, &dialog)?
                    .put_record(index_key, &dialog)?;
                self.store().commit(batch)
            })
            .await?;
        debug!(target: "dialogdb::dialogs", owner_id, dialog_id = %dialog.id, "Dialog created");
        Ok(dialog)
    }

    /// Read a dialog, `None` if absent or being deleted
    pub fn get_dialog(&self, dialog_id: &str) -> Result<Option<DialogRecord>> {
        let key = keys::dialog_key(dialog_id)?;
        let Some(dialog) = self.store().get_record::<DialogRecord>(&key)? else {
            return Ok(None);
        };
        let dialogs = keys::user_dialogs_range(&dialog.owner_id)?;
        if self.delete_queue().is_pending(dialogs.prefix(), &dialog.id) {
            return Ok(None);
        }
        Ok(Some(dialog))
    }

    /// Up to `limit` dialogs of `owner_id`, newest first
    pub fn list_dialogs(&self, owner_id: &str, limit: usize) -> Result<Vec<DialogRecord>> {
        let page = self.list_dialogs_page(owner_id, None, Some(limit))?;
        decode_all(page)
    }

    /// One page of `owner_id`'s dialogs, newest first
    pub fn list_dialogs_page(
        &self,
        owner_id: &str,
        cursor: Option<Key>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let mut request = PageRequest::new(ListScope::UserDialogs {
            user_id: owner_id.to_string(),
        })
        .after(cursor);
        request.limit = limit;
        self.query().page(request)
    }

    /// Delete a dialog, its index entry and every message in one batch
    ///
    /// # Errors
    ///
    /// - `NotFound` if the dialog does not exist
    /// - `Forbidden` if `owner_id` does not own it
    pub async fn delete_dialog(&self, owner_id: &str, dialog_id: &str) -> Result<DeletedKeys> {
        let dialog_key = keys::dialog_key(dialog_id)?;
        let index_key = keys::user_dialog_key(owner_id, dialog_id)?;
        let dialogs = keys::user_dialogs_range(owner_id)?;
        let scope = ListScope::DialogMessages {
            dialog_id: dialog_id.to_string(),
        };
        let messages_range = scope.range()?;

        self.locks()
            .with_lock(dialog_id, || async {
                let dialog: DialogRecord = self.store().fetch_record(&dialog_key)?;
                if dialog.owner_id != owner_id {
                    return Err(Error::Forbidden(format!(
                        "dialog {} is not owned by {}",
                        dialog_id, owner_id
                    )));
                }
                let _dialog_pending = self.delete_queue().guard(dialogs.prefix(), [dialog_id]);

                let messages = self.query().collect_keys(&scope)?;
                let _messages_pending = self.delete_queue().guard(
                    messages_range.prefix(),
                    messages.iter().map(|k| k.last_segment().to_string()),
                );

                let mut batch = self.store().batch();
                for key in &messages {
                    batch.delete(key.clone());
                }
                batch.delete(dialog_key.clone()).delete(index_key.clone());
                self.store().commit(batch)?;

                info!(
                    target: "dialogdb::dialogs",
                    owner_id,
                    dialog_id,
                    messages = messages.len(),
                    "Dialog deleted"
                );
                let mut deleted_keys = messages;
                deleted_keys.push(dialog_key.clone());
                deleted_keys.push(index_key.clone());
                Ok(DeletedKeys { deleted_keys })
            })
            .await
    }

    /// Append a message to a dialog
    ///
    /// The message id is sortable, so the new message is the latest one.
    ///
    /// # Errors
    ///
    /// `NotFound` if the dialog does not exist.
    pub async fn append_message(&self, dialog_id: &str, content: Record) -> Result<MessageRecord> {
        let dialog_key = keys::dialog_key(dialog_id)?;

        self.locks()
            .with_lock(dialog_id, || async {
                if !self.store().exists(&dialog_key)? {
                    return Err(Error::not_found(dialog_key.as_str()));
                }
                let id = SortableId::generate().into_string();
                let key = keys::message_key(dialog_id, &id)?;
                let message = MessageRecord {
                    id,
                    dialog_id: dialog_id.to_string(),
                    content,
                    created_at: Utc::now(),
                };
                self.store().put_record(&key, &message)?;
                Ok(message)
            })
            .await
    }

    /// The `limit` most recent messages of a dialog, newest first
    ///
    /// A dialog with no messages (or no dialog at all) yields an empty list.
    pub fn get_latest_messages(&self, dialog_id: &str, limit: usize) -> Result<Vec<MessageRecord>> {
        let page = self.messages_page(dialog_id, None, Direction::Reverse, Some(limit))?;
        decode_all(page)
    }

    /// One page of a dialog's messages in the given direction
    pub fn messages_page(
        &self,
        dialog_id: &str,
        cursor: Option<Key>,
        direction: Direction,
        limit: Option<usize>,
    ) -> Result<Page> {
        let mut request = PageRequest::new(ListScope::DialogMessages {
            dialog_id: dialog_id.to_string(),
        })
        .after(cursor)
        .direction(direction);
        request.limit = limit;
        self.query().page(request)
    }

    /// Delete every message of a dialog in one batch
    ///
    /// Message ids are masked from reads while the batch runs. The dialog
    /// record itself is kept. Returns the removed keys in key order.
    pub async fn delete_messages(&self, dialog_id: &str) -> Result<DeletedKeys> {
        let scope = ListScope::DialogMessages {
            dialog_id: dialog_id.to_string(),
        };
        let messages_range = scope.range()?;

        self.locks()
            .with_lock(dialog_id, || async {
                let deleted_keys = self.query().collect_keys(&scope)?;
                if deleted_keys.is_empty() {
                    return Ok(DeletedKeys::default());
                }
                let _pending = self.delete_queue().guard(
                    messages_range.prefix(),
                    deleted_keys.iter().map(|k| k.last_segment().to_string()),
                );

                let mut batch = self.store().batch();
                for key in &deleted_keys {
                    batch.delete(key.clone());
                }
                self.store().commit(batch)?;
                info!(
                    target: "dialogdb::dialogs",
                    dialog_id,
                    count = deleted_keys.len(),
                    "Messages deleted"
                );
                Ok(DeletedKeys { deleted_keys })
            })
            .await
    }
}

fn decode_all<T: serde::de::DeserializeOwned>(page: Page) -> Result<Vec<T>> {
    page.into_records()
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(Error::from))
        .collect()
}
