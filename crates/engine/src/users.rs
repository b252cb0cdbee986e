//! User records at `user-{userId}`

use dialogdb_core::{keys, Record, Result};
use dialogdb_storage::RecordStoreExt;

use crate::database::Database;

impl Database {
    /// Store a user record (last write wins)
    pub fn put_user(&self, user_id: &str, record: &Record) -> Result<()> {
        let key = keys::user_key(user_id)?;
        self.store().put_record(&key, record)
    }

    /// Read a user record, `None` if absent
    pub fn get_user(&self, user_id: &str) -> Result<Option<Record>> {
        let key = keys::user_key(user_id)?;
        self.store().get_record(&key)
    }
}
