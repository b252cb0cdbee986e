//! Space membership at `space-{spaceId}-member-{userId}`

use chrono::Utc;
use dialogdb_core::{keys, Error, Key, Result, SpaceMember};
use dialogdb_storage::RecordStoreExt;
use tracing::debug;

use crate::database::Database;
use crate::query::{ListScope, Page, PageRequest};

impl Database {
    /// Add (or re-role) a member of a space
    pub fn add_space_member(&self, space_id: &str, user_id: &str, role: &str) -> Result<SpaceMember> {
        let key = keys::space_member_key(space_id, user_id)?;
        let member = SpaceMember {
            space_id: space_id.to_string(),
            user_id: user_id.to_string(),
            role: role.to_string(),
            joined_at: Utc::now(),
        };
        self.store().put_record(&key, &member)?;
        debug!(target: "dialogdb::db", space_id, user_id, role, "Space member added");
        Ok(member)
    }

    /// Remove a member; returns `false` if they were not a member
    pub async fn remove_space_member(&self, space_id: &str, user_id: &str) -> Result<bool> {
        let key = keys::space_member_key(space_id, user_id)?;
        let members = keys::space_members_range(space_id)?;
        self.locks()
            .with_lock(space_id, || async {
                if !self.store().exists(&key)? {
                    return Ok(false);
                }
                let _pending = self.delete_queue().guard(members.prefix(), [user_id]);
                self.store().delete(&key)?;
                Ok(true)
            })
            .await
    }

    /// One page of a space's members in user-id order
    pub fn space_members_page(
        &self,
        space_id: &str,
        cursor: Option<Key>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let mut request = PageRequest::new(ListScope::SpaceMembers {
            space_id: space_id.to_string(),
        })
        .after(cursor);
        request.limit = limit;
        self.query().page(request)
    }

    /// Every member of a space, walking all pages
    pub fn list_space_members(&self, space_id: &str) -> Result<Vec<SpaceMember>> {
        let mut members = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.space_members_page(space_id, cursor, None)?;
            cursor = page.next_cursor.clone();
            for record in page.into_records() {
                members.push(serde_json::from_value(record).map_err(Error::from)?);
            }
            if cursor.is_none() {
                return Ok(members);
            }
        }
    }
}
