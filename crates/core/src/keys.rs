//! Key scheme: semantic identifiers to keys and listing ranges
//!
//! Every function here is pure. Identifiers are validated first; a malformed
//! identifier is rejected with `InvalidIdentifier` and never produces a key.
//!
//! | Record | Key | Listing range |
//! |--------|-----|---------------|
//! | user | `user-{userId}` | |
//! | dialog | `dialog-{dialogId}` | |
//! | dialog index | `userdialog-{userId}-{dialogId}` | `userdialog-{userId}-` |
//! | message | `dialog-{dialogId}-msg-{suffix}` | `dialog-{dialogId}-msg-` |
//! | table metadata | `meta-{tenantId}-{tableId}` | `meta-{tenantId}-` |
//! | table row | `table-{tenantId}-{tableId}-{rowId}` | `table-{tenantId}-{tableId}-` |
//! | space member | `space-{spaceId}-member-{userId}` | `space-{spaceId}-member-` |
//! | public entity | `public-{entityId}` | `public-` |

use crate::error::Result;
use crate::key::{validate_identifier, Key, KeyRange, DELIMITER};

/// Record type tag for users
pub const USER: &str = "user";
/// Record type tag for dialogs and their messages
pub const DIALOG: &str = "dialog";
/// Record type tag for the per-owner dialog index
pub const USER_DIALOG: &str = "userdialog";
/// Discriminator for dialog messages
pub const MESSAGE: &str = "msg";
/// Reserved prefix for table metadata
pub const META: &str = "meta";
/// Record type tag for table rows
pub const TABLE: &str = "table";
/// Record type tag for spaces
pub const SPACE: &str = "space";
/// Discriminator for space members
pub const MEMBER: &str = "member";
/// Reserved prefix for public entities
pub const PUBLIC: &str = "public";

fn prefix_range(segments: &[&str]) -> KeyRange {
    let mut prefix = String::new();
    for segment in segments {
        prefix.push_str(segment);
        prefix.push(DELIMITER);
    }
    KeyRange::for_prefix(prefix)
}

/// `user-{userId}`
pub fn user_key(user_id: &str) -> Result<Key> {
    let user_id = validate_identifier("user_id", user_id)?;
    Ok(Key::from_segments(&[USER, user_id]))
}

/// `dialog-{dialogId}`
pub fn dialog_key(dialog_id: &str) -> Result<Key> {
    let dialog_id = validate_identifier("dialog_id", dialog_id)?;
    Ok(Key::from_segments(&[DIALOG, dialog_id]))
}

/// `userdialog-{userId}-{dialogId}`
pub fn user_dialog_key(user_id: &str, dialog_id: &str) -> Result<Key> {
    let user_id = validate_identifier("user_id", user_id)?;
    let dialog_id = validate_identifier("dialog_id", dialog_id)?;
    Ok(Key::from_segments(&[USER_DIALOG, user_id, dialog_id]))
}

/// Every dialog index entry of one user
pub fn user_dialogs_range(user_id: &str) -> Result<KeyRange> {
    let user_id = validate_identifier("user_id", user_id)?;
    Ok(prefix_range(&[USER_DIALOG, user_id]))
}

/// `dialog-{dialogId}-msg-{suffix}`
///
/// `suffix` must sort in creation order; callers use a
/// [`SortableId`](crate::sortable::SortableId).
pub fn message_key(dialog_id: &str, suffix: &str) -> Result<Key> {
    let dialog_id = validate_identifier("dialog_id", dialog_id)?;
    let suffix = validate_identifier("message_id", suffix)?;
    Ok(Key::from_segments(&[DIALOG, dialog_id, MESSAGE, suffix]))
}

/// Every message of one dialog
pub fn messages_range(dialog_id: &str) -> Result<KeyRange> {
    let dialog_id = validate_identifier("dialog_id", dialog_id)?;
    Ok(prefix_range(&[DIALOG, dialog_id, MESSAGE]))
}

/// `meta-{tenantId}-{tableId}`
pub fn table_meta_key(tenant_id: &str, table_id: &str) -> Result<Key> {
    let tenant_id = validate_identifier("tenant_id", tenant_id)?;
    let table_id = validate_identifier("table_id", table_id)?;
    Ok(Key::from_segments(&[META, tenant_id, table_id]))
}

/// Every table metadata record of one tenant
pub fn table_meta_range(tenant_id: &str) -> Result<KeyRange> {
    let tenant_id = validate_identifier("tenant_id", tenant_id)?;
    Ok(prefix_range(&[META, tenant_id]))
}

/// Extract the table id from a metadata key produced by [`table_meta_key`]
pub fn table_id_from_meta_key<'k>(range: &KeyRange, key: &'k Key) -> Option<&'k str> {
    range
        .suffix_of(key)
        .filter(|rest| !rest.is_empty() && !rest.contains(DELIMITER))
}

/// `table-{tenantId}-{tableId}-{rowId}`
pub fn table_row_key(tenant_id: &str, table_id: &str, row_id: &str) -> Result<Key> {
    let tenant_id = validate_identifier("tenant_id", tenant_id)?;
    let table_id = validate_identifier("table_id", table_id)?;
    let row_id = validate_identifier("row_id", row_id)?;
    Ok(Key::from_segments(&[TABLE, tenant_id, table_id, row_id]))
}

/// Every row of one table
pub fn table_rows_range(tenant_id: &str, table_id: &str) -> Result<KeyRange> {
    let tenant_id = validate_identifier("tenant_id", tenant_id)?;
    let table_id = validate_identifier("table_id", table_id)?;
    Ok(prefix_range(&[TABLE, tenant_id, table_id]))
}

/// `space-{spaceId}-member-{userId}`
pub fn space_member_key(space_id: &str, user_id: &str) -> Result<Key> {
    let space_id = validate_identifier("space_id", space_id)?;
    let user_id = validate_identifier("user_id", user_id)?;
    Ok(Key::from_segments(&[SPACE, space_id, MEMBER, user_id]))
}

/// Every member of one space
pub fn space_members_range(space_id: &str) -> Result<KeyRange> {
    let space_id = validate_identifier("space_id", space_id)?;
    Ok(prefix_range(&[SPACE, space_id, MEMBER]))
}

/// `public-{entityId}`
///
/// Public entities share one flat namespace that no other record type can
/// reach into.
pub fn public_entity_key(entity_id: &str) -> Result<Key> {
    let entity_id = validate_identifier("entity_id", entity_id)?;
    Ok(Key::from_segments(&[PUBLIC, entity_id]))
}

/// Every public entity
pub fn public_entities_range() -> KeyRange {
    prefix_range(&[PUBLIC])
}
