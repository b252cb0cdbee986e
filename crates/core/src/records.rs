//! Record types persisted in the store
//!
//! Every record is a JSON document. Typed records serialize with camelCase
//! field names so they stay readable by non-Rust consumers of the same store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::key::Key;

/// Untyped record payload
pub type Record = serde_json::Value;

/// Column definition of a virtual table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Column type, free-form (`"string"`, `"number"`, ...)
    #[serde(rename = "type")]
    pub column_type: String,
}

impl ColumnDef {
    /// Create a column definition
    pub fn new(name: impl Into<String>, column_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
        }
    }
}

/// Index definition of a virtual table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Index name
    pub name: String,
    /// Indexed fields, in order
    pub fields: Vec<String>,
}

impl IndexDef {
    /// Create an index definition
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Table metadata stored under the reserved `meta` prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    /// Owning tenant
    pub tenant_id: String,
    /// Table id, unique within the tenant
    pub table_id: String,
    /// Display name
    pub name: String,
    /// Column definitions
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    /// Index definitions
    #[serde(default)]
    pub indexes: Vec<IndexDef>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Dialog record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRecord {
    /// Dialog id (sortable)
    pub id: String,
    /// Owning user
    pub owner_id: String,
    /// Display title
    pub title: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Message within a dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    /// Message id, also the key's sort suffix
    pub id: String,
    /// Parent dialog
    pub dialog_id: String,
    /// Message body as produced by the caller
    pub content: Record,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Membership of a user in a space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceMember {
    /// Space id
    pub space_id: String,
    /// Member user id
    pub user_id: String,
    /// Role within the space
    pub role: String,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
}

/// Keys removed by a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedKeys {
    /// Every key removed, in the order the delete reported them
    pub deleted_keys: Vec<Key>,
}

/// Structured outcome of a single-entity delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteOutcome {
    /// Whether the entity existed and was removed
    pub success: bool,
    /// Human-readable detail
    pub message: String,
}

impl DeleteOutcome {
    /// Successful delete
    pub fn deleted(key: &Key) -> Self {
        Self {
            success: true,
            message: format!("deleted {}", key),
        }
    }

    /// Nothing to delete
    pub fn not_found(key: &Key) -> Self {
        Self {
            success: false,
            message: format!("not found: {}", key),
        }
    }
}
