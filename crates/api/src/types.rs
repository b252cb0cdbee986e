//! Request and response payloads
//!
//! Every payload serializes with camelCase field names.

use dialogdb_core::{ColumnDef, Error, IndexDef, Key, Record, ServerFailure};
use serde::{Deserialize, Serialize};

/// Machine-readable error at the boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Stable reason code (`already_exists`, `invalid_identifier`, ...)
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl From<&Error> for ErrorPayload {
    fn from(err: &Error) -> Self {
        Self {
            code: err.reason_code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Arguments of `create_table`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableRequest {
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
}

impl CreateTableRequest {
    /// Request with no columns or indexes
    pub fn new(tenant_id: impl Into<String>, table_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            table_id: table_id.into(),
            name: name.into(),
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }
}

/// Result of `create_table`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTableResponse {
    /// Whether the table was created
    pub success: bool,
    /// Requested table id
    pub table_id: String,
    /// Why creation failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Result of `delete_messages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessagesResponse {
    /// Whether the delete ran
    pub success: bool,
    /// Keys removed, in key order
    pub deleted_keys: Vec<Key>,
    /// Why the delete failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// Result of a cross-server read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse {
    /// Whether some server answered
    pub success: bool,
    /// The record tagged with `"source"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    /// Per-server failures when every server failed
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailurePayload>,
    /// Why the read failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// One failed server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    /// Server address
    pub server: String,
    /// Failure reason
    pub reason: String,
}

impl From<ServerFailure> for FailurePayload {
    fn from(failure: ServerFailure) -> Self {
        Self {
            server: failure.server,
            reason: failure.reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_response_shape() {
        let ok = CreateTableResponse {
            success: true,
            table_id: "orders".to_string(),
            error: None,
        };
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            json!({"success": true, "tableId": "orders"})
        );

        let err = Error::AlreadyExists {
            kind: "table",
            id: "orders".to_string(),
        };
        let failed = CreateTableResponse {
            success: false,
            table_id: "orders".to_string(),
            error: Some(ErrorPayload::from(&err)),
        };
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["error"]["code"], "already_exists");
        assert_eq!(value["error"]["message"], "table already exists: orders");
    }

    #[test]
    fn test_request_defaults_columns() {
        let req: CreateTableRequest =
            serde_json::from_value(json!({"tenantId": "t1", "tableId": "a", "name": "A"})).unwrap();
        assert_eq!(req, CreateTableRequest::new("t1", "a", "A"));
    }
}
