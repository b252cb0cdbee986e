//! Handlers: engine calls wrapped into boundary payloads

use std::sync::Arc;

use dialogdb_core::{DeleteOutcome, Error, MessageRecord};
use dialogdb_engine::Database;
use dialogdb_remote::FanoutReader;
use tracing::warn;

use crate::types::{
    CreateTableRequest, CreateTableResponse, DeleteMessagesResponse, ErrorPayload, ReadResponse,
};

/// Boundary handlers over one database and one fan-out reader
#[derive(Debug, Clone)]
pub struct Handlers {
    db: Arc<Database>,
    fanout: FanoutReader,
}

impl Handlers {
    /// Handlers with an HTTP fan-out reader built from the database config
    pub fn new(db: Arc<Database>) -> Self {
        let fanout_cfg = &db.config().fanout;
        let fanout = FanoutReader::http(fanout_cfg.read_path.clone(), fanout_cfg.request_timeout());
        Self { db, fanout }
    }

    /// Handlers with an explicit fan-out reader
    pub fn with_fanout(db: Arc<Database>, fanout: FanoutReader) -> Self {
        Self { db, fanout }
    }

    /// The database behind these handlers
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Create a table; duplicates and invalid ids come back as `success: false`
    pub async fn create_table(&self, req: CreateTableRequest) -> CreateTableResponse {
        let result = self
            .db
            .create_table(&req.tenant_id, &req.table_id, &req.name, req.columns, req.indexes)
            .await;
        match result {
            Ok(meta) => CreateTableResponse {
                success: true,
                table_id: meta.table_id,
                error: None,
            },
            Err(err) => CreateTableResponse {
                success: false,
                table_id: req.table_id,
                error: Some(ErrorPayload::from(&err)),
            },
        }
    }

    /// Table ids of a tenant; any failure yields an empty list
    pub fn list_tables(&self, tenant_id: &str) -> Vec<String> {
        self.db.list_tables(tenant_id).unwrap_or_else(|err| {
            degraded("list_tables", tenant_id, &err);
            Vec::new()
        })
    }

    /// Latest messages of a dialog, newest first; any failure yields an empty list
    pub fn get_latest_messages(&self, dialog_id: &str, limit: usize) -> Vec<MessageRecord> {
        self.db
            .get_latest_messages(dialog_id, limit)
            .unwrap_or_else(|err| {
                degraded("get_latest_messages", dialog_id, &err);
                Vec::new()
            })
    }

    /// Delete every message of a dialog
    pub async fn delete_messages(&self, dialog_id: &str) -> DeleteMessagesResponse {
        match self.db.delete_messages(dialog_id).await {
            Ok(deleted) => DeleteMessagesResponse {
                success: true,
                deleted_keys: deleted.deleted_keys,
                error: None,
            },
            Err(err) => DeleteMessagesResponse {
                success: false,
                deleted_keys: Vec::new(),
                error: Some(ErrorPayload::from(&err)),
            },
        }
    }

    /// Delete one public entity; failures are reported in the outcome
    pub async fn delete_public_entity(&self, entity_id: &str) -> DeleteOutcome {
        self.db
            .delete_public_entity(entity_id)
            .await
            .unwrap_or_else(|err| DeleteOutcome {
                success: false,
                message: err.to_string(),
            })
    }

    /// Read `id` from whichever server answers first
    pub async fn request_servers(&self, servers: &[String], id: &str, token: &str) -> ReadResponse {
        match self.fanout.request_servers(servers, id, token).await {
            Ok(found) => ReadResponse {
                success: true,
                record: Some(found.into_tagged()),
                failures: Vec::new(),
                error: None,
            },
            Err(err) => {
                let payload = ErrorPayload::from(&err);
                let failures = match err {
                    Error::AllServersUnreachable { failures, .. } => {
                        failures.into_iter().map(Into::into).collect()
                    }
                    _ => Vec::new(),
                };
                ReadResponse {
                    success: false,
                    record: None,
                    failures,
                    error: Some(payload),
                }
            }
        }
    }
}

fn degraded(operation: &'static str, id: &str, err: &Error) {
    warn!(
        target: "dialogdb::api",
        operation,
        id,
        code = err.reason_code(),
        error = %err,
        "Returning empty result"
    );
}
