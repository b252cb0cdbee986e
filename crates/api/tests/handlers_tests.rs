//! Boundary handler tests
//!
//! Handlers never return `Err`: create/delete failures become structured
//! payloads and list failures become empty results.

use std::sync::Arc;

use async_trait::async_trait;
use dialogdb_api::{CreateTableRequest, Handlers};
use dialogdb_core::{ColumnDef, Record};
use dialogdb_engine::Database;
use dialogdb_remote::{FanoutReader, FetchError, RecordSource};
use serde_json::json;

struct StaticSource;

#[async_trait]
impl RecordSource for StaticSource {
    async fn fetch(&self, server: &str, id: &str, _token: &str) -> Result<Record, FetchError> {
        match server {
            "good" => Ok(json!({ "id": id })),
            _ => Err(FetchError::Status(502)),
        }
    }
}

fn handlers() -> Handlers {
    Handlers::with_fanout(Database::ephemeral(), FanoutReader::new(Arc::new(StaticSource)))
}

#[tokio::test]
async fn test_create_table_reports_duplicates() {
    let h = handlers();
    let mut req = CreateTableRequest::new("t1", "orders", "Orders");
    req.columns.push(ColumnDef::new("total", "number"));

    let first = h.create_table(req.clone()).await;
    assert!(first.success);
    assert_eq!(first.table_id, "orders");
    assert!(first.error.is_none());

    let second = h.create_table(req).await;
    assert!(!second.success);
    assert_eq!(second.table_id, "orders");
    let error = second.error.unwrap();
    assert_eq!(error.code, "already_exists");
    assert!(error.message.contains("orders"));

    assert_eq!(h.list_tables("t1"), vec!["orders"]);
}

#[tokio::test]
async fn test_create_table_reports_invalid_identifier() {
    let h = handlers();
    let resp = h.create_table(CreateTableRequest::new("t1", "no-dashes", "X")).await;
    assert!(!resp.success);
    assert_eq!(resp.error.unwrap().code, "invalid_identifier");
}

#[test]
fn test_list_failures_degrade_to_empty() {
    let h = handlers();
    assert!(h.list_tables("bad tenant").is_empty());
    assert!(h.get_latest_messages("", 5).is_empty());
}

#[tokio::test]
async fn test_delete_messages_payload() {
    let h = handlers();
    let db = h.database().clone();
    let dialog = db.create_dialog("u1", "chat").await.unwrap();
    db.append_message(&dialog.id, json!("one")).await.unwrap();
    db.append_message(&dialog.id, json!("two")).await.unwrap();

    let resp = h.delete_messages(&dialog.id).await;
    assert!(resp.success);
    assert_eq!(resp.deleted_keys.len(), 2);
    assert!(h.get_latest_messages(&dialog.id, 5).is_empty());

    let bad = h.delete_messages("bad id").await;
    assert!(!bad.success);
    assert_eq!(bad.error.unwrap().code, "invalid_identifier");
}

#[tokio::test]
async fn test_delete_public_entity_outcomes() {
    let h = handlers();
    h.database()
        .put_public_entity("card_1", &json!({"title": "Card"}))
        .unwrap();

    assert!(h.delete_public_entity("card_1").await.success);
    let again = h.delete_public_entity("card_1").await;
    assert!(!again.success);
    assert!(!h.delete_public_entity("").await.success);

    // Ids that look like other records' keys are rejected, not deleted
    let foreign = h.delete_public_entity("meta-t1-orders").await;
    assert!(!foreign.success);
}

#[tokio::test]
async fn test_request_servers_payloads() {
    let h = handlers();
    let servers = vec!["bad".to_string(), "good".to_string()];

    let found = h.request_servers(&servers, "dialog-d1", "t").await;
    assert!(found.success);
    assert_eq!(found.record, Some(json!({"id": "dialog-d1", "source": ["good"]})));

    let missing = h.request_servers(&["bad".to_string()], "k", "t").await;
    assert!(!missing.success);
    assert_eq!(missing.failures.len(), 1);
    assert_eq!(missing.failures[0].server, "bad");
    assert_eq!(missing.error.unwrap().code, "all_servers_unreachable");
}

#[test]
fn test_handlers_use_configured_fanout() {
    let h = Handlers::new(Database::ephemeral());
    assert_eq!(h.database().config().fanout.read_path, "/api/v1/db/read");
}
