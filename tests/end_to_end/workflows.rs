use std::sync::Arc;

use dialogdb::{CreateTableRequest, Database, Direction, Handlers, ListScope, PageRequest};
use serde_json::json;

#[tokio::test]
async fn test_dialog_lifecycle_through_handlers() {
    let db = Database::ephemeral();
    let handlers = Handlers::new(Arc::clone(&db));

    let dialog = db.create_dialog("user_1", "Support").await.unwrap();
    for text in ["hello", "anyone there?", "thanks"] {
        db.append_message(&dialog.id, json!({ "role": "user", "text": text })).await
            .unwrap();
    }

    let latest = handlers.get_latest_messages(&dialog.id, 2);
    let texts: Vec<_> = latest.iter().map(|m| m.content["text"].clone()).collect();
    assert_eq!(texts, vec![json!("thanks"), json!("anyone there?")]);

    let deleted = handlers.delete_messages(&dialog.id).await;
    assert!(deleted.success);
    assert_eq!(deleted.deleted_keys.len(), 3);
    assert!(handlers.get_latest_messages(&dialog.id, 10).is_empty());

    // The dialog itself survives a message purge
    assert!(db.get_dialog(&dialog.id).unwrap().is_some());
}

#[tokio::test]
async fn test_tables_and_rows_through_handlers() {
    let db = Database::ephemeral();
    let handlers = Handlers::new(Arc::clone(&db));

    let first = handlers
        .create_table(CreateTableRequest::new("tenant_1", "orders", "Orders"))
        .await;
    assert!(first.success);
    let again = handlers
        .create_table(CreateTableRequest::new("tenant_1", "orders", "Orders"))
        .await;
    assert!(!again.success);

    handlers
        .create_table(CreateTableRequest::new("tenant_1", "invoices", "Invoices"))
        .await;
    assert_eq!(handlers.list_tables("tenant_1"), vec!["invoices", "orders"]);
    assert!(handlers.list_tables("tenant_2").is_empty());

    for n in 0..4 {
        db.insert_row("tenant_1", "orders", None, json!({ "n": n }))
            .await
            .unwrap();
    }
    let page = db
        .query()
        .page(
            PageRequest::new(ListScope::TableRows {
                tenant_id: "tenant_1".to_string(),
                table_id: "orders".to_string(),
            })
            .direction(Direction::Reverse)
            .limit(3),
        )
        .unwrap();
    let ns: Vec<_> = page.items.iter().map(|(_, r)| r["n"].clone()).collect();
    assert_eq!(ns, vec![json!(3), json!(2), json!(1)]);
    assert!(page.next_cursor.is_some());
}

#[tokio::test]
async fn test_public_entity_delete_outcomes() {
    let db = Database::ephemeral();
    let handlers = Handlers::new(Arc::clone(&db));

    db.put_public_entity("post_42", &json!({ "title": "hi" }))
        .unwrap();
    let removed = handlers.delete_public_entity("post_42").await;
    assert!(removed.success);

    let missing = handlers.delete_public_entity("post_42").await;
    assert!(!missing.success);
}
