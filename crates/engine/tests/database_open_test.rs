//! Integration tests for Database::open() and reopen
//!
//! These tests verify the complete open flow:
//! - Creating new databases (directory, config file, store file)
//! - Reopening existing databases with every record intact
//! - Config changes picked up on reopen

use dialogdb_engine::{Database, DatabaseConfig, CONFIG_FILE_NAME};
use dialogdb_core::ColumnDef;
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_database_lifecycle() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("lifecycle_test");

    // Phase 1: Create database and write data
    let (dialog_id, row_id) = {
        let db = Database::open(&db_path).expect("Failed to open database");
        db.put_user("u1", &json!({"name": "Ada"})).unwrap();
        db.create_table("t1", "orders", "Orders", vec![ColumnDef::new("total", "number")], vec![])
            .await
            .unwrap();
        let row_id = db
            .insert_row("t1", "orders", None, json!({"total": 12}))
            .await
            .unwrap();
        let dialog = db.create_dialog("u1", "Support").await.unwrap();
        db.append_message(&dialog.id, json!({"text": "hello"})).await.unwrap();
        (dialog.id, row_id)
    };

    // Phase 2: Reopen and verify
    let db = Database::open(&db_path).expect("Failed to reopen database");
    assert_eq!(db.get_user("u1").unwrap(), Some(json!({"name": "Ada"})));
    assert_eq!(db.list_tables("t1").unwrap(), vec!["orders"]);
    assert_eq!(
        db.get_row("t1", "orders", &row_id).unwrap(),
        Some(json!({"total": 12}))
    );
    let messages = db.get_latest_messages(&dialog_id, 10).unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, json!({"text": "hello"}));
}

#[test]
fn test_open_creates_directory_and_config() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("data");

    let db = Database::open(&db_path).unwrap();
    assert!(db_path.join(CONFIG_FILE_NAME).exists());
    assert_eq!(db.config(), &DatabaseConfig::default());
}

#[test]
fn test_edited_config_is_used_on_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        Database::open(temp_dir.path()).unwrap();
    }
    let path = temp_dir.path().join(CONFIG_FILE_NAME);
    let edited = std::fs::read_to_string(&path)
        .unwrap()
        .replace("default_page_size = 50", "default_page_size = 7");
    std::fs::write(&path, edited).unwrap();

    let db = Database::open(temp_dir.path()).unwrap();
    assert_eq!(db.config().default_page_size, 7);
}
