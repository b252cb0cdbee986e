use dialogdb::{Database, DatabaseConfig};
use serde_json::json;
use tempfile::TempDir;

#[tokio::test]
async fn test_records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let dialog_id = {
        let db = Database::open(dir.path()).unwrap();
        db.put_user("user_1", &json!({ "name": "Ada" })).unwrap();
        let dialog = db.create_dialog("user_1", "Notes").await.unwrap();
        db.append_message(&dialog.id, json!("remember this")).await
            .unwrap();
        db.add_space_member("space_1", "user_1", "owner").unwrap();
        dialog.id
    };

    let db = Database::open(dir.path()).unwrap();
    assert_eq!(db.get_user("user_1").unwrap().unwrap()["name"], "Ada");

    let dialogs = db.list_dialogs("user_1", 10).unwrap();
    assert_eq!(dialogs.len(), 1);
    assert_eq!(dialogs[0].id, dialog_id);

    let messages = db.get_latest_messages(&dialog_id, 10).unwrap();
    assert_eq!(messages[0].content, json!("remember this"));

    let members = db.list_space_members("space_1").unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].role, "owner");
}

#[test]
fn test_memory_backend_keeps_nothing_on_disk() {
    let dir = TempDir::new().unwrap();
    let db = Database::open_with_config(dir.path(), DatabaseConfig::memory()).unwrap();
    db.put_user("user_1", &json!({})).unwrap();
    drop(db);

    assert!(!dir.path().join("records.redb").exists());
    let reopened = Database::open(dir.path()).unwrap();
    assert!(reopened.get_user("user_1").unwrap().is_none());
}
