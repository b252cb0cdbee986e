//! Table / schema registry
//!
//! Table metadata lives at `meta-{tenant}-{table}`; rows live at
//! `table-{tenant}-{table}-{row}`. Creation, drop and row inserts run under
//! the tenant lock so an existence check and the write that depends on it
//! are never interleaved with another writer of the same tenant.

use chrono::Utc;
use dialogdb_core::{
    keys, validate_identifier, ColumnDef, DeletedKeys, Error, IndexDef, Key, Record, Result,
    SortableId, TableMetadata,
};
use dialogdb_storage::{RangeSpec, RecordStoreExt};
use tracing::{debug, info};

use crate::database::Database;
use crate::query::{ListScope, Page, PageRequest};

impl Database {
    /// Register a table for `tenant_id`
    ///
    /// # Errors
    ///
    /// `AlreadyExists { kind: "table", id }` if the tenant already has a
    /// table with this id; the stored metadata is left unchanged.
    pub async fn create_table(
        &self,
        tenant_id: &str,
        table_id: &str,
        name: &str,
        columns: Vec<ColumnDef>,
        indexes: Vec<IndexDef>,
    ) -> Result<TableMetadata> {
        let key = keys::table_meta_key(tenant_id, table_id)?;
        self.locks()
            .with_lock(tenant_id, || async {
                if self.store().exists(&key)? {
                    return Err(Error::AlreadyExists {
                        kind: "table",
                        id: table_id.to_string(),
                    });
                }
                let meta = TableMetadata {
                    tenant_id: tenant_id.to_string(),
                    table_id: table_id.to_string(),
                    name: name.to_string(),
                    columns,
                    indexes,
                    created_at: Utc::now(),
                };
                self.store().put_record(&key, &meta)?;
                info!(target: "dialogdb::tables", tenant_id, table_id, "Table created");
                Ok(meta)
            })
            .await
    }

    /// Ids of every table of `tenant_id`, in key order
    ///
    /// Keys-only scan; tables being dropped are skipped.
    pub fn list_tables(&self, tenant_id: &str) -> Result<Vec<String>> {
        let range = keys::table_meta_range(tenant_id)?;
        let pending = self.delete_queue().snapshot(range.prefix());

        let mut tables = Vec::new();
        for entry in self.store().iterate(RangeSpec::prefix(&range).keys_only()) {
            let entry = entry?;
            let Some(table_id) = keys::table_id_from_meta_key(&range, &entry.key) else {
                continue;
            };
            if pending.as_ref().is_some_and(|ids| ids.contains(table_id)) {
                continue;
            }
            tables.push(table_id.to_string());
        }
        debug!(target: "dialogdb::tables", tenant_id, count = tables.len(), "Listed tables");
        Ok(tables)
    }

    /// Check whether `tenant_id` has a table `table_id`
    pub fn table_exists(&self, tenant_id: &str, table_id: &str) -> Result<bool> {
        Ok(self.get_table(tenant_id, table_id)?.is_some())
    }

    /// Metadata of one table, `None` if absent or being dropped
    pub fn get_table(&self, tenant_id: &str, table_id: &str) -> Result<Option<TableMetadata>> {
        let key = keys::table_meta_key(tenant_id, table_id)?;
        let tables = keys::table_meta_range(tenant_id)?;
        if self.delete_queue().is_pending(tables.prefix(), table_id) {
            return Ok(None);
        }
        self.store().get_record(&key)
    }

    /// Remove a table's metadata and every row in one atomic batch
    ///
    /// The table reads as absent from the moment the drop starts.
    ///
    /// # Errors
    ///
    /// `NotFound` if the table does not exist.
    pub async fn drop_table(&self, tenant_id: &str, table_id: &str) -> Result<DeletedKeys> {
        let meta_key = keys::table_meta_key(tenant_id, table_id)?;
        let tables = keys::table_meta_range(tenant_id)?;
        let scope = ListScope::TableRows {
            tenant_id: tenant_id.to_string(),
            table_id: table_id.to_string(),
        };
        self.locks()
            .with_lock(tenant_id, || async {
                if !self.store().exists(&meta_key)? {
                    return Err(Error::not_found(meta_key.as_str()));
                }
                let _pending = self.delete_queue().guard(tables.prefix(), [table_id]);

                let mut deleted_keys = self.query().collect_keys(&scope)?;
                let mut batch = self.store().batch();
                for key in &deleted_keys {
                    batch.delete(key.clone());
                }
                batch.delete(meta_key.clone());
                self.store().commit(batch)?;

                deleted_keys.push(meta_key.clone());
                info!(
                    target: "dialogdb::tables",
                    tenant_id,
                    table_id,
                    rows = deleted_keys.len() - 1,
                    "Table dropped"
                );
                Ok(DeletedKeys { deleted_keys })
            })
            .await
    }

    /// Insert or replace a row
    ///
    /// A sortable row id is generated when `row_id` is `None`. Returns the
    /// row id.
    ///
    /// # Errors
    ///
    /// `NotFound` if the table does not exist.
    pub async fn insert_row(
        &self,
        tenant_id: &str,
        table_id: &str,
        row_id: Option<&str>,
        record: Record,
    ) -> Result<String> {
        let meta_key = keys::table_meta_key(tenant_id, table_id)?;
        let row_id = match row_id {
            Some(id) => validate_identifier("row_id", id)?.to_string(),
            None => SortableId::generate().into_string(),
        };
        let row_key = keys::table_row_key(tenant_id, table_id, &row_id)?;

        self.locks()
            .with_lock(tenant_id, || async {
                if !self.store().exists(&meta_key)? {
                    return Err(Error::not_found(meta_key.as_str()));
                }
                self.store().put_record(&row_key, &record)?;
                debug!(target: "dialogdb::tables", tenant_id, table_id, row_id = %row_id, "Row written");
                Ok(())
            })
            .await?;
        Ok(row_id)
    }

    /// Read one row, `None` if absent or masked by a pending delete
    pub fn get_row(&self, tenant_id: &str, table_id: &str, row_id: &str) -> Result<Option<Record>> {
        let key = keys::table_row_key(tenant_id, table_id, row_id)?;
        let tables = keys::table_meta_range(tenant_id)?;
        let rows = keys::table_rows_range(tenant_id, table_id)?;
        let queue = self.delete_queue();
        if queue.is_pending(tables.prefix(), table_id) || queue.is_pending(rows.prefix(), row_id) {
            return Ok(None);
        }
        self.store().get_record(&key)
    }

    /// One page of a table's rows in row-id order
    pub fn list_rows(
        &self,
        tenant_id: &str,
        table_id: &str,
        cursor: Option<Key>,
        limit: Option<usize>,
    ) -> Result<Page> {
        let mut request = PageRequest::new(ListScope::TableRows {
            tenant_id: tenant_id.to_string(),
            table_id: table_id.to_string(),
        })
        .after(cursor);
        request.limit = limit;
        self.query().page(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn columns() -> Vec<ColumnDef> {
        vec![ColumnDef::new("id", "string"), ColumnDef::new("total", "number")]
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let db = Database::ephemeral();
        let meta = db
            .create_table("t1", "orders", "Orders", columns(), vec![])
            .await
            .unwrap();
        assert_eq!(meta.table_id, "orders");

        let stored = db.get_table("t1", "orders").unwrap().unwrap();
        assert_eq!(stored, meta);
        assert!(db.table_exists("t1", "orders").unwrap());
        assert!(!db.table_exists("t2", "orders").unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_create_keeps_first_metadata() {
        let db = Database::ephemeral();
        db.create_table("t1", "orders", "Orders", columns(), vec![])
            .await
            .unwrap();
        let err = db
            .create_table("t1", "orders", "Other", vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { kind: "table", ref id } if id == "orders"));
        assert_eq!(db.get_table("t1", "orders").unwrap().unwrap().name, "Orders");
    }

    #[tokio::test]
    async fn test_invalid_table_id_never_writes() {
        let db = Database::ephemeral();
        let err = db
            .create_table("t1", "bad-id", "Bad", vec![], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { field: "table_id", .. }));
        assert!(db.list_tables("t1").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rows_require_table() {
        let db = Database::ephemeral();
        let err = db
            .insert_row("t1", "orders", None, json!({"total": 1}))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_insert_generates_sortable_ids() {
        let db = Database::ephemeral();
        db.create_table("t1", "orders", "Orders", columns(), vec![])
            .await
            .unwrap();
        let first = db.insert_row("t1", "orders", None, json!({"n": 1})).await.unwrap();
        let second = db.insert_row("t1", "orders", None, json!({"n": 2})).await.unwrap();
        assert!(first < second);

        let page = db.list_rows("t1", "orders", None, None).unwrap();
        assert_eq!(page.into_records(), vec![json!({"n": 1}), json!({"n": 2})]);
        assert_eq!(db.get_row("t1", "orders", &first).unwrap(), Some(json!({"n": 1})));
    }

    #[tokio::test]
    async fn test_pending_table_is_hidden() {
        let db = Database::ephemeral();
        db.create_table("t1", "orders", "Orders", columns(), vec![])
            .await
            .unwrap();
        db.insert_row("t1", "orders", Some("r1"), json!({})).await.unwrap();

        let tables = keys::table_meta_range("t1").unwrap();
        let guard = db.delete_queue().guard(tables.prefix(), ["orders"]);
        assert!(db.get_table("t1", "orders").unwrap().is_none());
        assert!(db.get_row("t1", "orders", "r1").unwrap().is_none());
        assert!(db.list_tables("t1").unwrap().is_empty());
        drop(guard);

        assert_eq!(db.list_tables("t1").unwrap(), vec!["orders"]);
    }

    #[tokio::test]
    async fn test_dropping_table_leaves_same_named_rows_elsewhere() {
        let db = Database::ephemeral();
        for table in ["orders", "items"] {
            db.create_table("t1", table, table, vec![], vec![])
                .await
                .unwrap();
        }
        db.insert_row("t1", "items", Some("orders"), json!({"qty": 2}))
            .await
            .unwrap();

        let tables = keys::table_meta_range("t1").unwrap();
        let guard = db.delete_queue().guard(tables.prefix(), ["orders"]);
        assert_eq!(
            db.get_row("t1", "items", "orders").unwrap(),
            Some(json!({"qty": 2}))
        );
        assert_eq!(db.list_rows("t1", "items", None, None).unwrap().items.len(), 1);
        assert_eq!(db.list_tables("t1").unwrap(), vec!["items"]);
        drop(guard);
    }

    #[tokio::test]
    async fn test_pending_row_is_scoped_to_its_table() {
        let db = Database::ephemeral();
        for table in ["orders", "items"] {
            db.create_table("t1", table, table, vec![], vec![])
                .await
                .unwrap();
            db.insert_row("t1", table, Some("r1"), json!({ "table": table }))
                .await
                .unwrap();
        }

        let rows = keys::table_rows_range("t1", "orders").unwrap();
        let _guard = db.delete_queue().guard(rows.prefix(), ["r1"]);
        assert!(db.get_row("t1", "orders", "r1").unwrap().is_none());
        assert!(db.get_row("t1", "items", "r1").unwrap().is_some());
    }
}
