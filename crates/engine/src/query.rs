//! Range query / pagination engine
//!
//! Every listing in the database is a prefix range over the key scheme. A
//! page is read lazily from the store, filtered through the delete queue, and
//! bounded by a limit. One entry past the limit is read to decide whether a
//! `next_cursor` exists.
//!
//! ## Cursors
//!
//! A cursor is the last key of the previous page. It is applied as an
//! exclusive bound on the side the scan resumes from: the lower bound for
//! forward scans, the upper bound for reverse scans. A cursor that lies
//! outside the scope's range is rejected, never clamped.
//!
//! ## Masking
//!
//! Pending deletes are queued under the prefix of the range the id lives
//! in (`dialog-{id}-msg-` for message ids, `meta-{tenant}-` for table ids,
//! and so on), so ids from different ranges never mask each other. That
//! prefix's pending ids are snapshotted once per page; entries whose id is
//! pending are skipped. A scope whose container itself is pending (a table
//! being dropped) reads as empty.

use dialogdb_concurrency::DeleteQueue;
use dialogdb_core::{keys, Error, Key, KeyRange, Record, Result};
use dialogdb_storage::{Direction, OrderedStore, RangeSpec};
use tracing::debug;

/// What to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Messages of one dialog (`dialog-{id}-msg-`)
    DialogMessages {
        /// Dialog whose messages are listed
        dialog_id: String,
    },
    /// Dialog index entries of one user (`userdialog-{id}-`)
    UserDialogs {
        /// Owner of the dialogs
        user_id: String,
    },
    /// Rows of one table (`table-{tenant}-{table}-`)
    TableRows {
        /// Owning tenant
        tenant_id: String,
        /// Table whose rows are listed
        table_id: String,
    },
    /// Table metadata keys of one tenant (`meta-{tenant}-`), keys only
    TableIds {
        /// Owning tenant
        tenant_id: String,
    },
    /// Members of one space (`space-{id}-member-`)
    SpaceMembers {
        /// Space whose members are listed
        space_id: String,
    },
}

impl ListScope {
    /// Key range covered by this scope
    pub fn range(&self) -> Result<KeyRange> {
        match self {
            ListScope::DialogMessages { dialog_id } => keys::messages_range(dialog_id),
            ListScope::UserDialogs { user_id } => keys::user_dialogs_range(user_id),
            ListScope::TableRows {
                tenant_id,
                table_id,
            } => keys::table_rows_range(tenant_id, table_id),
            ListScope::TableIds { tenant_id } => keys::table_meta_range(tenant_id),
            ListScope::SpaceMembers { space_id } => keys::space_members_range(space_id),
        }
    }

    /// Range and id that, when pending, hide the whole scope
    fn container(&self) -> Result<Option<(KeyRange, &str)>> {
        match self {
            ListScope::TableRows {
                tenant_id,
                table_id,
            } => Ok(Some((keys::table_meta_range(tenant_id)?, table_id))),
            _ => Ok(None),
        }
    }

    /// Direction used when the request does not name one
    ///
    /// Message history and dialog lists read newest first.
    pub fn default_direction(&self) -> Direction {
        match self {
            ListScope::DialogMessages { .. } | ListScope::UserDialogs { .. } => Direction::Reverse,
            _ => Direction::Forward,
        }
    }

    fn keys_only(&self) -> bool {
        matches!(self, ListScope::TableIds { .. })
    }
}

/// One page request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// What to list
    pub scope: ListScope,
    /// Last key of the previous page (exclusive)
    pub cursor: Option<Key>,
    /// Scan direction; `None` uses the scope default
    pub direction: Option<Direction>,
    /// Page size; `None` uses the configured default, clamped to the maximum
    pub limit: Option<usize>,
}

impl PageRequest {
    /// First page of `scope` with default direction and size
    pub fn new(scope: ListScope) -> Self {
        Self {
            scope,
            cursor: None,
            direction: None,
            limit: None,
        }
    }

    /// Resume after `cursor`
    pub fn after(mut self, cursor: Option<Key>) -> Self {
        self.cursor = cursor;
        self
    }

    /// Override the scan direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    /// Override the page size
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One page of results
///
/// Keys-only scopes (`TableIds`) carry `Record::Null` values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Entries in scan order
    pub items: Vec<(Key, Record)>,
    /// Cursor for the next page, present only if more entries exist
    pub next_cursor: Option<Key>,
}

impl Page {
    /// Keys of this page, in order
    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.items.iter().map(|(key, _)| key)
    }

    /// Records of this page, in order
    pub fn into_records(self) -> Vec<Record> {
        self.items.into_iter().map(|(_, record)| record).collect()
    }

    /// Check whether the page holds no entries
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read-only pagination over an ordered store
pub struct QueryEngine<'a> {
    store: &'a dyn OrderedStore,
    deletes: &'a DeleteQueue,
    default_limit: usize,
    max_limit: usize,
}

impl<'a> QueryEngine<'a> {
    /// Create an engine with the given page-size defaults
    pub fn new(
        store: &'a dyn OrderedStore,
        deletes: &'a DeleteQueue,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            store,
            deletes,
            default_limit,
            max_limit,
        }
    }

    /// Read one page
    ///
    /// # Errors
    ///
    /// - `InvalidIdentifier` if an id in the scope cannot form a key
    /// - `InvalidInput` if the cursor lies outside the scope's range
    /// - `StoreUnavailable` / `Serialization` from the store
    pub fn page(&self, request: PageRequest) -> Result<Page> {
        let range = request.scope.range()?;
        let direction = request
            .direction
            .unwrap_or_else(|| request.scope.default_direction());
        let limit = request.limit.unwrap_or(self.default_limit).min(self.max_limit);

        let mut spec = RangeSpec::prefix(&range).direction(direction);
        if let Some(cursor) = &request.cursor {
            if !range.contains(cursor) {
                return Err(Error::invalid_input(format!(
                    "cursor {} is outside {}",
                    cursor,
                    range.prefix()
                )));
            }
            spec = match direction {
                Direction::Forward => spec.gt(cursor),
                Direction::Reverse => spec.lt(cursor),
            };
        }
        let keys_only = request.scope.keys_only();
        if keys_only {
            spec = spec.keys_only();
        }

        if limit == 0 {
            return Ok(Page::default());
        }

        if let Some((parent, id)) = request.scope.container()? {
            if self.deletes.is_pending(parent.prefix(), id) {
                debug!(target: "dialogdb::db", scope = ?request.scope, "Scope pending deletion");
                return Ok(Page::default());
            }
        }
        let pending = self.deletes.snapshot(range.prefix());

        let mut items = Vec::with_capacity(limit.min(64));
        let mut has_more = false;
        for entry in self.store.iterate(spec) {
            let entry = entry?;
            let id = match entry_id(&range, &entry.key) {
                Some(id) => id,
                None => continue,
            };
            if pending.as_ref().is_some_and(|ids| ids.contains(id)) {
                continue;
            }
            if items.len() == limit {
                has_more = true;
                break;
            }
            let record = if keys_only {
                Record::Null
            } else {
                entry.decode()?
            };
            items.push((entry.key, record));
        }

        let next_cursor = if has_more {
            items.last().map(|(key, _)| key.clone())
        } else {
            None
        };
        Ok(Page { items, next_cursor })
    }

    /// Every key of `scope`, unmasked, in forward order
    ///
    /// Used by bulk deletes; reads keys only.
    pub fn collect_keys(&self, scope: &ListScope) -> Result<Vec<Key>> {
        let range = scope.range()?;
        let spec = RangeSpec::prefix(&range).keys_only();
        self.store
            .iterate(spec)
            .map(|entry| entry.map(|e| e.key))
            .collect()
    }
}

/// The id an entry is masked by: the key's suffix past the scope prefix
///
/// Keys with a nested suffix do not belong to the scope and are skipped.
fn entry_id<'k>(range: &KeyRange, key: &'k Key) -> Option<&'k str> {
    range
        .suffix_of(key)
        .filter(|rest| !rest.is_empty() && !rest.contains(dialogdb_core::key::DELIMITER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dialogdb_storage::{MemoryStore, RecordStoreExt};
    use serde_json::json;

    fn engine<'a>(store: &'a MemoryStore, deletes: &'a DeleteQueue) -> QueryEngine<'a> {
        QueryEngine::new(store, deletes, 2, 3)
    }

    fn seed_members(store: &MemoryStore, ids: &[&str]) {
        for id in ids {
            let key = keys::space_member_key("s1", id).unwrap();
            store.put_record(&key, &json!({ "userId": id })).unwrap();
        }
    }

    fn members_owner(space_id: &str) -> String {
        keys::space_members_range(space_id).unwrap().prefix().to_string()
    }

    fn members(space_id: &str) -> ListScope {
        ListScope::SpaceMembers {
            space_id: space_id.to_string(),
        }
    }

    #[test]
    fn test_pages_walk_the_range_once() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a", "b", "c", "d", "e"]);

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = engine(&store, &deletes)
                .page(PageRequest::new(members("s1")).after(cursor))
                .unwrap();
            seen.extend(page.keys().map(|k| k.last_segment().to_string()));
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_exact_fit_has_no_next_cursor() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a", "b"]);

        let page = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")))
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_limit_is_clamped() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a", "b", "c", "d", "e"]);

        let page = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")).limit(100))
            .unwrap();
        assert_eq!(page.items.len(), 3);
        assert!(page.next_cursor.is_some());
    }

    #[test]
    fn test_reverse_cursor_resumes_below() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a", "b", "c", "d"]);

        let first = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")).direction(Direction::Reverse))
            .unwrap();
        let names: Vec<_> = first.keys().map(|k| k.last_segment()).collect();
        assert_eq!(names, vec!["d", "c"]);

        let second = engine(&store, &deletes)
            .page(
                PageRequest::new(members("s1"))
                    .direction(Direction::Reverse)
                    .after(first.next_cursor.clone()),
            )
            .unwrap();
        let names: Vec<_> = second.keys().map(|k| k.last_segment()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert!(second.next_cursor.is_none());
    }

    #[test]
    fn test_foreign_cursor_is_rejected() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        let cursor = keys::space_member_key("s2", "a").unwrap();

        let err = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")).after(Some(cursor)))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_pending_ids_are_skipped() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a", "b", "c"]);
        deletes.mark_pending(members_owner("s1").as_str(), "a");

        let page = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")))
            .unwrap();
        let names: Vec<_> = page.keys().map(|k| k.last_segment()).collect();
        assert_eq!(names, vec!["b", "c"]);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn test_pending_container_hides_scope() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        let row = keys::table_row_key("t1", "orders", "r1").unwrap();
        store.put_record(&row, &json!({"total": 3})).unwrap();
        let tables = keys::table_meta_range("t1").unwrap();
        deletes.mark_pending(tables.prefix(), "orders");

        let scope = ListScope::TableRows {
            tenant_id: "t1".to_string(),
            table_id: "orders".to_string(),
        };
        let page = engine(&store, &deletes).page(PageRequest::new(scope)).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn test_pending_table_does_not_hide_same_named_row() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        let row = keys::table_row_key("t1", "items", "orders").unwrap();
        store.put_record(&row, &json!({"qty": 1})).unwrap();
        let tables = keys::table_meta_range("t1").unwrap();
        deletes.mark_pending(tables.prefix(), "orders");

        let scope = ListScope::TableRows {
            tenant_id: "t1".to_string(),
            table_id: "items".to_string(),
        };
        let page = engine(&store, &deletes).page(PageRequest::new(scope)).unwrap();
        assert_eq!(page.keys().collect::<Vec<_>>(), vec![&row]);
    }

    #[test]
    fn test_table_ids_are_keys_only() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        for table in ["orders", "users"] {
            let key = keys::table_meta_key("t1", table).unwrap();
            store.put_record(&key, &json!({"name": table})).unwrap();
        }

        let scope = ListScope::TableIds {
            tenant_id: "t1".to_string(),
        };
        let page = engine(&store, &deletes).page(PageRequest::new(scope)).unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(page.items.iter().all(|(_, record)| record.is_null()));
    }

    #[test]
    fn test_invalid_owner_is_rejected() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        let err = engine(&store, &deletes)
            .page(PageRequest::new(members("bad-id")))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_zero_limit_is_empty() {
        let store = MemoryStore::new();
        let deletes = DeleteQueue::new();
        seed_members(&store, &["a"]);
        let page = engine(&store, &deletes)
            .page(PageRequest::new(members("s1")).limit(0))
            .unwrap();
        assert!(page.is_empty());
        assert!(page.next_cursor.is_none());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn walk(
            store: &MemoryStore,
            deletes: &DeleteQueue,
            direction: Direction,
            limit: usize,
        ) -> Vec<String> {
            let engine = QueryEngine::new(store, deletes, limit, limit);
            let mut seen = Vec::new();
            let mut cursor = None;
            loop {
                let page = engine
                    .page(
                        PageRequest::new(members("s1"))
                            .after(cursor)
                            .direction(direction),
                    )
                    .unwrap();
                seen.extend(page.keys().map(|k| k.last_segment().to_string()));
                match page.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => return seen,
                }
            }
        }

        proptest! {
            #[test]
            fn prop_pages_visit_each_visible_id_once(
                ids in proptest::collection::btree_set("[a-z0-9]{1,8}", 0..40),
                hidden in proptest::collection::vec(any::<bool>(), 40),
                limit in 1usize..7,
            ) {
                let store = MemoryStore::with_chunk_size(3);
                let deletes = DeleteQueue::new();
                let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
                seed_members(&store, &ids);
                let other = keys::space_member_key("s2", "zz").unwrap();
                store.put_record(&other, &json!({})).unwrap();

                let mut visible = BTreeSet::new();
                for (id, hide) in ids.iter().zip(hidden.iter()) {
                    if *hide {
                        deletes.mark_pending(&members_owner("s1"), id);
                    } else {
                        visible.insert(id.to_string());
                    }
                }

                let forward = walk(&store, &deletes, Direction::Forward, limit);
                let expected: Vec<String> = visible.iter().cloned().collect();
                prop_assert_eq!(&forward, &expected);

                let mut reverse = walk(&store, &deletes, Direction::Reverse, limit);
                reverse.reverse();
                prop_assert_eq!(reverse, expected);
            }
        }
    }
}
