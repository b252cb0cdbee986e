//! Delete-queue cache: ids pending deletion, per owner
//!
//! An owner is a namespace of ids: the database uses the prefix of the key
//! range the ids live in, so ids from unrelated ranges never mask each
//! other.
//!
//! Read paths consult the queue to hide records whose delete has started but
//! may not be visible yet. The queue is advisory:
//! - absence does not prove the id still exists
//! - presence does not prove the delete has landed
//!
//! It lives in memory only and is owned by whoever constructs it (the
//! database facade), never a process-wide singleton. Entries are added when a
//! delete starts and removed when it finishes, through [`PendingDelete`].

use dashmap::DashMap;
use rustc_hash::FxHashSet;

/// Per-owner set of ids mid-deletion
#[derive(Debug, Default)]
pub struct DeleteQueue {
    pending: DashMap<String, FxHashSet<String>>,
}

impl DeleteQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as pending deletion; returns `false` if it already was
    pub fn mark_pending(&self, owner: &str, id: &str) -> bool {
        self.pending
            .entry(owner.to_string())
            .or_default()
            .insert(id.to_string())
    }

    /// Check whether `id` is pending deletion
    pub fn is_pending(&self, owner: &str, id: &str) -> bool {
        self.pending
            .get(owner)
            .map(|ids| ids.contains(id))
            .unwrap_or(false)
    }

    /// Remove `id` from the queue; returns `false` if it was not pending
    pub fn clear_pending(&self, owner: &str, id: &str) -> bool {
        let removed = match self.pending.get_mut(owner) {
            Some(mut ids) => ids.remove(id),
            None => false,
        };
        self.pending.remove_if(owner, |_, ids| ids.is_empty());
        removed
    }

    /// Drop every pending id of `owner`; returns how many were dropped
    pub fn clear_owner(&self, owner: &str) -> usize {
        self.pending
            .remove(owner)
            .map(|(_, ids)| ids.len())
            .unwrap_or(0)
    }

    /// Drop everything
    pub fn clear_all(&self) {
        self.pending.clear();
    }

    /// Number of pending ids for `owner`
    pub fn pending_count(&self, owner: &str) -> usize {
        self.pending.get(owner).map(|ids| ids.len()).unwrap_or(0)
    }

    /// Copy of `owner`'s pending ids, `None` when nothing is pending
    ///
    /// Range scans take one snapshot up front instead of locking per entry.
    pub fn snapshot(&self, owner: &str) -> Option<FxHashSet<String>> {
        self.pending
            .get(owner)
            .filter(|ids| !ids.is_empty())
            .map(|ids| ids.clone())
    }

    /// Mark `ids` pending until the returned guard is dropped
    pub fn guard<I, S>(&self, owner: &str, ids: I) -> PendingDelete<'_>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut marked = Vec::new();
        for id in ids {
            let id = id.into();
            if self.mark_pending(owner, &id) {
                marked.push(id);
            }
        }
        PendingDelete {
            queue: self,
            owner: owner.to_string(),
            ids: marked,
        }
    }
}

/// Ids masked for the duration of a delete
///
/// Only ids this guard newly marked are cleared on drop, so overlapping
/// deletes of the same id do not unmask each other early.
#[derive(Debug)]
pub struct PendingDelete<'a> {
    queue: &'a DeleteQueue,
    owner: String,
    ids: Vec<String>,
}

impl PendingDelete<'_> {
    /// Ids this guard marked
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Drop for PendingDelete<'_> {
    fn drop(&mut self) {
        for id in &self.ids {
            self.queue.clear_pending(&self.owner, id);
        }
    }
}
