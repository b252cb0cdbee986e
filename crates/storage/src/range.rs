//! Range specifications and the lazy range iterator
//!
//! # Design
//!
//! Backends expose a single primitive, [`OrderedStore::scan_chunk`], which
//! returns at most `max` entries from a bounded interval. [`RangeIter`] drives
//! it lazily: it fetches one chunk, yields it, then narrows the interval to
//! resume strictly after (or before, in reverse) the last key it produced.
//!
//! Consequences:
//! - No backend read transaction outlives a single `scan_chunk` call
//! - Entries written behind the cursor during iteration are not revisited
//! - The iterator is one-shot; a second pass needs a new `iterate` call

use serde::de::DeserializeOwned;
use std::collections::VecDeque;
use std::ops::Bound;

use dialogdb_core::{Key, KeyRange, Result};

use crate::store::OrderedStore;

/// Default number of entries fetched per backend round trip
pub const DEFAULT_SCAN_CHUNK: usize = 256;

/// Iteration direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// Ascending byte order
    #[default]
    Forward,
    /// Descending byte order
    Reverse,
}

impl Direction {
    /// Check for reverse iteration
    pub fn is_reverse(self) -> bool {
        matches!(self, Direction::Reverse)
    }
}

/// Bounds, direction and limit of one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    /// Lower bound
    pub lower: Bound<Vec<u8>>,
    /// Upper bound
    pub upper: Bound<Vec<u8>>,
    /// Iteration direction
    pub direction: Direction,
    /// Maximum number of entries to yield
    pub limit: Option<usize>,
    /// Skip copying values (entries carry an empty value)
    pub keys_only: bool,
}

impl Default for RangeSpec {
    fn default() -> Self {
        Self::all()
    }
}

impl RangeSpec {
    /// The whole keyspace, forward
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
            direction: Direction::Forward,
            limit: None,
            keys_only: false,
        }
    }

    /// Every key inside `range`: `gte prefix, lte prefix + 0xFF`
    pub fn prefix(range: &KeyRange) -> Self {
        Self {
            lower: Bound::Included(range.lower().to_vec()),
            upper: Bound::Included(range.upper().to_vec()),
            ..Self::all()
        }
    }

    /// Inclusive lower bound
    pub fn gte(mut self, key: impl AsRef<[u8]>) -> Self {
        self.lower = Bound::Included(key.as_ref().to_vec());
        self
    }

    /// Exclusive lower bound
    pub fn gt(mut self, key: impl AsRef<[u8]>) -> Self {
        self.lower = Bound::Excluded(key.as_ref().to_vec());
        self
    }

    /// Inclusive upper bound
    pub fn lte(mut self, key: impl AsRef<[u8]>) -> Self {
        self.upper = Bound::Included(key.as_ref().to_vec());
        self
    }

    /// Exclusive upper bound
    pub fn lt(mut self, key: impl AsRef<[u8]>) -> Self {
        self.upper = Bound::Excluded(key.as_ref().to_vec());
        self
    }

    /// Iterate in descending order
    pub fn reverse(mut self) -> Self {
        self.direction = Direction::Reverse;
        self
    }

    /// Set the direction
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Cap the number of yielded entries
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Do not read values
    pub fn keys_only(mut self) -> Self {
        self.keys_only = true;
        self
    }

    /// Check whether the bounds admit no key at all
    pub fn is_empty_interval(&self) -> bool {
        is_empty_interval(&self.lower, &self.upper)
    }
}

pub(crate) fn is_empty_interval(lower: &Bound<Vec<u8>>, upper: &Bound<Vec<u8>>) -> bool {
    match (lower, upper) {
        (Bound::Included(l), Bound::Included(u)) => l > u,
        (Bound::Included(l), Bound::Excluded(u))
        | (Bound::Excluded(l), Bound::Included(u))
        | (Bound::Excluded(l), Bound::Excluded(u)) => l >= u,
        _ => false,
    }
}

/// Borrow a bound as a slice bound
pub(crate) fn slice_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

/// One bounded fetch issued by [`RangeIter`]
#[derive(Debug)]
pub struct ChunkRequest<'a> {
    /// Lower bound
    pub lower: &'a Bound<Vec<u8>>,
    /// Upper bound
    pub upper: &'a Bound<Vec<u8>>,
    /// Direction
    pub direction: Direction,
    /// Maximum entries to return
    pub max: usize,
    /// Skip values
    pub keys_only: bool,
}

/// Raw `(key, value)` pair as returned by a backend
pub type RawEntry = (Vec<u8>, Vec<u8>);

/// One iterated entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry key
    pub key: Key,
    /// Encoded record (empty for keys-only scans)
    pub value: Vec<u8>,
}

impl Entry {
    /// Decode the value as JSON
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.value)?)
    }
}

/// Lazy, one-shot iterator over a key range
pub struct RangeIter<'a> {
    store: &'a dyn OrderedStore,
    lower: Bound<Vec<u8>>,
    upper: Bound<Vec<u8>>,
    direction: Direction,
    keys_only: bool,
    remaining: Option<usize>,
    chunk_size: usize,
    buffer: VecDeque<RawEntry>,
    exhausted: bool,
}

impl<'a> RangeIter<'a> {
    /// Create an iterator over `spec`, fetching `chunk_size` entries at a time
    pub fn new(store: &'a dyn OrderedStore, spec: RangeSpec, chunk_size: usize) -> Self {
        let exhausted = spec.is_empty_interval() || spec.limit == Some(0);
        Self {
            store,
            lower: spec.lower,
            upper: spec.upper,
            direction: spec.direction,
            keys_only: spec.keys_only,
            remaining: spec.limit,
            chunk_size: chunk_size.max(1),
            buffer: VecDeque::new(),
            exhausted,
        }
    }

    fn refill(&mut self) -> Result<()> {
        let max = match self.remaining {
            Some(n) => n.min(self.chunk_size),
            None => self.chunk_size,
        };
        let chunk = self.store.scan_chunk(&ChunkRequest {
            lower: &self.lower,
            upper: &self.upper,
            direction: self.direction,
            max,
            keys_only: self.keys_only,
        })?;

        if chunk.len() < max {
            self.exhausted = true;
        }
        if let Some((last, _)) = chunk.last() {
            match self.direction {
                Direction::Forward => self.lower = Bound::Excluded(last.clone()),
                Direction::Reverse => self.upper = Bound::Excluded(last.clone()),
            }
            if is_empty_interval(&self.lower, &self.upper) {
                self.exhausted = true;
            }
        }
        self.buffer.extend(chunk);
        Ok(())
    }
}

impl Iterator for RangeIter<'_> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            return None;
        }
        if self.buffer.is_empty() {
            if self.exhausted {
                return None;
            }
            if let Err(e) = self.refill() {
                self.exhausted = true;
                self.buffer.clear();
                return Some(Err(e));
            }
        }

        let (key, value) = self.buffer.pop_front()?;
        if let Some(n) = self.remaining.as_mut() {
            *n -= 1;
        }
        Some(Key::from_bytes(key).map(|key| Entry { key, value }))
    }
}

impl std::fmt::Debug for RangeIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RangeIter")
            .field("direction", &self.direction)
            .field("remaining", &self.remaining)
            .field("buffered", &self.buffer.len())
            .field("exhausted", &self.exhausted)
            .finish()
    }
}
