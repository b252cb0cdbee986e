//! Time-ordered, lexicographically sortable identifiers
//!
//! A [`SortableId`] is a UUIDv7 rendered as 32 lowercase hex characters:
//!
//! ```text
//! | 48-bit unix millis | ver | 12-bit counter | var | 62 random bits |
//! ```
//!
//! Hex rendering preserves byte order, so string order equals generation
//! order. The generator never hands out the same `(millis, counter)` pair
//! twice: within one millisecond the counter increments, and when the counter
//! is exhausted or the wall clock goes backwards the logical millisecond is
//! advanced instead.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::{Builder, Uuid};

/// Largest value of the 12-bit counter
const MAX_COUNTER: u16 = 0x0FFF;

static GLOBAL: Lazy<IdGenerator> = Lazy::new(IdGenerator::new);

/// Sortable unique identifier
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortableId(String);

impl SortableId {
    /// Generate a new id from the process-wide generator
    pub fn generate() -> Self {
        GLOBAL.next()
    }

    /// Id as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the underlying string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Unix millis encoded in the id
    pub fn timestamp_millis(&self) -> Option<u64> {
        self.0.get(..12).and_then(|hex| u64::from_str_radix(hex, 16).ok())
    }
}

impl fmt::Display for SortableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for SortableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SortableId({})", self.0)
    }
}

#[derive(Debug, Default)]
struct GeneratorState {
    millis: u64,
    counter: u16,
}

/// Monotonic sortable id generator
///
/// Most callers use [`SortableId::generate`]; separate instances exist for
/// tests that drive the clock explicitly.
#[derive(Debug, Default)]
pub struct IdGenerator {
    state: Mutex<GeneratorState>,
}

impl IdGenerator {
    /// Create a generator with no history
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id at the current wall clock time
    pub fn next(&self) -> SortableId {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        self.next_at(now)
    }

    /// Next id for an explicit wall clock reading
    pub fn next_at(&self, now_millis: u64) -> SortableId {
        let (millis, counter) = {
            let mut state = self.state.lock();
            let next = if now_millis > state.millis {
                (now_millis, 0)
            } else if state.counter < MAX_COUNTER {
                (state.millis, state.counter + 1)
            } else {
                (state.millis + 1, 0)
            };
            state.millis = next.0;
            state.counter = next.1;
            next
        };

        let mut bytes = [0u8; 10];
        rand::thread_rng().fill(&mut bytes[2..]);
        bytes[0] = (counter >> 8) as u8;
        bytes[1] = (counter & 0xFF) as u8;

        let uuid: Uuid = Builder::from_unix_timestamp_millis(millis, &bytes).into_uuid();
        SortableId(uuid.simple().to_string())
    }
}
