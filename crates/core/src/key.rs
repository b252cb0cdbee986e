//! Keys, key ranges and identifier validation
//!
//! A [`Key`] is an immutable string of ordered segments joined by
//! [`DELIMITER`]. Keys compare byte-lexicographically, which is the order the
//! store iterates in.
//!
//! ## Contract
//!
//! Identifiers embedded in keys are validated before any key is built:
//! - Identifiers must not be empty
//! - Identifiers must not contain the delimiter `-`
//! - Identifiers must not contain control characters or whitespace
//! - Identifiers must not exceed [`MAX_IDENTIFIER_BYTES`]
//!
//! Keys are always valid UTF-8, so they never contain the byte `0xFF`.
//! Appending `0xFF` to a prefix therefore yields an upper bound that is
//! strictly greater than every key sharing the prefix and smaller than every
//! key that does not.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::error::{Error, Result};

/// Segment delimiter
pub const DELIMITER: char = '-';

/// Byte appended to a prefix to form its inclusive upper bound
pub const PREFIX_UPPER_BYTE: u8 = 0xFF;

/// Maximum identifier length in bytes
pub const MAX_IDENTIFIER_BYTES: usize = 128;

/// Ordered address of one record in the store
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Build a key from already-validated segments
    pub(crate) fn from_segments(segments: &[&str]) -> Self {
        let mut out = String::with_capacity(segments.iter().map(|s| s.len() + 1).sum());
        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                out.push(DELIMITER);
            }
            out.push_str(segment);
        }
        Key(out)
    }

    /// Wrap a raw key string
    ///
    /// Store-level escape hatch: the ordered store accepts any non-empty
    /// key. Database operations never call this; they derive keys through
    /// [`crate::keys`]. Rejects only the empty string.
    pub fn raw(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(Error::InvalidIdentifier {
                field: "key",
                reason: KeyError::Empty,
            });
        }
        Ok(Key(key))
    }

    /// Decode a key from store bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        String::from_utf8(bytes)
            .map(Key)
            .map_err(|e| Error::Serialization(format!("stored key is not UTF-8: {}", e)))
    }

    /// Key as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key as bytes
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the underlying string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Last delimiter-separated segment
    pub fn last_segment(&self) -> &str {
        self.0.rsplit(DELIMITER).next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", self.0)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// All keys sharing one prefix
///
/// `prefix` is the inclusive lower bound, `upper` is `prefix + 0xFF` and is
/// the inclusive upper bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    prefix: String,
    upper: Vec<u8>,
}

impl KeyRange {
    /// Range over every key that starts with `prefix`
    pub(crate) fn for_prefix(prefix: String) -> Self {
        let mut upper = Vec::with_capacity(prefix.len() + 1);
        upper.extend_from_slice(prefix.as_bytes());
        upper.push(PREFIX_UPPER_BYTE);
        Self { prefix, upper }
    }

    /// The shared prefix (inclusive lower bound)
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lower bound bytes
    pub fn lower(&self) -> &[u8] {
        self.prefix.as_bytes()
    }

    /// Upper bound bytes (`prefix + 0xFF`)
    pub fn upper(&self) -> &[u8] {
        &self.upper
    }

    /// Check whether a key falls inside this range
    pub fn contains(&self, key: &Key) -> bool {
        key.as_str().starts_with(&self.prefix)
    }

    /// The part of `key` after the prefix, if the key is in range
    pub fn suffix_of<'k>(&self, key: &'k Key) -> Option<&'k str> {
        key.as_str().strip_prefix(self.prefix.as_str())
    }
}

/// Validate an identifier that will be embedded in a key
///
/// # Examples
///
/// ```
/// use dialogdb_core::key::validate_identifier;
///
/// assert!(validate_identifier("tenant_id", "user_42").is_ok());
/// assert!(validate_identifier("tenant_id", "").is_err());
/// assert!(validate_identifier("tenant_id", "a-b").is_err());
/// ```
pub fn validate_identifier<'a>(field: &'static str, id: &'a str) -> Result<&'a str> {
    check_identifier(id).map_err(|reason| Error::InvalidIdentifier { field, reason })?;
    Ok(id)
}

/// Identifier rules without field context
pub fn check_identifier(id: &str) -> std::result::Result<(), KeyError> {
    // Rule 1: not empty
    if id.is_empty() {
        return Err(KeyError::Empty);
    }

    // Rule 2: bounded length
    if id.len() > MAX_IDENTIFIER_BYTES {
        return Err(KeyError::TooLong {
            actual: id.len(),
            max: MAX_IDENTIFIER_BYTES,
        });
    }

    // Rule 3: no delimiter
    if id.contains(DELIMITER) {
        return Err(KeyError::ContainsDelimiter);
    }

    // Rule 4: printable, no whitespace
    if let Some(c) = id.chars().find(|c| c.is_control() || c.is_whitespace()) {
        return Err(KeyError::InvalidCharacter(c));
    }

    Ok(())
}

/// Identifier validation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KeyError {
    /// Identifier is empty
    #[error("identifier cannot be empty")]
    Empty,

    /// Identifier contains the key delimiter
    #[error("identifier cannot contain '{}'", DELIMITER)]
    ContainsDelimiter,

    /// Identifier contains a control or whitespace character
    #[error("identifier contains invalid character {0:?}")]
    InvalidCharacter(char),

    /// Identifier exceeds maximum length
    #[error("identifier too long: {actual} bytes exceeds maximum {max}")]
    TooLong {
        /// Actual length in bytes
        actual: usize,
        /// Maximum allowed length
        max: usize,
    },
}

impl KeyError {
    /// Get the reason code for the tool-facing boundary
    pub fn reason_code(&self) -> &'static str {
        match self {
            KeyError::Empty => "empty_identifier",
            KeyError::ContainsDelimiter => "contains_delimiter",
            KeyError::InvalidCharacter(_) => "invalid_character",
            KeyError::TooLong { .. } => "identifier_too_long",
        }
    }
}
