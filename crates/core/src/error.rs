//! Error types for DialogDB
//!
//! This module defines the error taxonomy shared by every layer.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! ## Taxonomy
//!
//! | Variant | Raised when |
//! |---------|-------------|
//! | `NotFound` | A key is absent from the store |
//! | `AlreadyExists` | Duplicate table/entity creation |
//! | `StoreUnavailable` | The underlying storage engine failed |
//! | `AllServersUnreachable` | Every fan-out candidate failed |
//! | `Unauthorized` / `Forbidden` | Auth boundary rejected the caller |
//! | `InvalidIdentifier` | An id cannot be turned into a key |
//! | `LockTimeout` | A bounded tenant lock wait expired |

use crate::key::KeyError;
use thiserror::Error;

/// Result type alias for DialogDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single failed server in a fan-out read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerFailure {
    /// Server address as given by the caller
    pub server: String,
    /// Human-readable failure reason
    pub reason: String,
}

/// Error types for DialogDB
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent from the store
    #[error("Key not found: {key}")]
    NotFound {
        /// The key (or id) that was looked up
        key: String,
    },

    /// Entity already exists (duplicate creation)
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Entity kind, e.g. `"table"`
        kind: &'static str,
        /// Entity id
        id: String,
    },

    /// Storage engine I/O failure
    #[error("Store unavailable during {operation}: {message}")]
    StoreUnavailable {
        /// Store operation that failed (`get`, `put`, `commit`, ...)
        operation: &'static str,
        /// Engine error message
        message: String,
    },

    /// Every fan-out server failed
    #[error("All {} servers unreachable for {id}", failures.len())]
    AllServersUnreachable {
        /// The id that was requested
        id: String,
        /// Per-server failures in completion order
        failures: Vec<ServerFailure>,
    },

    /// Caller is not authenticated
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Identifier rejected before key construction
    #[error("Invalid identifier for {field}: {reason}")]
    InvalidIdentifier {
        /// Which identifier was rejected (`tenant_id`, `dialog_id`, ...)
        field: &'static str,
        /// Why it was rejected
        reason: KeyError,
    },

    /// Invalid argument or request shape
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Bounded tenant lock wait expired
    #[error("Lock wait for tenant {tenant} timed out after {waited_ms}ms")]
    LockTimeout {
        /// Tenant whose lock could not be acquired
        tenant: String,
        /// How long the caller waited
        waited_ms: u64,
    },

    /// Operation aborted by an external cancellation signal
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration could not be read or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Build a `NotFound` error for a key or id
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Build a `StoreUnavailable` error from any displayable engine error
    pub fn store(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Error::StoreUnavailable {
            operation,
            message: err.to_string(),
        }
    }

    /// Build an `InvalidInput` error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Check whether this is a `NotFound` error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Check whether this is an `AlreadyExists` error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// Get the reason code for the tool-facing boundary
    pub fn reason_code(&self) -> &'static str {
        match self {
            Error::NotFound { .. } => "not_found",
            Error::AlreadyExists { .. } => "already_exists",
            Error::StoreUnavailable { .. } => "store_unavailable",
            Error::AllServersUnreachable { .. } => "all_servers_unreachable",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::InvalidIdentifier { .. } => "invalid_identifier",
            Error::InvalidInput(_) => "invalid_input",
            Error::Serialization(_) => "serialization",
            Error::LockTimeout { .. } => "lock_timeout",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "config",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
