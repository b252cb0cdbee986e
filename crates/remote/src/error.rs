//! Per-server fetch failures
//!
//! These never escape a fan-out read on their own; they are rendered into
//! `ServerFailure` entries of `AllServersUnreachable`.

use std::time::Duration;

/// Why one server could not supply a record
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server address cannot form a request URL
    #[error("invalid server address {server}: {reason}")]
    InvalidAddress {
        /// Address as given by the caller
        server: String,
        /// Why it was rejected
        reason: String,
    },
    /// Connection, TLS or protocol failure
    #[error("transport error: {0}")]
    Transport(String),
    /// Request exceeded the per-server timeout
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Server answered with a non-success status
    #[error("server returned status {0}")]
    Status(u16),
    /// Body was not JSON
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    /// JSON body that does not carry a record
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
