//! Transport seam for fan-out reads

use async_trait::async_trait;
use dialogdb_core::Record;

use crate::error::FetchError;

/// Fetches one record from one server
///
/// Implementations report every failure as a [`FetchError`]; payload
/// validation happens in the fan-out reader, not here.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Request `id` from `server`, authenticating with `token`
    async fn fetch(&self, server: &str, id: &str, token: &str) -> Result<Record, FetchError>;
}
