//! HTTP transport for fan-out reads

use std::time::Duration;

use async_trait::async_trait;
use dialogdb_core::Record;
use reqwest::Url;

use crate::error::FetchError;
use crate::source::RecordSource;

/// Default path appended to each server address
pub const DEFAULT_READ_PATH: &str = "/api/v1/db/read";

/// `GET {server}{read_path}/{id}` with `Authorization: Bearer {token}`
///
/// `id` is sent as a single percent-encoded path segment, so `/`, `?` and
/// `#` inside it never change which resource is requested.
pub struct HttpRecordSource {
    http_client: reqwest::Client,
    read_path: String,
    timeout: Duration,
}

impl HttpRecordSource {
    /// Create a source with a per-request timeout
    #[must_use]
    pub fn new(read_path: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client,
            read_path: read_path.into(),
            timeout,
        }
    }

    /// Replace the HTTP client (proxies, custom TLS roots)
    pub fn set_http_client(&mut self, http_client: reqwest::Client) {
        self.http_client = http_client;
    }

    /// URL requested for `id` on `server`
    ///
    /// # Errors
    ///
    /// `InvalidAddress` if `server` is not an absolute URL that can carry a
    /// path.
    pub fn url_for(&self, server: &str, id: &str) -> Result<Url, FetchError> {
        let invalid = |reason: String| FetchError::InvalidAddress {
            server: server.to_string(),
            reason,
        };
        let mut url = Url::parse(server).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(self.read_path.split('/').filter(|segment| !segment.is_empty()))
            .push(id);
        Ok(url)
    }
}

impl std::fmt::Debug for HttpRecordSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRecordSource")
            .field("read_path", &self.read_path)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self, server: &str, id: &str, token: &str) -> Result<Record, FetchError> {
        let response = self
            .http_client
            .get(self.url_for(server, id)?)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let payload = response.bytes().await.map_err(|e| self.classify(e))?;
        Ok(serde_json::from_slice(&payload)?)
    }
}

impl HttpRecordSource {
    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}
