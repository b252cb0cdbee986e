//! Multi-server fan-out reader
//!
//! ## Protocol
//!
//! ```text
//! request_servers(servers, id, token):
//!   dedupe servers, keep first occurrence order
//!   empty list                          -> AllServersUnreachable, no failures
//!   one in-flight request per server (FuturesUnordered)
//!   for each completion:
//!     Ok + valid payload                -> return it tagged with the server,
//!                                          drop (cancel) the rest
//!     anything else                     -> record failure, keep waiting
//!   all completed without a winner      -> AllServersUnreachable { failures }
//! ```
//!
//! A cancel signal (`watch::Receiver<bool>` flipping to `true`) drops every
//! in-flight request and yields `Cancelled`.

use std::sync::Arc;
use std::time::Duration;

use dialogdb_core::{Error, Record, Result, ServerFailure};
use futures_util::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http::HttpRecordSource;
use crate::source::RecordSource;

/// A record plus the server(s) it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedRecord {
    /// The record as the server returned it
    pub record: Record,
    /// Address of the server that answered
    pub source: Vec<String>,
}

impl SourcedRecord {
    /// The record with a top-level `"source"` array merged in
    ///
    /// Non-object records are wrapped as `{"value": record, "source": [...]}`.
    pub fn into_tagged(self) -> Record {
        match self.record {
            Value::Object(mut map) => {
                map.insert("source".to_string(), json!(self.source));
                Value::Object(map)
            }
            other => json!({ "value": other, "source": self.source }),
        }
    }
}

/// Check a server response for a usable record
///
/// A payload is valid when it is not `null` and, if it is an object, has no
/// top-level `"error"` key.
pub fn is_valid_payload(payload: &Record) -> bool {
    invalid_reason(payload).is_none()
}

fn invalid_reason(payload: &Record) -> Option<String> {
    match payload {
        Value::Null => Some("null payload".to_string()),
        Value::Object(map) => map
            .get("error")
            .map(|err| format!("server reported error: {err}")),
        _ => None,
    }
}

/// Reads one record from whichever server answers first
#[derive(Clone)]
pub struct FanoutReader {
    source: Arc<dyn RecordSource>,
}

impl std::fmt::Debug for FanoutReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FanoutReader").finish_non_exhaustive()
    }
}

impl FanoutReader {
    /// Create a reader over an arbitrary transport
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    /// Create a reader over HTTP
    pub fn http(read_path: impl Into<String>, request_timeout: Duration) -> Self {
        Self::new(Arc::new(HttpRecordSource::new(read_path, request_timeout)))
    }

    /// Request `id` from every server, return the first valid answer
    ///
    /// # Errors
    ///
    /// `AllServersUnreachable` when the list is empty or no server produced
    /// a valid payload; `failures` holds one entry per server in completion
    /// order.
    pub async fn request_servers<S: AsRef<str>>(
        &self,
        servers: &[S],
        id: &str,
        token: &str,
    ) -> Result<SourcedRecord> {
        self.fan_out(servers, id, token, None).await
    }

    /// Like [`request_servers`](Self::request_servers), abandoning every
    /// in-flight request once `cancel` reads `true`
    ///
    /// # Errors
    ///
    /// `Cancelled` if the signal fires before a winner is found.
    pub async fn request_servers_with_cancel<S: AsRef<str>>(
        &self,
        servers: &[S],
        id: &str,
        token: &str,
        cancel: watch::Receiver<bool>,
    ) -> Result<SourcedRecord> {
        self.fan_out(servers, id, token, Some(cancel)).await
    }

    async fn fan_out<S: AsRef<str>>(
        &self,
        servers: &[S],
        id: &str,
        token: &str,
        mut cancel: Option<watch::Receiver<bool>>,
    ) -> Result<SourcedRecord> {
        let mut unique: Vec<&str> = Vec::with_capacity(servers.len());
        for server in servers {
            let server = server.as_ref();
            if !unique.contains(&server) {
                unique.push(server);
            }
        }
        if unique.is_empty() {
            return Err(Error::AllServersUnreachable {
                id: id.to_string(),
                failures: Vec::new(),
            });
        }
        if cancel.as_ref().is_some_and(|rx| *rx.borrow()) {
            return Err(Error::Cancelled);
        }

        let source = self.source.as_ref();
        let mut in_flight: FuturesUnordered<_> = unique
            .iter()
            .map(|&server| async move { (server, source.fetch(server, id, token).await) })
            .collect();
        debug!(target: "dialogdb::fanout", id, servers = unique.len(), "Fan-out started");

        let mut failures = Vec::new();
        loop {
            let next = match cancel.as_mut() {
                Some(rx) => tokio::select! {
                    biased;
                    _ = cancelled(rx) => {
                        debug!(target: "dialogdb::fanout", id, "Fan-out cancelled");
                        return Err(Error::Cancelled);
                    }
                    next = in_flight.next() => next,
                },
                None => in_flight.next().await,
            };

            let Some((server, outcome)) = next else {
                break;
            };
            let reason = match outcome {
                Ok(record) => match invalid_reason(&record) {
                    None => {
                        debug!(target: "dialogdb::fanout", id, server, "Fan-out answered");
                        return Ok(SourcedRecord {
                            record,
                            source: vec![server.to_string()],
                        });
                    }
                    Some(reason) => FetchError::InvalidPayload(reason).to_string(),
                },
                Err(err) => err.to_string(),
            };
            warn!(target: "dialogdb::fanout", id, server, reason = %reason, "Server failed");
            failures.push(ServerFailure {
                server: server.to_string(),
                reason,
            });
        }

        warn!(target: "dialogdb::fanout", id, failed = failures.len(), "All servers unreachable");
        Err(Error::AllServersUnreachable {
            id: id.to_string(),
            failures,
        })
    }
}

/// Resolves once the signal reads `true`; never resolves if the sender is
/// dropped without cancelling.
async fn cancelled(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
