//! Cross-server reads for DialogDB
//!
//! A record replicated (or partitioned) across independent servers is read
//! by asking every candidate at once and keeping the first valid answer:
//! - FanoutReader: concurrent requests, first success wins, failures collected
//! - RecordSource: transport seam, one request to one server
//! - HttpRecordSource: `GET {server}{read_path}/{id}` with a bearer token
//!
//! There is no quorum, retry or freshness comparison; a stale but valid
//! answer that arrives first is returned.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod fanout;
pub mod http;
pub mod source;

pub use error::FetchError;
pub use fanout::{is_valid_payload, FanoutReader, SourcedRecord};
pub use http::HttpRecordSource;
pub use source::RecordSource;
