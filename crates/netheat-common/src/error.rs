//! Error type shared by all control-plane client implementations.

use thiserror::Error;

/// Failure of a single control-plane call.
///
/// Every call is independent; callers branch on `Result` instead of letting
/// errors propagate across resources, so one failed create/delete never
/// aborts its siblings.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{operation} returned status {status}")]
    UnexpectedStatus { operation: &'static str, status: u16 },
    #[error("malformed response body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}
