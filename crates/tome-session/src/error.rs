//! Error types for the orchestration layer.

use tome_client::ClientError;
use tome_core::error::TomeError;

/// Errors from the session controller and its pipelines.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("a query is already in flight")]
    QueryInFlight,
    #[error("ingestion failed for {name}: {reason}")]
    Ingestion { name: String, reason: String },
    #[error("invalid toast transition: {from} -> {to}")]
    ToastTransition { from: String, to: String },
    #[error("backend error: {0}")]
    Backend(#[from] ClientError),
}

impl From<SessionError> for TomeError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Ingestion { .. } => TomeError::Upload(err.to_string()),
            other => TomeError::Session(other.to_string()),
        }
    }
}
