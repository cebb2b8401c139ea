//! Error types for the backend client.

use tome_core::error::TomeError;

/// Errors from the document backend client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure: connection refused, DNS, timeout.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-success status code.
    #[error("backend returned status {0}")]
    Status(u16),
    /// The response body could not be decoded into the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// The file to upload could not be read from disk.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
}

impl From<ClientError> for TomeError {
    fn from(err: ClientError) -> Self {
        TomeError::Backend(err.to_string())
    }
}
