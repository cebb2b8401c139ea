//! The backend seam: operations and wire types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tome_core::types::FileMeta;

use crate::error::ClientError;

/// Wire shape of a query response.
///
/// Every field is optional on the wire; defaults are applied where the
/// outcome is folded into the conversation, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryOutcome {
    pub answer: Option<String>,
    pub sources: Option<Vec<String>>,
    pub confidence: Option<f64>,
}

/// Receipt returned by a successful document ingestion.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestReceipt {
    pub filename: String,
    #[serde(default)]
    pub chunks_added: u64,
    #[serde(default)]
    pub total_chunks: u64,
}

/// Snapshot of backend state from the health probe.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    #[serde(default)]
    pub uploaded_files: Vec<String>,
    #[serde(default)]
    pub total_chunks: u64,
}

/// Body of a query request.
#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    pub question: &'a str,
}

/// Operations the orchestration layer consumes from the remote backend.
///
/// Implementations must not mutate any conversation or upload state; they
/// only move bytes and report success or failure to the caller.
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    /// Submit a document for indexing.
    async fn ingest(&self, file: &FileMeta) -> Result<IngestReceipt, ClientError>;

    /// Ask a question over the ingested documents.
    async fn query(&self, question: &str) -> Result<QueryOutcome, ClientError>;

    /// Probe backend liveness and corpus size.
    async fn health(&self) -> Result<BackendHealth, ClientError>;
}
