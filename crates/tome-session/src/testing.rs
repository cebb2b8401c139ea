//! Test doubles shared by the orchestration tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use tome_client::{BackendHealth, ClientError, DocumentBackend, IngestReceipt, QueryOutcome};
use tome_core::types::FileMeta;

/// Handle to a file that never touches the filesystem.
pub(crate) fn file(name: &str) -> FileMeta {
    FileMeta {
        name: name.to_string(),
        size: 1024,
        path: name.into(),
    }
}

/// Backend double replaying scripted results in order.
///
/// Unscripted calls succeed with benign defaults. Every call is recorded
/// so tests can assert exactly what reached the network boundary.
pub(crate) struct ScriptedBackend {
    query_script: Mutex<VecDeque<Result<QueryOutcome, ClientError>>>,
    ingest_script: Mutex<VecDeque<Result<IngestReceipt, ClientError>>>,
    calls: Mutex<Vec<String>>,
    query_gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self {
            query_script: Mutex::new(VecDeque::new()),
            ingest_script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            query_gate: Mutex::new(None),
        }
    }

    pub(crate) fn push_query(&self, result: Result<QueryOutcome, ClientError>) {
        self.query_script.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_ingest(&self, result: Result<IngestReceipt, ClientError>) {
        self.ingest_script.lock().unwrap().push_back(result);
    }

    /// Block every query until the notify fires.
    pub(crate) fn gate_queries(&self, gate: Arc<Notify>) {
        *self.query_gate.lock().unwrap() = Some(gate);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn answer(answer: &str, sources: &[&str], confidence: Option<f64>) -> QueryOutcome {
        QueryOutcome {
            answer: Some(answer.to_string()),
            sources: Some(sources.iter().map(|s| s.to_string()).collect()),
            confidence,
        }
    }

    pub(crate) fn receipt(name: &str) -> IngestReceipt {
        IngestReceipt {
            filename: name.to_string(),
            chunks_added: 1,
            total_chunks: 1,
        }
    }
}

#[async_trait]
impl DocumentBackend for ScriptedBackend {
    async fn ingest(&self, file: &FileMeta) -> Result<IngestReceipt, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("ingest:{}", file.name));
        let scripted = self.ingest_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(Self::receipt(&file.name)))
    }

    async fn query(&self, question: &str) -> Result<QueryOutcome, ClientError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("query:{}", question));
        let gate = self.query_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let scripted = self.query_script.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(QueryOutcome::default()))
    }

    async fn health(&self) -> Result<BackendHealth, ClientError> {
        self.calls.lock().unwrap().push("health".to_string());
        Ok(BackendHealth {
            status: "ok".to_string(),
            uploaded_files: Vec::new(),
            total_chunks: 0,
        })
    }
}
