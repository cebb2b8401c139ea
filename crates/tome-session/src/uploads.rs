//! Sequential upload batch processing.

use std::sync::{Arc, Mutex};

use tome_client::{DocumentBackend, IngestReceipt};
use tome_core::config::UploadConfig;
use tome_core::types::{FileMeta, UploadStatus};

use crate::error::SessionError;

/// A file waiting in, or moving through, the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadTask {
    pub file: FileMeta,
    pub status: UploadStatus,
}

/// Sequences pending file uploads, one at a time.
///
/// Policy: halt on first failure. The failed task and everything behind it
/// stay in the pending list; files already uploaded stay recorded. Upload
/// never touches the conversation log.
pub struct UploadQueue {
    pending: Mutex<Vec<UploadTask>>,
    completed: Mutex<Vec<String>>,
    backend: Arc<dyn DocumentBackend>,
    allowed_extensions: Vec<String>,
}

impl UploadQueue {
    /// Create an empty queue over the given backend.
    pub fn new(backend: Arc<dyn DocumentBackend>, config: &UploadConfig) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
            backend,
            allowed_extensions: config.allowed_extensions.clone(),
        }
    }

    /// Append files to the pending list without starting any upload.
    pub fn enqueue(&self, files: Vec<FileMeta>) {
        let mut pending = self.pending.lock().expect("pending mutex poisoned");
        for file in files {
            tracing::debug!(file = %file.name, size = file.size, "Upload queued");
            pending.push(UploadTask {
                file,
                status: UploadStatus::Pending,
            });
        }
    }

    /// Snapshot of the pending list, head of the queue first.
    pub fn pending(&self) -> Vec<UploadTask> {
        self.pending.lock().expect("pending mutex poisoned").clone()
    }

    /// Names of files whose upload completed without error, in completion
    /// order.
    pub fn completed(&self) -> Vec<String> {
        self.completed
            .lock()
            .expect("completed mutex poisoned")
            .clone()
    }

    /// Process the pending list sequentially.
    ///
    /// Each task is awaited to completion before the next one starts. On
    /// the first failure the batch halts: the failed task is marked
    /// `Failed` and stays pending together with everything behind it, and
    /// the error is returned after being logged. Returns the number of
    /// files uploaded by this call.
    pub async fn process_all(&self) -> Result<usize, SessionError> {
        let mut uploaded = 0;
        loop {
            let file = {
                let mut pending = self.pending.lock().expect("pending mutex poisoned");
                match pending.first_mut() {
                    Some(task) => {
                        task.status = UploadStatus::Uploading;
                        task.file.clone()
                    }
                    None => break,
                }
            };

            match self.ingest(&file).await {
                Ok(receipt) => {
                    {
                        let mut pending = self.pending.lock().expect("pending mutex poisoned");
                        pending.remove(0);
                    }
                    self.record_completed(&file.name);
                    uploaded += 1;
                    tracing::info!(
                        file = %file.name,
                        chunks_added = receipt.chunks_added,
                        total_chunks = receipt.total_chunks,
                        "Document ingested"
                    );
                }
                Err(e) => {
                    let mut pending = self.pending.lock().expect("pending mutex poisoned");
                    if let Some(task) = pending.first_mut() {
                        task.status = UploadStatus::Failed;
                    }
                    tracing::warn!(file = %file.name, error = %e, "Upload failed; halting batch");
                    return Err(e);
                }
            }
        }
        Ok(uploaded)
    }

    /// Upload a single file outside any batch.
    ///
    /// Same success/failure contract as a queue of length one: a success is
    /// recorded in the completed list, a failure is logged and returned.
    pub async fn upload_one(&self, file: &FileMeta) -> Result<IngestReceipt, SessionError> {
        match self.ingest(file).await {
            Ok(receipt) => {
                self.record_completed(&file.name);
                tracing::info!(
                    file = %file.name,
                    chunks_added = receipt.chunks_added,
                    "Document ingested"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "Upload failed");
                Err(e)
            }
        }
    }

    /// Validate the file type and delegate to the external ingestion
    /// operation.
    async fn ingest(&self, file: &FileMeta) -> Result<IngestReceipt, SessionError> {
        match file.extension() {
            Some(ext) if self.allowed_extensions.contains(&ext) => {}
            Some(ext) => {
                return Err(SessionError::Ingestion {
                    name: file.name.clone(),
                    reason: format!("unsupported file type \"{}\"", ext),
                });
            }
            None => {
                return Err(SessionError::Ingestion {
                    name: file.name.clone(),
                    reason: "file has no extension".to_string(),
                });
            }
        }

        self.backend
            .ingest(file)
            .await
            .map_err(|e| SessionError::Ingestion {
                name: file.name.clone(),
                reason: e.to_string(),
            })
    }

    fn record_completed(&self, name: &str) {
        self.completed
            .lock()
            .expect("completed mutex poisoned")
            .push(name.to_string());
    }
}

// =============================================================================
// Tests
// =============================================================================
