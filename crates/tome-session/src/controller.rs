//! The addressable session controller.
//!
//! One object owns the conversation log, the query dispatcher, the upload
//! queue, and the toast indicator, and exposes commands plus a single
//! observable state snapshot. Presentation and orchestration stay decoupled:
//! the UI forwards triggers and renders snapshots, nothing more.

use std::sync::Arc;
use std::time::Duration;

use tome_client::{BackendHealth, DocumentBackend, IngestReceipt};
use tome_core::config::TomeConfig;
use tome_core::types::{FileMeta, Message};

use crate::conversation::ConversationStore;
use crate::dispatcher::QueryDispatcher;
use crate::error::SessionError;
use crate::toast::{ToastState, Toaster};
use crate::uploads::{UploadQueue, UploadTask};

/// Everything the presentation layer renders, captured at one instant.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    /// Conversation messages, oldest first.
    pub messages: Vec<Message>,
    /// True while a query dispatch is outstanding.
    pub loading: bool,
    /// Upload status indicator.
    pub toast: ToastState,
    /// Uploads not yet completed, head of the queue first.
    pub pending_uploads: Vec<UploadTask>,
    /// Files uploaded without error, in completion order.
    pub completed_uploads: Vec<String>,
}

/// Central coordinator for the chat and upload pipelines.
///
/// The two pipelines are independent: queries append to the conversation,
/// uploads drive the queue and the toast, and neither interleaves with the
/// other's effects.
pub struct SessionController {
    conversation: Arc<ConversationStore>,
    dispatcher: QueryDispatcher,
    uploads: UploadQueue,
    toaster: Toaster,
    backend: Arc<dyn DocumentBackend>,
}

impl SessionController {
    /// Create a controller over the given backend.
    pub fn new(backend: Arc<dyn DocumentBackend>, config: &TomeConfig) -> Self {
        let conversation = Arc::new(ConversationStore::new());
        Self {
            dispatcher: QueryDispatcher::new(Arc::clone(&conversation), Arc::clone(&backend)),
            uploads: UploadQueue::new(Arc::clone(&backend), &config.upload),
            toaster: Toaster::new(Duration::from_millis(config.toast.dismiss_ms)),
            conversation,
            backend,
        }
    }

    /// Dispatch a user question. See [`QueryDispatcher::send`].
    pub async fn send(&self, text: &str) -> Result<Message, SessionError> {
        self.dispatcher.send(text).await
    }

    /// Upload a single file, driving the toast indicator.
    ///
    /// The toast moves `idle -> uploading`, then to `succeeded(name)` or
    /// back to `idle` on failure. The conversation is never touched.
    pub async fn upload(&self, file: &FileMeta) -> Result<IngestReceipt, SessionError> {
        self.toaster.begin_upload()?;
        match self.uploads.upload_one(file).await {
            Ok(receipt) => {
                self.toaster.succeed(&file.name)?;
                Ok(receipt)
            }
            Err(e) => {
                self.toaster.fail()?;
                Err(e)
            }
        }
    }

    /// Queue files for a later batch upload.
    pub fn enqueue(&self, files: Vec<FileMeta>) {
        self.uploads.enqueue(files);
    }

    /// Process all queued uploads sequentially. See
    /// [`UploadQueue::process_all`].
    pub async fn process_batch(&self) -> Result<usize, SessionError> {
        self.uploads.process_all().await
    }

    /// Probe the backend for liveness and corpus size.
    pub async fn backend_health(&self) -> Result<BackendHealth, SessionError> {
        Ok(self.backend.health().await?)
    }

    /// Capture the observable state at one instant.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            messages: self.conversation.snapshot(),
            loading: self.dispatcher.loading(),
            toast: self.toaster.current(),
            pending_uploads: self.uploads.pending(),
            completed_uploads: self.uploads.completed(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{NO_ANSWER_TEXT, QUERY_FAILED_TEXT};
    use crate::testing::{file, ScriptedBackend};
    use tome_client::ClientError;
    use tome_core::types::{Role, UploadStatus};

    fn test_config() -> TomeConfig {
        let mut config = TomeConfig::default();
        // Short dismiss so toast tests run on real timers.
        config.toast.dismiss_ms = 40;
        config
    }

    fn controller_with(backend: Arc<ScriptedBackend>) -> SessionController {
        SessionController::new(backend, &test_config())
    }

    /// Spin until the backend has observed at least `n` calls.
    async fn wait_for_calls(backend: &ScriptedBackend, n: usize) {
        for _ in 0..200 {
            if backend.calls().len() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("backend never observed {} calls", n);
    }

    // ---- send: validation ----

    #[tokio::test]
    async fn test_send_blank_input_leaves_state_untouched() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(Arc::clone(&backend));

        assert!(matches!(
            controller.send("").await,
            Err(SessionError::EmptyMessage)
        ));
        assert!(matches!(
            controller.send("   ").await,
            Err(SessionError::EmptyMessage)
        ));

        let snapshot = controller.snapshot();
        assert!(snapshot.messages.is_empty());
        assert!(!snapshot.loading);
        assert_eq!(snapshot.toast, ToastState::Idle);
        assert!(backend.calls().is_empty());
    }

    // ---- send: success ----

    #[tokio::test]
    async fn test_send_success_grows_conversation_by_two() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_query(Ok(ScriptedBackend::answer(
            "30 days",
            &["policy.pdf"],
            Some(0.92),
        )));
        let controller = controller_with(backend);

        let before = controller.snapshot().messages.len();
        controller.send("What is the refund policy?").await.unwrap();

        let messages = controller.snapshot().messages;
        assert_eq!(messages.len(), before + 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "What is the refund policy?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "30 days");
        assert_eq!(messages[1].sources, vec!["policy.pdf"]);
        assert_eq!(messages[1].confidence, Some(0.92));
    }

    #[tokio::test]
    async fn test_send_sources_default_to_empty_when_omitted() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_query(Ok(tome_client::QueryOutcome {
            answer: Some("yes".to_string()),
            sources: None,
            confidence: None,
        }));
        let controller = controller_with(backend);

        let assistant = controller.send("is it?").await.unwrap();
        assert!(assistant.sources.is_empty());
        assert!(assistant.confidence.is_none());
    }

    #[tokio::test]
    async fn test_send_missing_answer_uses_placeholder() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(backend);

        let assistant = controller.send("anything").await.unwrap();
        assert_eq!(assistant.content, NO_ANSWER_TEXT);
    }

    // ---- send: failure ----

    #[tokio::test]
    async fn test_send_failure_grows_conversation_by_two() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_query(Err(ClientError::Status(500)));
        let controller = controller_with(backend);

        let before = controller.snapshot().messages.len();
        let assistant = controller.send("doomed question").await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), before + 2);
        assert_eq!(assistant.content, QUERY_FAILED_TEXT);
        assert!(assistant.sources.is_empty());
        assert!(assistant.confidence.is_none());
        assert!(!snapshot.loading);
    }

    // ---- send: loading interval ----

    #[tokio::test]
    async fn test_loading_spans_dispatch_to_resolution() {
        let backend = Arc::new(ScriptedBackend::new());
        let gate = Arc::new(tokio::sync::Notify::new());
        backend.gate_queries(Arc::clone(&gate));
        let controller = Arc::new(controller_with(Arc::clone(&backend)));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.send("slow question").await })
        };
        wait_for_calls(&backend, 1).await;

        // In flight: user message visible, loading set, no answer yet.
        let snapshot = controller.snapshot();
        assert!(snapshot.loading);
        assert_eq!(snapshot.messages.len(), 1);
        assert_eq!(snapshot.messages[0].role, Role::User);

        gate.notify_one();
        task.await.unwrap().unwrap();

        let snapshot = controller.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.messages.len(), 2);
    }

    // ---- send: single-flight ----

    #[tokio::test]
    async fn test_second_send_is_rejected_while_in_flight() {
        let backend = Arc::new(ScriptedBackend::new());
        let gate = Arc::new(tokio::sync::Notify::new());
        backend.gate_queries(Arc::clone(&gate));
        let controller = Arc::new(controller_with(Arc::clone(&backend)));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.send("first").await })
        };
        wait_for_calls(&backend, 1).await;

        let rejected = controller.send("second").await;
        assert!(matches!(rejected, Err(SessionError::QueryInFlight)));
        // The rejected send left no trace.
        assert_eq!(controller.snapshot().messages.len(), 1);

        gate.notify_one();
        task.await.unwrap().unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(backend.calls(), vec!["query:first"]);

        // The guard releases once the dispatch resolves. Pre-arm the gate
        // so the third query passes straight through.
        gate.notify_one();
        controller.send("third").await.unwrap();
        assert_eq!(controller.snapshot().messages.len(), 4);
    }

    // ---- uploads: single file with toast ----

    #[tokio::test]
    async fn test_single_upload_walks_toast_through_success() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(backend);

        let receipt = controller.upload(&file("report.pdf")).await.unwrap();
        assert_eq!(receipt.filename, "report.pdf");

        let snapshot = controller.snapshot();
        assert_eq!(
            snapshot.toast,
            ToastState::Succeeded("report.pdf".to_string())
        );
        assert_eq!(snapshot.completed_uploads, vec!["report.pdf"]);

        // Auto-dismiss after the configured interval.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(controller.snapshot().toast, ToastState::Idle);
    }

    #[tokio::test]
    async fn test_failed_upload_reverts_toast_to_idle() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_ingest(Err(ClientError::Status(500)));
        let controller = controller_with(backend);

        let result = controller.upload(&file("broken.pdf")).await;
        assert!(matches!(result, Err(SessionError::Ingestion { .. })));

        let snapshot = controller.snapshot();
        // No failure toast is shown; the indicator just resets.
        assert_eq!(snapshot.toast, ToastState::Idle);
        assert!(snapshot.completed_uploads.is_empty());
        // Upload failures never become conversation messages.
        assert!(snapshot.messages.is_empty());
    }

    // ---- uploads: batch ----

    #[tokio::test]
    async fn test_batch_success_then_failure_scenario() {
        let backend = Arc::new(ScriptedBackend::new());
        backend.push_ingest(Ok(ScriptedBackend::receipt("report.pdf")));
        backend.push_ingest(Err(ClientError::Status(500)));
        let controller = controller_with(backend);

        controller.enqueue(vec![file("report.pdf"), file("notes.txt")]);
        assert!(controller.process_batch().await.is_err());

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.completed_uploads, vec!["report.pdf"]);
        assert_eq!(snapshot.pending_uploads.len(), 1);
        assert_eq!(snapshot.pending_uploads[0].file.name, "notes.txt");
        assert_eq!(snapshot.pending_uploads[0].status, UploadStatus::Failed);
    }

    #[tokio::test]
    async fn test_batch_does_not_touch_conversation_or_toast() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(backend);

        controller.enqueue(vec![file("a.pdf"), file("b.csv")]);
        controller.process_batch().await.unwrap();

        let snapshot = controller.snapshot();
        assert!(snapshot.messages.is_empty());
        assert_eq!(snapshot.toast, ToastState::Idle);
        assert_eq!(snapshot.completed_uploads, vec!["a.pdf", "b.csv"]);
    }

    // ---- pipelines stay independent ----

    #[tokio::test]
    async fn test_upload_during_query_does_not_interleave_messages() {
        let backend = Arc::new(ScriptedBackend::new());
        let gate = Arc::new(tokio::sync::Notify::new());
        backend.gate_queries(Arc::clone(&gate));
        let controller = Arc::new(controller_with(Arc::clone(&backend)));

        let task = {
            let controller = Arc::clone(&controller);
            tokio::spawn(async move { controller.send("question").await })
        };
        wait_for_calls(&backend, 1).await;

        // An upload while the query is in flight.
        controller.upload(&file("mid.pdf")).await.unwrap();

        gate.notify_one();
        task.await.unwrap().unwrap();

        let snapshot = controller.snapshot();
        // Conversation only ever holds the query pair.
        assert_eq!(snapshot.messages.len(), 2);
        assert_eq!(snapshot.completed_uploads, vec!["mid.pdf"]);
    }

    // ---- health ----

    #[tokio::test]
    async fn test_backend_health_passthrough() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(Arc::clone(&backend));

        let health = controller.backend_health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(backend.calls(), vec!["health"]);
    }

    // ---- snapshot ----

    #[tokio::test]
    async fn test_snapshot_captures_all_observable_state() {
        let backend = Arc::new(ScriptedBackend::new());
        let controller = controller_with(backend);

        controller.send("hello").await.unwrap();
        controller.enqueue(vec![file("queued.pdf")]);
        controller.upload(&file("done.csv")).await.unwrap();

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.messages.len(), 2);
        assert!(!snapshot.loading);
        assert_eq!(snapshot.toast, ToastState::Succeeded("done.csv".to_string()));
        assert_eq!(snapshot.pending_uploads.len(), 1);
        assert_eq!(snapshot.pending_uploads[0].status, UploadStatus::Pending);
        assert_eq!(snapshot.completed_uploads, vec!["done.csv"]);
    }
}
