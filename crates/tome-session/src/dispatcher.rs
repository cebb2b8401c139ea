//! Query dispatch with optimistic append and single-flight guarding.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tome_client::{ClientError, DocumentBackend, QueryOutcome};
use tome_core::types::Message;

use crate::conversation::ConversationStore;
use crate::error::SessionError;

/// Assistant text when the backend answers but supplies no answer field.
pub const NO_ANSWER_TEXT: &str = "No answer found.";

/// Assistant text when the query operation fails outright.
pub const QUERY_FAILED_TEXT: &str = "Sorry, something went wrong. Please try again.";

/// Dispatches user questions to the backend and reconciles the results
/// into the conversation log.
///
/// A query failure is absorbed here: from the conversation's perspective it
/// looks like a low-quality answer, never a crash. At most one dispatch is
/// in flight at a time; a second `send` is rejected rather than queued.
pub struct QueryDispatcher {
    conversation: Arc<ConversationStore>,
    backend: Arc<dyn DocumentBackend>,
    /// Single-flight guard. Held from acceptance to resolution.
    in_flight: AtomicBool,
    /// Observable loading flag: true strictly between dispatch start and
    /// resolution, false otherwise.
    loading: AtomicBool,
    /// Dispatch generation. A resolution whose generation is stale is
    /// discarded instead of applied to the log.
    generation: AtomicU64,
}

impl QueryDispatcher {
    /// Create a dispatcher writing into the given conversation.
    pub fn new(conversation: Arc<ConversationStore>, backend: Arc<dyn DocumentBackend>) -> Self {
        Self {
            conversation,
            backend,
            in_flight: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a dispatch is currently outstanding.
    pub fn loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Dispatch a user question.
    ///
    /// Appends the trimmed user message before any network interaction,
    /// invokes the backend, then appends exactly one assistant message
    /// (answer or fixed error text) and clears the loading flag. On every
    /// accepted call the conversation grows by exactly two messages.
    ///
    /// Returns `EmptyMessage` for blank input and `QueryInFlight` while a
    /// previous dispatch is outstanding; neither touches any state.
    pub async fn send(&self, text: &str) -> Result<Message, SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SessionError::QueryInFlight)?;

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        // Optimistic append: the user's own message is visible before the
        // network call resolves, regardless of latency.
        self.conversation.push(Message::user(trimmed));
        self.loading.store(true, Ordering::SeqCst);

        let outcome = self.backend.query(trimmed).await;
        let assistant = Self::build_assistant(outcome);
        self.resolve(generation, assistant.clone());

        self.in_flight.store(false, Ordering::SeqCst);
        Ok(assistant)
    }

    /// Fold a query outcome into an assistant message, applying defaults.
    fn build_assistant(outcome: Result<QueryOutcome, ClientError>) -> Message {
        match outcome {
            Ok(outcome) => Message::assistant(
                outcome
                    .answer
                    .unwrap_or_else(|| NO_ANSWER_TEXT.to_string()),
                outcome.sources.unwrap_or_default(),
                outcome.confidence,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Query failed; folding error into conversation");
                Message::assistant(QUERY_FAILED_TEXT, Vec::new(), None)
            }
        }
    }

    /// Apply a dispatch resolution unless it has been superseded.
    ///
    /// The assistant append strictly precedes clearing the loading flag. A
    /// stale resolution leaves both the log and the flag to the dispatch
    /// that superseded it.
    fn resolve(&self, generation: u64, assistant: Message) -> bool {
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::warn!(generation, "Discarding stale query resolution");
            return false;
        }
        self.conversation.push(assistant);
        self.loading.store(false, Ordering::SeqCst);
        true
    }
}

// =============================================================================
// Tests
// =============================================================================
