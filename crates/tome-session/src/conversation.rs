//! Append-only conversation log.

use std::sync::Mutex;

use tome_core::types::Message;

/// The ordered log of conversation messages plus nothing else.
///
/// The store has exactly one writer (the dispatcher) and many snapshot
/// readers. Messages are append-only for the lifetime of the session:
/// never mutated, never deleted, insertion order is chronological.
pub struct ConversationStore {
    messages: Mutex<Vec<Message>>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore {
    /// Create an empty conversation.
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Append a message to the end of the log.
    pub fn push(&self, message: Message) {
        let mut messages = self.messages.lock().expect("conversation mutex poisoned");
        messages.push(message);
    }

    /// Number of messages appended so far.
    pub fn len(&self) -> usize {
        self.messages
            .lock()
            .expect("conversation mutex poisoned")
            .len()
    }

    /// Whether the conversation is still empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cloned snapshot of the full log, safe to hold while the store grows.
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages
            .lock()
            .expect("conversation mutex poisoned")
            .clone()
    }
}
