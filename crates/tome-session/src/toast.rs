//! Timed upload status indicator.
//!
//! Enforces valid state transitions for the toast lifecycle:
//! - Idle -> Uploading (upload start)
//! - Uploading -> Succeeded(name) (upload success)
//! - Uploading -> Idle (upload failure; no failure toast is shown)
//! - Succeeded(name) -> Idle (timed auto-dismiss)
//! - Succeeded(name) -> Uploading (new upload before the dismiss fires)

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::SessionError;

/// Visible state of the upload status indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToastState {
    /// Nothing shown.
    Idle,
    /// An upload is in progress.
    Uploading,
    /// The named file finished uploading; auto-dismisses after a delay.
    Succeeded(String),
}

impl fmt::Display for ToastState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToastState::Idle => write!(f, "idle"),
            ToastState::Uploading => write!(f, "uploading"),
            ToastState::Succeeded(name) => write!(f, "succeeded({})", name),
        }
    }
}

impl ToastState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &ToastState) -> bool {
        matches!(
            (self, target),
            (ToastState::Idle, ToastState::Uploading)
                | (ToastState::Uploading, ToastState::Succeeded(_))
                | (ToastState::Uploading, ToastState::Idle)
                | (ToastState::Succeeded(_), ToastState::Idle)
                | (ToastState::Succeeded(_), ToastState::Uploading)
        )
    }
}

#[derive(Debug)]
struct Inner {
    state: ToastState,
    /// Bumped on every transition. A scheduled dismiss only fires if the
    /// epoch it captured is still current, so a stale timer can never
    /// clobber a newer state.
    epoch: u64,
}

/// Thread-safe toast state machine with a cancellable auto-dismiss.
///
/// Cloning shares the underlying state. Transitions are validated before
/// being applied; the success state schedules its own reversion to `Idle`.
#[derive(Debug, Clone)]
pub struct Toaster {
    inner: Arc<Mutex<Inner>>,
    dismiss: Duration,
}

impl Toaster {
    /// Create a toaster in `Idle` with the given auto-dismiss delay.
    pub fn new(dismiss: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: ToastState::Idle,
                epoch: 0,
            })),
            dismiss,
        }
    }

    /// Returns the current state.
    pub fn current(&self) -> ToastState {
        self.inner
            .lock()
            .expect("toast mutex poisoned")
            .state
            .clone()
    }

    /// Upload started.
    pub fn begin_upload(&self) -> Result<(), SessionError> {
        self.transition(ToastState::Uploading)?;
        Ok(())
    }

    /// Upload failed. Reverts straight to `Idle`; no failure toast.
    pub fn fail(&self) -> Result<(), SessionError> {
        self.transition(ToastState::Idle)?;
        Ok(())
    }

    /// Upload of `name` succeeded. Schedules the auto-dismiss.
    ///
    /// Must be called from within a tokio runtime.
    pub fn succeed(&self, name: &str) -> Result<(), SessionError> {
        let epoch = self.transition(ToastState::Succeeded(name.to_string()))?;

        let inner = Arc::clone(&self.inner);
        let dismiss = self.dismiss;
        tokio::spawn(async move {
            tokio::time::sleep(dismiss).await;
            let mut guard = inner.lock().expect("toast mutex poisoned");
            if guard.epoch == epoch {
                tracing::debug!("Toast state: {} -> idle (auto-dismiss)", guard.state);
                guard.state = ToastState::Idle;
                guard.epoch += 1;
            }
        });

        Ok(())
    }

    /// Apply a validated transition and return the new epoch.
    fn transition(&self, target: ToastState) -> Result<u64, SessionError> {
        let mut guard = self.inner.lock().expect("toast mutex poisoned");
        if !guard.state.can_transition_to(&target) {
            return Err(SessionError::ToastTransition {
                from: guard.state.to_string(),
                to: target.to_string(),
            });
        }
        tracing::debug!("Toast state: {} -> {}", guard.state, target);
        guard.state = target;
        guard.epoch += 1;
        Ok(guard.epoch)
    }
}

// =============================================================================
// Tests
// =============================================================================
