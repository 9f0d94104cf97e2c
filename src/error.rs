use thiserror::Error;

use crate::events::ListenerId;

// ---------------------------------------------------------------------------
// ListenerPanic
// ---------------------------------------------------------------------------

/// One listener that panicked during an isolated notification pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener {listener} panicked: {message}")]
pub struct ListenerPanic {
    pub listener: ListenerId,
    pub message: String,
}

// ---------------------------------------------------------------------------
// NotifyError
// ---------------------------------------------------------------------------

/// Every panic caught by [`ListenerCollection::notify_isolated`], in the order
/// the listeners ran.
///
/// [`ListenerCollection::notify_isolated`]: crate::events::ListenerCollection::notify_isolated
#[derive(Debug, Clone, Error)]
#[error("{} listener(s) panicked during notification", .failures.len())]
pub struct NotifyError {
    pub failures: Vec<ListenerPanic>,
}

// ---------------------------------------------------------------------------
// EmitError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("Listeners for event \"{event}\" failed: {source}")]
    Listeners {
        event: String,
        #[source]
        source: NotifyError,
    },
}

impl EmitError {
    /// The name of the event whose listeners failed.
    pub fn event(&self) -> &str {
        match self {
            Self::Listeners { event, .. } => event,
        }
    }

    /// The individual listener panics.
    pub fn failures(&self) -> &[ListenerPanic] {
        match self {
            Self::Listeners { source, .. } => &source.failures,
        }
    }
}

/// Convenience alias with the error type left to the caller.
pub type Result<T, E = EmitError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
