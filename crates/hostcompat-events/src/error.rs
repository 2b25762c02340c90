//! Event bus error types.

use hostcompat_core::CompatError;
use thiserror::Error;

/// Errors surfaced to callers waiting on the bus.
///
/// Listener failures are never surfaced; they are logged and isolated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// No matching event arrived before the deadline.
    #[error("no {kind} event within {timeout_ms}ms")]
    Timeout {
        /// Event kind being waited for.
        kind: String,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// The waiter's listener was removed before an event arrived.
    #[error("listener removed while waiting for {kind}")]
    Closed {
        /// Event kind being waited for.
        kind: String,
    },
}

impl EventError {
    /// Returns `true` for [`EventError::Timeout`].
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<EventError> for CompatError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::Timeout { kind, timeout_ms } => Self::Timeout {
                subject: kind,
                timeout_ms,
            },
            EventError::Closed { kind } => Self::ProbeFailure {
                subject: kind,
                reason: "listener removed before an event arrived".to_string(),
            },
        }
    }
}

/// Result type for event operations.
pub type EventResult<T> = Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = EventError::Timeout {
            kind: "ready".to_string(),
            timeout_ms: 250,
        };
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "no ready event within 250ms");

        let closed = EventError::Closed {
            kind: "ready".to_string(),
        };
        assert!(!closed.is_timeout());
    }

    #[test]
    fn test_timeout_converts_to_compat_error() {
        let err: CompatError = EventError::Timeout {
            kind: "context:update".to_string(),
            timeout_ms: 100,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "timed out after 100ms waiting for context:update"
        );
    }
}
