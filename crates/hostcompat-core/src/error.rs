//! Error types for host probing and capability negotiation.
//!
//! Almost none of these reach callers. Probe and action failures are caught
//! where they happen, logged, and turned into a negative answer. They exist
//! so that the diagnostics carry a consistent shape.

use std::any::Any;

use thiserror::Error;

/// Failure of a single call into the host embedding surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host does not expose this member at all.
    #[error("host does not expose {member}")]
    Absent {
        /// Name of the missing host member.
        member: &'static str,
    },

    /// The host exposes the member but calling it failed.
    #[error("host call {member} failed: {reason}")]
    Probe {
        /// Name of the host member that failed.
        member: &'static str,
        /// Failure description reported by the host.
        reason: String,
    },
}

impl HostError {
    /// Build an [`HostError::Absent`] error.
    #[must_use]
    pub const fn absent(member: &'static str) -> Self {
        Self::Absent { member }
    }

    /// Build an [`HostError::Probe`] error.
    #[must_use]
    pub fn probe(member: &'static str, reason: impl Into<String>) -> Self {
        Self::Probe {
            member,
            reason: reason.into(),
        }
    }

    /// Returns `true` if the host simply lacks the member.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent { .. })
    }
}

/// Result type for host calls.
pub type HostResult<T> = Result<T, HostError>;

/// Errors raised while negotiating capabilities and features.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompatError {
    /// A capability or version probe failed or was missing.
    #[error("probe for {subject} failed: {reason}")]
    ProbeFailure {
        /// What was being probed (capability name, "embedding", ...).
        subject: String,
        /// Why the probe failed.
        reason: String,
    },

    /// The caller asked about a name that is not registered.
    #[error("unknown {kind}: {name}")]
    UnknownIdentifier {
        /// Identifier family ("capability", "feature").
        kind: &'static str,
        /// The unrecognized name.
        name: String,
    },

    /// A primary, polyfill, or fallback action failed while running.
    #[error("{strategy} action for {feature} failed: {reason}")]
    ActionFailure {
        /// Feature the action was serving.
        feature: String,
        /// Strategy that failed ("native", "polyfill", "fallback").
        strategy: String,
        /// Failure description.
        reason: String,
    },

    /// A wait for an event exceeded its deadline.
    #[error("timed out after {timeout_ms}ms waiting for {subject}")]
    Timeout {
        /// What was being waited for.
        subject: String,
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// A host call failed.
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Result type for negotiation operations.
pub type CompatResult<T> = Result<T, CompatError>;

/// Render a caught panic payload for diagnostics.
///
/// Shared by every place that isolates listener, action, or polyfill panics.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message() {
        let payload = std::panic::catch_unwind(|| panic!("bridge gone")).unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "panicked: bridge gone");

        let owned = std::panic::catch_unwind(|| panic!("code {}", 7)).unwrap_err();
        assert_eq!(panic_message(owned.as_ref()), "panicked: code 7");

        let opaque = std::panic::catch_unwind(|| std::panic::panic_any(42_u8)).unwrap_err();
        assert_eq!(panic_message(opaque.as_ref()), "panicked");
    }

    #[test]
    fn test_error_display() {
        let err = CompatError::UnknownIdentifier {
            kind: "feature",
            name: "teleport".to_string(),
        };
        assert_eq!(err.to_string(), "unknown feature: teleport");

        let err = CompatError::ActionFailure {
            feature: "share-url".to_string(),
            strategy: "native".to_string(),
            reason: "host rejected".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "native action for share-url failed: host rejected"
        );
    }

    #[test]
    fn test_host_error() {
        let absent = HostError::absent("query_capability");
        assert!(absent.is_absent());
        assert_eq!(absent.to_string(), "host does not expose query_capability");

        let probe = HostError::probe("context", "bridge closed");
        assert!(!probe.is_absent());

        let wrapped: CompatError = probe.into();
        assert_eq!(wrapped.to_string(), "host call context failed: bridge closed");
    }
}
