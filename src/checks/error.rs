//! Engine error types.
//!
//! - [`CheckError`]: failures surfaced to callers of the registry and of
//!   [`HealthChecks::invoke`](crate::checks::HealthChecks::invoke).
//! - [`ProcedureFault`]: failures of a single procedure run. These never
//!   escape the executor; they are folded into a DOWN status instead.

use std::time::Duration;
use thiserror::Error;

/// Errors returned by registry and invocation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// Identifier is empty where a node is required, or has empty segments.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// A procedure was registered with a zero timeout.
    #[error("invalid timeout for '{0}': must be greater than zero")]
    InvalidTimeout(String),

    /// The identifier addresses nothing in the registry.
    #[error("check '{0}' not found")]
    NotFound(String),
}

impl CheckError {
    /// Short stable label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            CheckError::InvalidIdentifier(_) => "invalid_identifier",
            CheckError::InvalidTimeout(_) => "invalid_timeout",
            CheckError::NotFound(_) => "not_found",
        }
    }
}

/// Why a procedure did not report a status of its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcedureFault {
    /// The procedure explicitly reported a failure.
    #[error("procedure failed: {0}")]
    Failed(String),

    /// The procedure panicked before completing its promise.
    #[error("procedure panicked: {0}")]
    Panicked(String),

    /// The procedure dropped its promise without completing it.
    #[error("procedure finished without reporting a status")]
    Abandoned,

    /// No completion arrived before the deadline.
    #[error("procedure timed out after {0:?}")]
    TimedOut(Duration),
}

impl ProcedureFault {
    /// Short stable label for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProcedureFault::Failed(_) => "failed",
            ProcedureFault::Panicked(_) => "panicked",
            ProcedureFault::Abandoned => "abandoned",
            ProcedureFault::TimedOut(_) => "timed_out",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        assert_eq!(CheckError::NotFound("a".into()).as_label(), "not_found");
        assert_eq!(
            ProcedureFault::TimedOut(Duration::from_millis(5)).as_label(),
            "timed_out"
        );
    }

    #[test]
    fn test_not_found_message_mentions_not_found() {
        let err = CheckError::NotFound("db.primary".into());
        assert_eq!(err.to_string(), "check 'db.primary' not found");
    }
}
