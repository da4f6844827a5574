//! Application layer errors.
//!
//! These errors represent failures at the ports, not business logic.
//! Business logic errors are `DomainError` from `crate::domain`.

use thiserror::Error;

use crate::domain::JobState;
use crate::error::ErrorCategory;

/// Failure reported by an external collaborator.
///
/// The adapter decides the kind; only the orchestrator decides what to do
/// with it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortError {
    /// Timeout, rate limit, 5xx or similar; worth retrying.
    #[error("transient failure: {0}")]
    Transient(String),

    /// Invalid input, auth failure, 4xx or similar; retrying will not help.
    #[error("permanent failure: {0}")]
    Permanent(String),
}

impl PortError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent(message.into())
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transient(m) | Self::Permanent(m) => m,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transient(_) => ErrorCategory::Transient,
            Self::Permanent(_) => ErrorCategory::Permanent,
        }
    }
}

/// Errors raised by a [`JobStore`](crate::application::ports::JobStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Compare-and-swap lost: the stored state was not the expected one.
    #[error("job '{job_key}' changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        job_key: String,
        expected: JobState,
        actual: JobState,
    },

    /// The write would move the job along an edge the transition table lacks.
    #[error("job '{job_key}' cannot move from {from} to {to}")]
    IllegalTransition {
        job_key: String,
        from: JobState,
        to: JobState,
    },

    /// Another live runner holds the job's lease.
    #[error("job '{job_key}' is being processed by {holder}")]
    Leased { job_key: String, holder: String },

    #[error("job '{job_key}' already exists")]
    AlreadyExists { job_key: String },

    #[error("job '{job_key}' not found")]
    NotFound { job_key: String },

    /// Backing storage failed (lock poisoned, I/O, etc.).
    #[error("job store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl StoreError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Conflict { .. } | Self::Leased { .. } => vec![
                "Another runner is processing this job".into(),
                "Check its status later instead of starting a second run".into(),
            ],
            Self::NotFound { job_key } => vec![
                format!("No job recorded under '{}'", job_key),
                "Submit the plan with run to create it".into(),
            ],
            Self::Unavailable { .. } => vec![
                "The job store could not be reached".into(),
                "Try again in a moment".into(),
            ],
            Self::AlreadyExists { .. } => vec!["Use the existing job instead".into()],
            Self::IllegalTransition { from, .. } => vec![
                format!("Allowed moves from {from}: {:?}", from.allowed_next()),
                "Change job state through PublishJob::advance only".into(),
            ],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Conflict { .. } | Self::Leased { .. } | Self::AlreadyExists { .. } => {
                ErrorCategory::Conflict
            }
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::IllegalTransition { .. } => ErrorCategory::Validation,
            Self::Unavailable { .. } => ErrorCategory::Transient,
        }
    }
}
