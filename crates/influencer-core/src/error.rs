//! Unified error handling for the publish pipeline.
//!
//! This module provides a unified error type that wraps domain and store
//! errors, with user-actionable suggestions. Port failures never surface
//! here: the orchestrator records them on the job instead.

use thiserror::Error;

use crate::application::StoreError;
use crate::domain::DomainError;

/// Root error type for influencer-core operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PipelineError {
    /// Errors from the domain layer (business rule violations).
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Job store failures, including lost compare-and-swap races.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Unexpected internal errors (bugs).
    #[error("Internal error: {message}. This is a bug, please report it.")]
    Internal { message: String },
}

impl PipelineError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Domain(e) => e.suggestions(),
            Self::Store(e) => e.suggestions(),
            Self::Internal { .. } => vec![
                "This appears to be a bug in influencer-manager".into(),
                "Please report it with the job key and the log output".into(),
            ],
        }
    }

    /// Get error category for display/styling purposes.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Domain(e) => match e.category() {
                crate::domain::ErrorCategory::Validation
                | crate::domain::ErrorCategory::InvalidState => ErrorCategory::Validation,
                crate::domain::ErrorCategory::Internal => ErrorCategory::Internal,
            },
            Self::Store(e) => e.category(),
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.category() == ErrorCategory::Transient
    }

    /// Whether another runner won a race for the same job.
    pub fn is_conflict(&self) -> bool {
        self.category() == ErrorCategory::Conflict
    }
}

/// Error categories for UI display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Transient,
    Permanent,
    Conflict,
    NotFound,
    Internal,
}

/// Convenient result type alias.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::JobState;

    #[test]
    fn store_races_are_conflicts_not_retryable() {
        let err: PipelineError = StoreError::Leased {
            job_key: "k".into(),
            holder: "runner-x".into(),
        }
        .into();
        assert!(err.is_conflict());
        assert!(!err.is_retryable());
    }

    #[test]
    fn unavailable_store_is_retryable() {
        let err: PipelineError = StoreError::Unavailable {
            reason: "lock poisoned".into(),
        }
        .into();
        assert!(err.is_retryable());
        assert!(!err.is_conflict());
    }

    #[test]
    fn illegal_store_transition_is_a_validation_error() {
        let err: PipelineError = StoreError::IllegalTransition {
            job_key: "k".into(),
            from: JobState::Published,
            to: JobState::Planned,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(!err.is_retryable());
    }

    #[test]
    fn domain_errors_keep_their_suggestions() {
        let err: PipelineError = DomainError::NotAbandonable {
            job_key: "k".into(),
            state: JobState::Published,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert!(err.suggestions().iter().any(|s| s.contains("PUBLISHED")));
    }

    #[test]
    fn not_found_maps_through() {
        let err: PipelineError = StoreError::NotFound {
            job_key: "k".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}
