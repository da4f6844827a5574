// ============================================================================
// domain/error.rs - DOMAIN RULE VIOLATIONS
// ============================================================================

use thiserror::Error;

use crate::domain::state::{JobState, SideEffect};

/// Root domain error type.
///
/// All errors are:
/// - Cloneable (they are recorded on jobs and audit events)
/// - Categorizable (for CLI display)
/// - Actionable (provides suggestions)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    #[error("Invalid prompt: {0}")]
    InvalidPrompt(String),

    #[error("Invalid post plan: {0}")]
    InvalidPlan(String),

    #[error("Invalid generated image: {0}")]
    InvalidImage(String),

    #[error("Invalid job key '{key}': {reason}")]
    InvalidJobKey { key: String, reason: String },

    #[error("Unknown job state: {0}")]
    UnknownState(String),

    #[error("Required field missing: {field}")]
    MissingRequiredField { field: &'static str },

    // ========================================================================
    // State Machine Violations
    // ========================================================================
    #[error("illegal transition {from} -> {to}")]
    InvalidTransition { from: JobState, to: JobState },

    #[error("cannot enter {state}: {effect} has not happened")]
    MissingSideEffect { state: JobState, effect: SideEffect },

    #[error("job '{job_key}' cannot be abandoned in state {state}")]
    NotAbandonable { job_key: String, state: JobState },
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidPlan(msg) => vec![
                "Check the caption template and hashtags".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidPrompt(msg) => vec![
                "Prompts need non-empty text and an aspect ratio like 4:5".into(),
                format!("Details: {}", msg),
            ],
            Self::InvalidJobKey { .. } => vec![
                "Job keys use letters, digits, '.', '_', ':', '/' and '-'".into(),
                "Omit the key to derive one from the plan content".into(),
            ],
            Self::InvalidTransition { .. } | Self::MissingSideEffect { .. } => vec![
                "The job record is inconsistent with its state".into(),
                "This is a bug in the orchestrator, please report it".into(),
            ],
            Self::NotAbandonable { state, .. } => vec![
                format!("The job is {}", state),
                "Only PLANNED or FAILED_RETRYABLE jobs can be abandoned".into(),
            ],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTransition { .. } | Self::MissingSideEffect { .. } => {
                ErrorCategory::Internal
            }
            Self::NotAbandonable { .. } => ErrorCategory::InvalidState,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    InvalidState,
    Internal,
}
