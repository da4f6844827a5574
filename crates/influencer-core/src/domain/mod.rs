// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for the publish pipeline.
//!
//! This module contains pure business logic. All generation, storage and
//! publishing concerns are reached via ports (traits) defined in the
//! application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: Domain logic is synchronous
//! - **No I/O**: No filesystem, network, or external calls
//! - **Explicit state machine**: every move checked against one table
//! - **Rich domain model**: Behavior lives in entities, not services
//!
// Public API - what the world sees
pub mod entities;
pub mod error;
pub mod state;
pub mod value_objects;

// Re-exports for convenience
pub use entities::{
    AuditEvent, AuditEventType, GeneratedImage, ImagePayload, PostPlan, PromptSpec,
    PromptSpecBuilder, PublishJob, StateTransition,
};

pub use error::{DomainError, ErrorCategory};

pub use state::{FORWARD_PATH, JobState, SideEffect, TRANSITIONS, Transition};

pub use value_objects::{ContainerId, ContainerStatus, ContentHash, JobKey, MediaId, RunnerId};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    // ========================================================================
    // Cross-entity Tests
    // ========================================================================

    fn plan() -> PostPlan {
        let prompt = PromptSpec::builder("studio portrait, soft light")
            .aspect_ratio("4:5")
            .build()
            .unwrap();
        PostPlan::new("New drop", prompt).with_hashtags(["studio"])
    }

    #[test]
    fn job_created_from_plan_carries_its_key() {
        let plan = plan();
        let job = PublishJob::new(plan.job_key(), plan.clone(), Utc::now());
        assert_eq!(job.job_key, plan.job_key());
        assert_eq!(job.plan, plan);
    }

    #[test]
    fn every_non_planned_state_needs_some_record() {
        for state in FORWARD_PATH.iter().skip(1) {
            if *state != JobState::ContainerReady {
                assert!(state.requires().is_some(), "{state}");
            }
        }
        assert_eq!(JobState::Planned.requires(), None);
    }

    #[test]
    fn domain_errors_categorize() {
        let err = DomainError::InvalidTransition {
            from: JobState::Planned,
            to: JobState::Published,
        };
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert!(!err.suggestions().is_empty());

        let err = DomainError::NotAbandonable {
            job_key: "k".into(),
            state: JobState::Stored,
        };
        assert_eq!(err.category(), ErrorCategory::InvalidState);
        assert_eq!(
            DomainError::InvalidPlan("x".into()).category(),
            ErrorCategory::Validation
        );
    }
}
