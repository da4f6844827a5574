//! Publish-job state machine.
//!
//! The allowed moves live in one table, [`TRANSITIONS`]. A [`Transition`] can
//! only be built by checking that table, so code holding a `Transition` holds
//! a legal move.
//!
//! ```text
//! PLANNED -> GENERATED -> STORED -> CONTAINER_CREATED -> CONTAINER_READY -> PUBLISHED
//!    \           \           \              \                  \
//!     +-----------+-----------+--------------+------------------+--> FAILED_RETRYABLE
//!     +-----------+-----------+--------------+------------------+--> FAILED_TERMINAL
//!
//! FAILED_RETRYABLE -> <last completed state>   (retry resume)
//! FAILED_RETRYABLE -> FAILED_TERMINAL          (retry budget exhausted / abandoned)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Lifecycle state of a [`PublishJob`](crate::domain::PublishJob).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Job created, no generation attempted.
    Planned,
    /// Image produced by the generator, not yet stored.
    Generated,
    /// Image persisted to the asset store, public URL available.
    Stored,
    /// Remote media container created, not yet verified ready.
    ContainerCreated,
    /// Remote container confirmed ready to publish.
    ContainerReady,
    /// Terminal success.
    Published,
    /// Transient failure; eligible for retry from the last completed state.
    FailedRetryable,
    /// Terminal failure.
    FailedTerminal,
}

/// Forward path, in order.
pub const FORWARD_PATH: [JobState; 6] = [
    JobState::Planned,
    JobState::Generated,
    JobState::Stored,
    JobState::ContainerCreated,
    JobState::ContainerReady,
    JobState::Published,
];

/// Explicit transition table: state -> allowed next states.
///
/// `FailedRetryable` lists every resumable state; the job's own
/// `last_completed` narrows that to one at runtime.
pub const TRANSITIONS: [(JobState, &[JobState]); 8] = [
    (
        JobState::Planned,
        &[JobState::Generated, JobState::FailedRetryable, JobState::FailedTerminal],
    ),
    (
        JobState::Generated,
        &[JobState::Stored, JobState::FailedRetryable, JobState::FailedTerminal],
    ),
    (
        JobState::Stored,
        &[JobState::ContainerCreated, JobState::FailedRetryable, JobState::FailedTerminal],
    ),
    (
        JobState::ContainerCreated,
        &[JobState::ContainerReady, JobState::FailedRetryable, JobState::FailedTerminal],
    ),
    (
        JobState::ContainerReady,
        &[JobState::Published, JobState::FailedRetryable, JobState::FailedTerminal],
    ),
    (JobState::Published, &[]),
    (
        JobState::FailedRetryable,
        &[
            JobState::Planned,
            JobState::Generated,
            JobState::Stored,
            JobState::ContainerCreated,
            JobState::ContainerReady,
            JobState::FailedTerminal,
        ],
    ),
    (JobState::FailedTerminal, &[]),
];

impl JobState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "PLANNED",
            Self::Generated => "GENERATED",
            Self::Stored => "STORED",
            Self::ContainerCreated => "CONTAINER_CREATED",
            Self::ContainerReady => "CONTAINER_READY",
            Self::Published => "PUBLISHED",
            Self::FailedRetryable => "FAILED_RETRYABLE",
            Self::FailedTerminal => "FAILED_TERMINAL",
        }
    }

    /// Is this a terminal state (no further transitions)?
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Published | Self::FailedTerminal)
    }

    pub const fn is_failure(self) -> bool {
        matches!(self, Self::FailedRetryable | Self::FailedTerminal)
    }

    /// Can a retry resume into this state?
    pub const fn is_resumable(self) -> bool {
        !self.is_terminal() && !self.is_failure()
    }

    /// Allowed next states according to [`TRANSITIONS`].
    pub fn allowed_next(self) -> &'static [JobState] {
        TRANSITIONS
            .iter()
            .find(|(from, _)| *from == self)
            .map(|(_, to)| *to)
            .unwrap_or(&[])
    }

    pub fn can_transition_to(self, next: JobState) -> bool {
        self.allowed_next().contains(&next)
    }

    /// The forward successor, if any.
    pub fn successor(self) -> Option<JobState> {
        let idx = FORWARD_PATH.iter().position(|s| *s == self)?;
        FORWARD_PATH.get(idx + 1).copied()
    }

    /// Position on the forward path; failure states have none.
    pub fn progress(self) -> Option<usize> {
        FORWARD_PATH.iter().position(|s| *s == self)
    }

    /// Side effect that must have happened before entering this state.
    pub const fn requires(self) -> Option<SideEffect> {
        match self {
            Self::Planned | Self::ContainerReady => None,
            Self::Generated => Some(SideEffect::ImageGenerated),
            Self::Stored => Some(SideEffect::AssetStored),
            Self::ContainerCreated => Some(SideEffect::ContainerCreated),
            Self::Published => Some(SideEffect::MediaPublished),
            Self::FailedRetryable | Self::FailedTerminal => Some(SideEffect::FailureRecorded),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PLANNED" => Ok(Self::Planned),
            "GENERATED" => Ok(Self::Generated),
            "STORED" => Ok(Self::Stored),
            "CONTAINER_CREATED" => Ok(Self::ContainerCreated),
            "CONTAINER_READY" => Ok(Self::ContainerReady),
            "PUBLISHED" => Ok(Self::Published),
            "FAILED_RETRYABLE" => Ok(Self::FailedRetryable),
            "FAILED_TERMINAL" => Ok(Self::FailedTerminal),
            other => Err(DomainError::UnknownState(other.to_string())),
        }
    }
}

/// Record a job must carry before it may enter a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideEffect {
    ImageGenerated,
    AssetStored,
    ContainerCreated,
    MediaPublished,
    FailureRecorded,
}

impl fmt::Display for SideEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ImageGenerated => "image generation",
            Self::AssetStored => "asset upload",
            Self::ContainerCreated => "container creation",
            Self::MediaPublished => "media publication",
            Self::FailureRecorded => "failure reason",
        };
        f.write_str(s)
    }
}

/// A checked move between two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    from: JobState,
    to: JobState,
}

impl Transition {
    /// Build a transition if the table allows it.
    pub fn new(from: JobState, to: JobState) -> Result<Self, DomainError> {
        if from.can_transition_to(to) {
            Ok(Self { from, to })
        } else {
            Err(DomainError::InvalidTransition { from, to })
        }
    }

    pub fn from(&self) -> JobState {
        self.from
    }

    pub fn to(&self) -> JobState {
        self.to
    }

    /// Re-entry of an already completed state through the retry path.
    pub fn is_resume(&self) -> bool {
        self.from == JobState::FailedRetryable && self.to.is_resumable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_has_a_table_row() {
        for state in FORWARD_PATH
            .iter()
            .chain(&[JobState::FailedRetryable, JobState::FailedTerminal])
        {
            assert!(TRANSITIONS.iter().any(|(from, _)| from == state), "{state}");
        }
    }

    #[test]
    fn forward_path_moves_one_step() {
        for pair in FORWARD_PATH.windows(2) {
            assert!(Transition::new(pair[0], pair[1]).is_ok());
        }
    }

    #[test]
    fn skipping_a_state_is_rejected() {
        let err = Transition::new(JobState::Planned, JobState::Stored).unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidTransition {
                from: JobState::Planned,
                to: JobState::Stored
            }
        );
        assert!(Transition::new(JobState::Generated, JobState::Published).is_err());
    }

    #[test]
    fn moving_backward_is_rejected() {
        assert!(Transition::new(JobState::Stored, JobState::Generated).is_err());
        assert!(Transition::new(JobState::ContainerReady, JobState::Planned).is_err());
    }

    #[test]
    fn terminal_states_are_dead_ends() {
        for to in FORWARD_PATH {
            assert!(Transition::new(JobState::Published, to).is_err());
            assert!(Transition::new(JobState::FailedTerminal, to).is_err());
        }
        assert!(JobState::Published.allowed_next().is_empty());
    }

    #[test]
    fn every_active_state_may_fail_either_way() {
        for state in &FORWARD_PATH[..5] {
            assert!(state.can_transition_to(JobState::FailedRetryable));
            assert!(state.can_transition_to(JobState::FailedTerminal));
        }
    }

    #[test]
    fn retry_resume_is_flagged() {
        let t = Transition::new(JobState::FailedRetryable, JobState::Stored).unwrap();
        assert!(t.is_resume());
        let t = Transition::new(JobState::FailedRetryable, JobState::FailedTerminal).unwrap();
        assert!(!t.is_resume());
        assert!(Transition::new(JobState::FailedRetryable, JobState::Published).is_err());
    }

    #[test]
    fn successor_follows_forward_path() {
        assert_eq!(JobState::Planned.successor(), Some(JobState::Generated));
        assert_eq!(JobState::ContainerReady.successor(), Some(JobState::Published));
        assert_eq!(JobState::Published.successor(), None);
        assert_eq!(JobState::FailedRetryable.successor(), None);
    }

    #[test]
    fn state_names_round_trip_through_from_str() {
        for state in FORWARD_PATH {
            assert_eq!(state.as_str().parse::<JobState>().unwrap(), state);
        }
        assert!("RUNNING".parse::<JobState>().is_err());
    }
}
