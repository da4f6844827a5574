//! Publish job record and its state transitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{image::GeneratedImage, plan::PostPlan};
use crate::domain::error::DomainError;
use crate::domain::state::{JobState, SideEffect, Transition};
use crate::domain::value_objects::{ContainerId, JobKey, MediaId};

/// Job record used for idempotency and for tracking publish attempts.
///
/// Design:
/// - Single source of truth for one `job_key`
/// - State changes only through [`PublishJob::advance`], which checks the
///   transition table and the side effects the target state needs
/// - Fields recording side effects are set by the `record_*` methods before
///   advancing
/// - Lifecycle fields (`state`, `retry_count`, `last_completed`, timestamps)
///   are private, so nothing outside `advance` can move a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishJob {
    pub job_key: JobKey,
    state: JobState,
    retry_count: u32,
    pub container_id: Option<ContainerId>,
    pub media_id: Option<MediaId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,

    /// Plan the job was created for; needed to resume after a restart.
    pub plan: PostPlan,
    pub image: Option<GeneratedImage>,
    pub asset_url: Option<String>,

    /// Last forward state reached; a retry resumes here.
    last_completed: JobState,

    /// Human-readable reason of the most recent failure.
    pub failure_reason: Option<String>,
}

impl PublishJob {
    pub fn new(job_key: JobKey, plan: PostPlan, now: DateTime<Utc>) -> Self {
        Self {
            job_key,
            state: JobState::Planned,
            retry_count: 0,
            container_id: None,
            media_id: None,
            created_at: now,
            updated_at: now,
            plan,
            image: None,
            asset_url: None,
            last_completed: JobState::Planned,
            failure_reason: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Number of times the job has resumed after a transient failure.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Last forward state reached; a retry resumes here.
    pub fn last_completed(&self) -> JobState {
        self.last_completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn record_image(&mut self, image: GeneratedImage) {
        self.image = Some(image);
    }

    pub fn record_asset_url(&mut self, url: impl Into<String>) {
        self.asset_url = Some(url.into());
    }

    pub fn record_container(&mut self, id: ContainerId) {
        self.container_id = Some(id);
    }

    pub fn record_media(&mut self, id: MediaId) {
        self.media_id = Some(id);
    }

    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.failure_reason = Some(reason.into());
    }

    /// Whether the given side effect is recorded on this job.
    pub fn has(&self, effect: SideEffect) -> bool {
        match effect {
            SideEffect::ImageGenerated => self.image.is_some(),
            SideEffect::AssetStored => self.asset_url.as_deref().is_some_and(|u| !u.is_empty()),
            SideEffect::ContainerCreated => self.container_id.is_some(),
            SideEffect::MediaPublished => self.media_id.as_ref().is_some_and(|m| !m.is_empty()),
            SideEffect::FailureRecorded => self
                .failure_reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty()),
        }
    }

    /// Move to `to`, validating the table, the resume target, and required
    /// side effects. Bumps `updated_at` so it strictly increases.
    pub fn advance(&mut self, to: JobState, now: DateTime<Utc>) -> Result<Transition, DomainError> {
        let transition = Transition::new(self.state, to)?;

        if transition.is_resume() && to != self.last_completed {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        if let Some(effect) = to.requires().filter(|e| !self.has(*e)) {
            return Err(DomainError::MissingSideEffect { state: to, effect });
        }

        if transition.is_resume() {
            self.retry_count += 1;
        }
        if to.is_resumable() {
            self.last_completed = to;
        }
        if to == JobState::Published {
            self.failure_reason = None;
        }
        self.state = to;
        self.touch(now);
        Ok(transition)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

/// One entry of a job's transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub job_key: JobKey,
    /// `None` for the creation entry.
    pub from: Option<JobState>,
    pub to: JobState,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::prompt::PromptSpec;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap()
    }

    fn job() -> PublishJob {
        let prompt = PromptSpec::builder("sunrise over dunes").build().unwrap();
        let plan = PostPlan::new("Morning", prompt);
        PublishJob::new(plan.job_key(), plan, t0())
    }

    fn image() -> GeneratedImage {
        GeneratedImage::from_bytes(b"img".to_vec(), "image/png").unwrap()
    }

    #[test]
    fn new_job_starts_planned() {
        let job = job();
        assert_eq!(job.state, JobState::Planned);
        assert_eq!(job.retry_count, 0);
        assert_eq!(job.created_at, job.updated_at);
    }

    #[test]
    fn advancing_without_side_effect_is_rejected() {
        let mut job = job();
        let err = job.advance(JobState::Generated, t0()).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingSideEffect {
                state: JobState::Generated,
                effect: SideEffect::ImageGenerated
            }
        );
        assert_eq!(job.state, JobState::Planned);
    }

    #[test]
    fn full_forward_walk() {
        let mut job = job();
        job.record_image(image());
        job.advance(JobState::Generated, t0()).unwrap();
        job.record_asset_url("https://cdn.example/a.png");
        job.advance(JobState::Stored, t0()).unwrap();
        job.record_container(ContainerId::new("c-1"));
        job.advance(JobState::ContainerCreated, t0()).unwrap();
        job.advance(JobState::ContainerReady, t0()).unwrap();
        job.record_media(MediaId::new("m-1"));
        job.advance(JobState::Published, t0()).unwrap();

        assert!(job.is_terminal());
        assert_eq!(job.last_completed, JobState::Published);
    }

    #[test]
    fn empty_media_id_does_not_count_as_published() {
        let mut job = job();
        job.record_image(image());
        job.advance(JobState::Generated, t0()).unwrap();
        job.record_asset_url("u");
        job.advance(JobState::Stored, t0()).unwrap();
        job.record_container(ContainerId::new("c"));
        job.advance(JobState::ContainerCreated, t0()).unwrap();
        job.advance(JobState::ContainerReady, t0()).unwrap();
        job.record_media(MediaId::new("  "));
        assert!(job.advance(JobState::Published, t0()).is_err());
    }

    #[test]
    fn updated_at_strictly_increases_with_frozen_clock() {
        let mut job = job();
        let before = job.updated_at;
        job.record_image(image());
        job.advance(JobState::Generated, t0()).unwrap();
        assert!(job.updated_at > before);
        let mid = job.updated_at;
        job.record_failure("timeout");
        job.advance(JobState::FailedRetryable, t0()).unwrap();
        assert!(job.updated_at > mid);
    }

    #[test]
    fn resume_goes_to_last_completed_and_counts_retry() {
        let mut job = job();
        job.record_image(image());
        job.advance(JobState::Generated, t0()).unwrap();
        job.record_failure("upload timed out");
        job.advance(JobState::FailedRetryable, t0()).unwrap();

        assert!(job.advance(JobState::Planned, t0()).is_err());
        job.advance(JobState::Generated, t0()).unwrap();
        assert_eq!(job.retry_count, 1);
        assert_eq!(job.state, JobState::Generated);
    }

    #[test]
    fn failure_requires_reason() {
        let mut job = job();
        assert!(matches!(
            job.advance(JobState::FailedTerminal, t0()),
            Err(DomainError::MissingSideEffect { .. })
        ));
    }

    #[test]
    fn job_round_trips_through_json() {
        let mut job = job();
        job.record_image(image());
        job.advance(JobState::Generated, t0()).unwrap();
        let json = serde_json::to_string(&job).unwrap();
        let back: PublishJob = serde_json::from_str(&json).unwrap();
        assert_eq!(job, back);
        assert!(json.contains("\"GENERATED\""));
    }
}
