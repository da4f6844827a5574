//! Public-API checks of the job lifecycle rules.

use chrono::{TimeZone, Utc};
use influencer_core::domain::{SideEffect, TRANSITIONS};
use influencer_core::prelude::*;

fn job() -> PublishJob {
    let prompt = PromptSpec::builder("minimal desk setup").build().unwrap();
    let plan = PostPlan::new("Workspace", prompt);
    PublishJob::new(
        plan.job_key(),
        plan,
        Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
    )
}

#[test]
fn terminal_states_have_no_exits() {
    for (from, to) in TRANSITIONS {
        if from.is_terminal() {
            assert!(to.is_empty(), "{from} must be terminal");
        }
    }
}

#[test]
fn failure_is_reachable_from_every_active_state() {
    for (from, to) in TRANSITIONS {
        if from.is_resumable() {
            assert!(to.contains(&JobState::FailedRetryable));
            assert!(to.contains(&JobState::FailedTerminal));
        }
    }
}

#[test]
fn job_cannot_leave_a_terminal_state() {
    let mut job = job();
    job.record_failure("rejected");
    job.advance(JobState::FailedTerminal, job.updated_at()).unwrap();

    for next in [JobState::Planned, JobState::Generated, JobState::FailedRetryable] {
        assert!(matches!(
            job.advance(next, job.updated_at()),
            Err(DomainError::InvalidTransition { .. })
        ));
    }
}

#[test]
fn publish_requires_media_id() {
    let mut job = job();
    job.record_image(GeneratedImage::from_bytes(b"i".to_vec(), "image/webp").unwrap());
    job.advance(JobState::Generated, job.updated_at()).unwrap();
    job.record_asset_url("memory://assets/x.webp");
    job.advance(JobState::Stored, job.updated_at()).unwrap();
    job.record_container(ContainerId::new("c"));
    job.advance(JobState::ContainerCreated, job.updated_at()).unwrap();
    job.advance(JobState::ContainerReady, job.updated_at()).unwrap();

    assert_eq!(
        job.advance(JobState::Published, job.updated_at()),
        Err(DomainError::MissingSideEffect {
            state: JobState::Published,
            effect: SideEffect::MediaPublished,
        })
    );
}

#[test]
fn derived_keys_are_stable_across_serialization() {
    let job = job();
    let json = serde_json::to_string(&job.plan).unwrap();
    let plan: PostPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(plan.job_key(), job.job_key);
}
