//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the publish pipeline needs from external systems.
//! The `influencer-adapters` crate provides implementations.

use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::application::error::{PortError, StoreError};
use crate::domain::{
    AuditEvent, ContainerId, ContainerStatus, GeneratedImage, JobKey, JobState, MediaId,
    PromptSpec, PublishJob, RunnerId, StateTransition,
};

/// Result of a call through an external port.
pub type PortResult<T> = Result<T, PortError>;

/// Result of a job store call.
pub type StoreResult<T> = Result<T, StoreError>;

/// Port for image generation.
///
/// Implemented by:
/// - `influencer_adapters::generator::ScriptedImageGenerator` (testing, local wiring)
///
/// Reference images are carried by the prompt itself.
#[cfg_attr(test, mockall::automock)]
pub trait ImageGenerator: Send + Sync {
    fn generate_image(&self, prompt: &PromptSpec) -> PortResult<GeneratedImage>;
}

/// Port for durable asset storage with public URLs.
///
/// Implemented by:
/// - `influencer_adapters::asset_store::InMemoryAssetStore`
#[cfg_attr(test, mockall::automock)]
pub trait AssetStore: Send + Sync {
    /// Persist bytes under `key` and return a public URL.
    fn put_bytes(&self, key: &str, data: &[u8], content_type: &str) -> PortResult<String>;

    /// URL of an already stored key, if any.
    fn get_url(&self, key: &str) -> PortResult<Option<String>>;
}

/// Port for the publishing platform.
///
/// Implemented by:
/// - `influencer_adapters::publisher::ScriptedPublisher` (testing, local wiring)
#[cfg_attr(test, mockall::automock)]
pub trait Publisher: Send + Sync {
    /// Create a media container for the image at `image_url`.
    fn create_container(&self, image_url: &str, caption: &str) -> PortResult<ContainerId>;

    fn get_container_status(&self, id: &ContainerId) -> PortResult<ContainerStatus>;

    fn publish_container(&self, id: &ContainerId) -> PortResult<MediaId>;

    /// Remaining publishing quota; `None` when the platform does not say.
    fn get_publishing_limit(&self) -> PortResult<Option<u32>>;
}

/// Port for time.
///
/// Every wait in the pipeline goes through [`Clock::sleep`], so a manual
/// clock makes backoff and polling instant in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn sleep(&self, duration: Duration);
}

/// Port for the append-only audit log.
///
/// Implemented by:
/// - `influencer_adapters::audit::TracingAuditSink` (structured log lines)
/// - `influencer_adapters::audit::MemoryAuditSink` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait AuditSink: Send + Sync {
    fn append(&self, event: AuditEvent) -> PortResult<()>;
}

/// Port for job persistence.
///
/// Implemented by:
/// - `influencer_adapters::job_store::InMemoryJobStore`
///
/// ## Design Notes
///
/// - `update` is a compare-and-swap on the stored state; losing the race is
///   a [`StoreError::Conflict`], never a silent overwrite
/// - Leases serialise runners of the same key across the non-idempotent
///   remote calls
/// - A lease is renewed only when its holder persists a transition, so the
///   TTL must outlast the longest port call or polling phase between two
///   writes. A shorter TTL lets a second runner repeat a remote side effect.
pub trait JobStore: Send + Sync {
    fn get(&self, key: &JobKey) -> StoreResult<Option<PublishJob>>;

    /// Insert a new job. Fails with `AlreadyExists` if the key is taken.
    fn create(&self, job: &PublishJob) -> StoreResult<()>;

    /// Replace the stored job if its state is still `expected_prior`.
    ///
    /// Fails with `IllegalTransition` when `expected_prior -> job.state` is
    /// not an edge of the transition table.
    fn update(&self, job: &PublishJob, expected_prior: JobState) -> StoreResult<()>;

    /// Transition history of a job, oldest first.
    fn history(&self, key: &JobKey) -> StoreResult<Vec<StateTransition>>;

    /// Claim (or renew) the runner lease on `key` until `now + ttl`.
    fn acquire_lease(
        &self,
        key: &JobKey,
        runner: &RunnerId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StoreResult<()>;

    /// Drop the lease if `runner` holds it.
    fn release_lease(&self, key: &JobKey, runner: &RunnerId) -> StoreResult<()>;
}
