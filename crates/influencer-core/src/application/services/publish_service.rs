//! Publish Service - drives a job through the pipeline.
//!
//! This service coordinates the entire publishing workflow:
//! 1. Create (or look up) the job for a plan's key
//! 2. Claim the job's lease so only one runner calls the platform
//! 3. Generate, store, create container, wait until ready, publish
//! 4. Persist after every transition; retry transient failures with backoff
//!
//! It is the only component that decides between retry and terminal failure.

use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        PortError, StoreError,
        ports::{AssetStore, AuditSink, Clock, ImageGenerator, JobStore, Publisher},
        services::PipelineConfig,
    },
    domain::{
        AuditEvent, AuditEventType, ContainerId, ContainerStatus, DomainError, GeneratedImage, ImagePayload,
        JobKey, JobState, PostPlan, PublishJob, RunnerId, StateTransition,
    },
    error::{PipelineError, PipelineResult},
};

/// One unit of remote work, named after what it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Generate,
    Store,
    CreateContainer,
    AwaitReady,
    Publish,
}

impl Step {
    /// The step that leaves `state` along the forward path.
    fn leaving(state: JobState) -> Option<Self> {
        match state {
            JobState::Planned => Some(Self::Generate),
            JobState::Generated => Some(Self::Store),
            JobState::Stored => Some(Self::CreateContainer),
            JobState::ContainerCreated => Some(Self::AwaitReady),
            JobState::ContainerReady => Some(Self::Publish),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Store => "store",
            Self::CreateContainer => "create_container",
            Self::AwaitReady => "await_ready",
            Self::Publish => "publish",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a step did not complete.
enum StepError {
    /// The port failed; the job records it and may retry.
    Port(PortError),
    /// The run itself cannot continue.
    Abort(PipelineError),
}

impl From<PortError> for StepError {
    fn from(e: PortError) -> Self {
        Self::Port(e)
    }
}

impl From<DomainError> for StepError {
    fn from(e: DomainError) -> Self {
        Self::Abort(e.into())
    }
}

/// Job orchestrator.
///
/// Generic over its ports, so adapters are chosen at wiring time and
/// dispatched statically.
pub struct PublishService<G, A, P, S, C, L> {
    generator: G,
    assets: A,
    publisher: P,
    store: S,
    clock: C,
    audit: L,
    config: PipelineConfig,
}

impl<G, A, P, S, C, L> PublishService<G, A, P, S, C, L>
where
    G: ImageGenerator,
    A: AssetStore,
    P: Publisher,
    S: JobStore,
    C: Clock,
    L: AuditSink,
{
    /// Create a new publish service with the given adapters and default tuning.
    pub fn new(generator: G, assets: A, publisher: P, store: S, clock: C, audit: L) -> Self {
        Self {
            generator,
            assets,
            publisher,
            store,
            clock,
            audit,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Publish a plan.
    ///
    /// Idempotent per job key: a terminal job is returned unchanged, an
    /// unfinished one continues from where it stopped. Port failures end up in
    /// the returned job's state; `Err` means the run could not proceed
    /// (another runner holds the job, store failure, broken invariant).
    #[instrument(skip_all, fields(job_key = tracing::field::Empty))]
    pub fn run(&self, plan: PostPlan) -> PipelineResult<PublishJob> {
        plan.validate()?;
        let key = plan.job_key();
        tracing::Span::current().record("job_key", key.as_str());

        let job = match self.store.get(&key)? {
            Some(job) => job,
            None => self.create_job(key.clone(), plan)?,
        };
        if job.is_terminal() {
            info!(state = %job.state(), "Job already finished");
            return Ok(job);
        }

        self.drive(&key)
    }

    /// Continue an existing job from its stored plan.
    #[instrument(skip_all, fields(job_key = %key))]
    pub fn resume(&self, key: &JobKey) -> PipelineResult<PublishJob> {
        let job = self.load(key)?;
        if job.is_terminal() {
            info!(state = %job.state(), "Job already finished");
            return Ok(job);
        }
        self.drive(key)
    }

    /// Give up on a job that is not being worked on.
    ///
    /// Only `PLANNED` and `FAILED_RETRYABLE` jobs qualify; a job whose lease is
    /// held by a live runner is left alone.
    #[instrument(skip_all, fields(job_key = %key))]
    pub fn abandon(&self, key: &JobKey, reason: &str) -> PipelineResult<PublishJob> {
        let job = self.load(key)?;
        if !matches!(job.state(), JobState::Planned | JobState::FailedRetryable) {
            return Err(DomainError::NotAbandonable {
                job_key: key.to_string(),
                state: job.state(),
            }
            .into());
        }

        let runner = RunnerId::new();
        self.store
            .acquire_lease(key, &runner, self.clock.now(), self.config.lease_ttl)?;
        let result = self.load(key).and_then(|job| self.abandon_leased(job, reason));
        self.release(key, &runner);
        result
    }

    /// Current record of a job.
    pub fn status(&self, key: &JobKey) -> PipelineResult<PublishJob> {
        self.load(key)
    }

    /// Transition history of a job, oldest first.
    pub fn history(&self, key: &JobKey) -> PipelineResult<Vec<StateTransition>> {
        self.load(key)?;
        Ok(self.store.history(key)?)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn load(&self, key: &JobKey) -> PipelineResult<PublishJob> {
        self.store.get(key)?.ok_or_else(|| {
            StoreError::NotFound {
                job_key: key.to_string(),
            }
            .into()
        })
    }

    fn create_job(&self, key: JobKey, plan: PostPlan) -> PipelineResult<PublishJob> {
        let now = self.clock.now();
        let caption = plan.caption();
        let job = PublishJob::new(key.clone(), plan, now);

        match self.store.create(&job) {
            Ok(()) => {
                info!("Job created");
                self.emit(
                    AuditEvent::new(AuditEventType::JobCreated, key, now).with("caption", caption),
                );
                Ok(job)
            }
            // Lost the creation race; the winner's record is authoritative.
            Err(StoreError::AlreadyExists { .. }) => self.load(&key),
            Err(e) => Err(e.into()),
        }
    }

    /// Hold the lease for the whole run and release it afterwards.
    fn drive(&self, key: &JobKey) -> PipelineResult<PublishJob> {
        let runner = RunnerId::new();
        self.store
            .acquire_lease(key, &runner, self.clock.now(), self.config.lease_ttl)?;
        debug!(%runner, "Lease acquired");

        let result = self.load(key).and_then(|job| {
            if job.is_terminal() {
                Ok(job)
            } else {
                self.process(job, &runner)
            }
        });

        self.release(key, &runner);
        result
    }

    fn release(&self, key: &JobKey, runner: &RunnerId) {
        if let Err(e) = self.store.release_lease(key, runner) {
            warn!(error = %e, %runner, "Failed to release lease");
        }
    }

    fn process(&self, mut job: PublishJob, runner: &RunnerId) -> PipelineResult<PublishJob> {
        loop {
            if job.is_terminal() {
                return Ok(job);
            }
            if job.state() == JobState::FailedRetryable {
                job = self.retry_or_give_up(job, runner)?;
                continue;
            }

            let Some(step) = Step::leaving(job.state()) else {
                return Err(PipelineError::Internal {
                    message: format!("no step leaves state {}", job.state()),
                });
            };

            let mut candidate = job.clone();
            match self.execute(step, &mut candidate) {
                Ok(event) => {
                    let prior = job.state();
                    let next = prior.successor().ok_or(DomainError::InvalidTransition {
                        from: prior,
                        to: prior,
                    })?;
                    candidate.advance(next, self.clock.now())?;
                    self.persist(&candidate, prior, runner)?;
                    info!(step = %step, state = %candidate.state(), "Step completed");
                    self.emit(event);
                    job = candidate;
                }
                Err(StepError::Port(error)) => {
                    job = self.fail_step(job, step, error, runner)?;
                }
                Err(StepError::Abort(error)) => return Err(error),
            }
        }
    }

    /// Run one step, recording its side effect on `job`.
    fn execute(&self, step: Step, job: &mut PublishJob) -> Result<AuditEvent, StepError> {
        let now = self.clock.now();
        let event = |kind| AuditEvent::new(kind, job.job_key.clone(), now);

        match step {
            Step::Generate => {
                self.emit(
                    event(AuditEventType::GenerationAttempted)
                        .with("attempt", job.retry_count() + 1)
                        .with("prompt", job.plan.prompt().text()),
                );
                let image = self.generator.generate_image(job.plan.prompt())?;
                let done = event(AuditEventType::ImageGenerated)
                    .with("sha256", image.sha256().as_str())
                    .with("mime", image.mime());
                job.record_image(image);
                Ok(done)
            }
            Step::Store => {
                let image = job
                    .image
                    .as_ref()
                    .ok_or(DomainError::MissingRequiredField { field: "image" })?;
                let key = format!(
                    "{}/{}.{}",
                    job.job_key,
                    image.sha256(),
                    image.extension()
                );

                let (url, reused) = match self.assets.get_url(&key)? {
                    Some(url) => (url, true),
                    None => {
                        let bytes = load_bytes(image)?;
                        (self.assets.put_bytes(&key, &bytes, image.mime())?, false)
                    }
                };
                let done = event(AuditEventType::AssetStored)
                    .with("key", key)
                    .with("url", url.as_str())
                    .with("reused", reused);
                job.record_asset_url(url);
                Ok(done)
            }
            Step::CreateContainer => {
                let url = job
                    .asset_url
                    .as_deref()
                    .ok_or(DomainError::MissingRequiredField { field: "asset_url" })?;
                let id = self
                    .publisher
                    .create_container(url, &job.plan.caption())?;
                let done =
                    event(AuditEventType::ContainerCreated).with("container_id", id.as_str());
                job.record_container(id);
                Ok(done)
            }
            Step::AwaitReady => {
                let id = job
                    .container_id
                    .as_ref()
                    .ok_or(DomainError::MissingRequiredField {
                        field: "container_id",
                    })?;
                let polls = self.await_ready(id)?;
                Ok(event(AuditEventType::ContainerReady)
                    .with("container_id", id.as_str())
                    .with("polls", polls))
            }
            Step::Publish => {
                let id = job
                    .container_id
                    .clone()
                    .ok_or(DomainError::MissingRequiredField {
                        field: "container_id",
                    })?;
                if self.publisher.get_publishing_limit()? == Some(0) {
                    return Err(PortError::transient("publishing limit reached").into());
                }
                let media = self.publisher.publish_container(&id)?;
                if media.is_empty() {
                    return Err(PortError::permanent("publisher returned an empty media id").into());
                }
                let done = event(AuditEventType::MediaPublished)
                    .with("media_id", media.as_str())
                    .with("container_id", id.as_str());
                job.record_media(media);
                Ok(done)
            }
        }
    }

    /// Poll until the container is ready. Returns the number of polls made.
    fn await_ready(&self, id: &ContainerId) -> Result<u32, PortError> {
        let poll = &self.config.poll;
        let started = self.clock.now();
        let mut interval = poll.interval;
        let mut polls = 0u32;

        loop {
            polls += 1;
            match self.publisher.get_container_status(id)? {
                ContainerStatus::Ready => return Ok(polls),
                ContainerStatus::Failed => {
                    return Err(PortError::permanent(format!(
                        "container {id} failed processing"
                    )));
                }
                ContainerStatus::Pending => {
                    let waited = elapsed(started, self.clock.now());
                    if waited >= poll.timeout {
                        return Err(PortError::transient(format!(
                            "container {id} not ready after {}s",
                            waited.as_secs()
                        )));
                    }
                    debug!(container_id = %id, polls, "Container pending");
                    self.clock.sleep(interval.min(poll.timeout - waited));
                    interval = poll.next_interval(interval);
                }
            }
        }
    }

    fn fail_step(
        &self,
        mut job: PublishJob,
        step: Step,
        error: PortError,
        runner: &RunnerId,
    ) -> PipelineResult<PublishJob> {
        let prior = job.state();
        let target = if error.is_transient() {
            JobState::FailedRetryable
        } else {
            JobState::FailedTerminal
        };
        let reason = format!("{step}: {}", error.message());

        job.record_failure(reason.as_str());
        job.advance(target, self.clock.now())?;
        self.persist(&job, prior, runner)?;
        warn!(step = %step, error = %error, state = %job.state(), "Step failed");

        let now = self.clock.now();
        self.emit(
            AuditEvent::new(AuditEventType::StepFailed, job.job_key.clone(), now)
                .with("step", step.as_str())
                .with("transient", error.is_transient())
                .with("reason", reason.as_str())
                .with("retry_count", job.retry_count()),
        );
        if target == JobState::FailedTerminal {
            self.emit(
                AuditEvent::new(AuditEventType::JobFailed, job.job_key.clone(), now)
                    .with("reason", reason),
            );
        }
        Ok(job)
    }

    /// From `FAILED_RETRYABLE`: wait and resume, or fail for good.
    fn retry_or_give_up(&self, mut job: PublishJob, runner: &RunnerId) -> PipelineResult<PublishJob> {
        let policy = &self.config.retry;
        let attempt = job.retry_count() + 1;
        let delay = policy.jittered_delay(attempt);
        let spent = elapsed(job.created_at(), self.clock.now());
        let last = job.failure_reason.clone().unwrap_or_default();

        if !policy.allows(job.retry_count(), spent, delay) {
            let reason = if job.retry_count() >= policy.max_retries {
                format!("retries exhausted after {} attempts; last error: {last}", attempt)
            } else {
                format!(
                    "gave up after {}s, over the {}s limit; last error: {last}",
                    spent.as_secs(),
                    policy.max_elapsed.as_secs()
                )
            };
            job.record_failure(reason.as_str());
            job.advance(JobState::FailedTerminal, self.clock.now())?;
            self.persist(&job, JobState::FailedRetryable, runner)?;
            warn!(retry_count = job.retry_count(), "Job failed permanently");
            self.emit(
                AuditEvent::new(AuditEventType::JobFailed, job.job_key.clone(), self.clock.now())
                    .with("reason", reason),
            );
            return Ok(job);
        }

        info!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            resume = %job.last_completed(),
            "Retry scheduled"
        );
        self.clock.sleep(delay);

        let resume = job.last_completed();
        job.advance(resume, self.clock.now())?;
        self.persist(&job, JobState::FailedRetryable, runner)?;
        self.emit(
            AuditEvent::new(AuditEventType::RetryScheduled, job.job_key.clone(), self.clock.now())
                .with("attempt", job.retry_count())
                .with("delay_ms", delay.as_millis() as u64)
                .with("resume_state", resume.as_str()),
        );
        Ok(job)
    }

    fn abandon_leased(&self, mut job: PublishJob, reason: &str) -> PipelineResult<PublishJob> {
        let prior = job.state();
        if !matches!(prior, JobState::Planned | JobState::FailedRetryable) {
            return Err(DomainError::NotAbandonable {
                job_key: job.job_key.to_string(),
                state: prior,
            }
            .into());
        }

        job.record_failure(format!("abandoned: {reason}"));
        job.advance(JobState::FailedTerminal, self.clock.now())?;
        self.store.update(&job, prior)?;
        info!(from = %prior, "Job abandoned");
        self.emit(
            AuditEvent::new(AuditEventType::JobAbandoned, job.job_key.clone(), self.clock.now())
                .with("reason", reason)
                .with("from_state", prior.as_str()),
        );
        Ok(job)
    }

    /// Compare-and-swap the job, then extend the lease.
    fn persist(&self, job: &PublishJob, prior: JobState, runner: &RunnerId) -> PipelineResult<()> {
        self.store.update(job, prior)?;
        self.store.acquire_lease(
            &job.job_key,
            runner,
            self.clock.now(),
            self.config.lease_ttl,
        )?;
        Ok(())
    }

    fn emit(&self, event: AuditEvent) {
        let kind = event.event_type;
        if let Err(e) = self.audit.append(event) {
            warn!(event = %kind, error = %e, "Failed to append audit event");
        }
    }
}

/// Bytes of an image, read from disk for path payloads and checked against
/// the recorded hash.
fn load_bytes(image: &GeneratedImage) -> Result<Vec<u8>, PortError> {
    let bytes = match image.payload() {
        ImagePayload::Bytes(bytes) => bytes.clone(),
        ImagePayload::Path(path) => std::fs::read(path).map_err(|e| {
            let message = format!("cannot read {}: {e}", path.display());
            if e.kind() == std::io::ErrorKind::NotFound {
                PortError::permanent(message)
            } else {
                PortError::transient(message)
            }
        })?,
    };
    if !image.sha256().matches(&bytes) {
        return Err(PortError::permanent(format!(
            "image content does not match sha256 {}",
            image.sha256()
        )));
    }
    Ok(bytes)
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::output::{
        MockAssetStore, MockAuditSink, MockImageGenerator, MockPublisher,
    };
    use crate::application::ports::StoreResult;
    use crate::domain::{MediaId, PromptSpec};
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Minimal store: CAS on state, leases always granted.
    #[derive(Default)]
    struct TestStore {
        jobs: Mutex<HashMap<JobKey, PublishJob>>,
    }

    impl JobStore for TestStore {
        fn get(&self, key: &JobKey) -> StoreResult<Option<PublishJob>> {
            Ok(self.jobs.lock().unwrap().get(key).cloned())
        }

        fn create(&self, job: &PublishJob) -> StoreResult<()> {
            self.jobs
                .lock()
                .unwrap()
                .insert(job.job_key.clone(), job.clone());
            Ok(())
        }

        fn update(&self, job: &PublishJob, expected_prior: JobState) -> StoreResult<()> {
            let mut jobs = self.jobs.lock().unwrap();
            let current = jobs.get(&job.job_key).map(|j| j.state());
            assert_eq!(current, Some(expected_prior));
            jobs.insert(job.job_key.clone(), job.clone());
            Ok(())
        }

        fn history(&self, _key: &JobKey) -> StoreResult<Vec<StateTransition>> {
            Ok(Vec::new())
        }

        fn acquire_lease(
            &self,
            _key: &JobKey,
            _runner: &RunnerId,
            _now: DateTime<Utc>,
            _ttl: Duration,
        ) -> StoreResult<()> {
            Ok(())
        }

        fn release_lease(&self, _key: &JobKey, _runner: &RunnerId) -> StoreResult<()> {
            Ok(())
        }
    }

    struct FixedClock(Mutex<DateTime<Utc>>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }

        fn sleep(&self, duration: Duration) {
            let mut now = self.0.lock().unwrap();
            *now += chrono::Duration::from_std(duration).unwrap();
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Mutex::new(
            Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap(),
        ))
    }

    fn plan() -> PostPlan {
        PostPlan::new("Autumn", PromptSpec::builder("red leaves").build().unwrap())
    }

    fn quiet_audit() -> MockAuditSink {
        let mut audit = MockAuditSink::new();
        audit.expect_append().returning(|_| Ok(()));
        audit
    }

    #[test]
    fn step_order_follows_forward_path() {
        assert_eq!(Step::leaving(JobState::Planned), Some(Step::Generate));
        assert_eq!(Step::leaving(JobState::ContainerReady), Some(Step::Publish));
        assert_eq!(Step::leaving(JobState::Published), None);
        assert_eq!(Step::leaving(JobState::FailedRetryable), None);
    }

    #[test]
    fn happy_path_reaches_published() {
        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .times(1)
            .returning(|_| Ok(GeneratedImage::from_bytes(b"png".to_vec(), "image/png").unwrap()));

        let mut assets = MockAssetStore::new();
        assets.expect_get_url().times(1).returning(|_| Ok(None));
        assets
            .expect_put_bytes()
            .times(1)
            .returning(|key, _, _| Ok(format!("https://cdn.test/{key}")));

        let mut publisher = MockPublisher::new();
        publisher
            .expect_create_container()
            .times(1)
            .returning(|_, _| Ok(ContainerId::new("c-1")));
        publisher
            .expect_get_container_status()
            .returning(|_| Ok(ContainerStatus::Ready));
        publisher
            .expect_get_publishing_limit()
            .returning(|| Ok(None));
        publisher
            .expect_publish_container()
            .times(1)
            .returning(|_| Ok(MediaId::new("m-1")));

        let service = PublishService::new(
            generator,
            assets,
            publisher,
            TestStore::default(),
            clock(),
            quiet_audit(),
        );
        let job = service.run(plan()).unwrap();

        assert_eq!(job.state(), JobState::Published);
        assert_eq!(job.media_id, Some(MediaId::new("m-1")));
        assert_eq!(job.retry_count(), 0);
    }

    #[test]
    fn permanent_generation_failure_is_terminal_without_retry() {
        let mut generator = MockImageGenerator::new();
        generator
            .expect_generate_image()
            .times(1)
            .returning(|_| Err(PortError::permanent("prompt rejected by policy")));

        let service = PublishService::new(
            generator,
            MockAssetStore::new(),
            MockPublisher::new(),
            TestStore::default(),
            clock(),
            quiet_audit(),
        );
        let job = service.run(plan()).unwrap();

        assert_eq!(job.state(), JobState::FailedTerminal);
        assert_eq!(job.retry_count(), 0);
        assert!(
            job.failure_reason
                .as_deref()
                .unwrap()
                .contains("prompt rejected")
        );
    }

    #[test]
    fn zero_publishing_quota_is_transient() {
        let mut publisher = MockPublisher::new();
        publisher
            .expect_get_publishing_limit()
            .returning(|| Ok(Some(0)));
        publisher.expect_publish_container().never();

        let service = PublishService::new(
            MockImageGenerator::new(),
            MockAssetStore::new(),
            publisher,
            TestStore::default(),
            clock(),
            quiet_audit(),
        );
        let mut job = PublishJob::new(plan().job_key(), plan(), service.clock.now());
        job.record_container(ContainerId::new("c-9"));

        match service.execute(Step::Publish, &mut job) {
            Err(StepError::Port(e)) => assert!(e.is_transient()),
            _ => panic!("expected a transient port failure"),
        }
    }

    #[test]
    fn missing_image_file_is_permanent() {
        let hash = crate::domain::ContentHash::of(b"original");
        let image = GeneratedImage::from_path("/nonexistent/never.png", "image/png", hash).unwrap();
        let err = load_bytes(&image).unwrap_err();
        assert!(!err.is_transient());
    }
}
