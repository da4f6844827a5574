//! In-memory job store with compare-and-swap updates and runner leases.

use std::{
    collections::HashMap,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
    time::Duration,
};

use chrono::{DateTime, Utc};
use tracing::debug;

use influencer_core::{
    application::{
        StoreError,
        ports::{JobStore, StoreResult},
    },
    domain::{JobKey, JobState, PublishJob, RunnerId, StateTransition},
};

/// Thread-safe in-memory job store.
///
/// Cloning yields another handle to the same records, so several services
/// (or threads) can share one store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    jobs: HashMap<JobKey, PublishJob>,
    history: HashMap<JobKey, Vec<StateTransition>>,
    leases: HashMap<JobKey, Lease>,
}

#[derive(Debug, Clone)]
struct Lease {
    runner: RunnerId,
    expires_at: DateTime<Utc>,
}

impl InMemoryJobStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of jobs.
    pub fn len(&self) -> usize {
        self.read().map(|inner| inner.jobs.len()).unwrap_or(0)
    }

    /// Check if store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current lease holder of a job, expired or not.
    pub fn lease_holder(&self, key: &JobKey) -> Option<RunnerId> {
        let inner = self.read().ok()?;
        inner.leases.get(key).map(|lease| lease.runner)
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| StoreError::Unavailable {
            reason: "job store lock poisoned".into(),
        })
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| StoreError::Unavailable {
            reason: "job store lock poisoned".into(),
        })
    }
}

impl JobStore for InMemoryJobStore {
    fn get(&self, key: &JobKey) -> StoreResult<Option<PublishJob>> {
        Ok(self.read()?.jobs.get(key).cloned())
    }

    fn create(&self, job: &PublishJob) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.jobs.contains_key(&job.job_key) {
            return Err(StoreError::AlreadyExists {
                job_key: job.job_key.to_string(),
            });
        }

        inner.jobs.insert(job.job_key.clone(), job.clone());
        inner.history.insert(
            job.job_key.clone(),
            vec![StateTransition {
                job_key: job.job_key.clone(),
                from: None,
                to: job.state(),
                at: job.created_at(),
            }],
        );
        Ok(())
    }

    fn update(&self, job: &PublishJob, expected_prior: JobState) -> StoreResult<()> {
        let mut inner = self.write()?;
        let stored = inner
            .jobs
            .get(&job.job_key)
            .ok_or_else(|| StoreError::NotFound {
                job_key: job.job_key.to_string(),
            })?;

        if stored.state() != expected_prior {
            return Err(StoreError::Conflict {
                job_key: job.job_key.to_string(),
                expected: expected_prior,
                actual: stored.state(),
            });
        }

        if !expected_prior.can_transition_to(job.state()) {
            return Err(StoreError::IllegalTransition {
                job_key: job.job_key.to_string(),
                from: expected_prior,
                to: job.state(),
            });
        }

        debug!(job_key = %job.job_key, from = %expected_prior, to = %job.state(), "Job updated");
        inner.jobs.insert(job.job_key.clone(), job.clone());
        inner
            .history
            .entry(job.job_key.clone())
            .or_default()
            .push(StateTransition {
                job_key: job.job_key.clone(),
                from: Some(expected_prior),
                to: job.state(),
                at: job.updated_at(),
            });
        Ok(())
    }

    fn history(&self, key: &JobKey) -> StoreResult<Vec<StateTransition>> {
        Ok(self.read()?.history.get(key).cloned().unwrap_or_default())
    }

    fn acquire_lease(
        &self,
        key: &JobKey,
        runner: &RunnerId,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> StoreResult<()> {
        let mut inner = self.write()?;
        if !inner.jobs.contains_key(key) {
            return Err(StoreError::NotFound {
                job_key: key.to_string(),
            });
        }

        if let Some(lease) = inner.leases.get(key) {
            if lease.runner != *runner && lease.expires_at > now {
                return Err(StoreError::Leased {
                    job_key: key.to_string(),
                    holder: lease.runner.to_string(),
                });
            }
        }

        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        inner.leases.insert(
            key.clone(),
            Lease {
                runner: *runner,
                expires_at,
            },
        );
        Ok(())
    }

    fn release_lease(&self, key: &JobKey, runner: &RunnerId) -> StoreResult<()> {
        let mut inner = self.write()?;
        if inner.leases.get(key).is_some_and(|lease| lease.runner == *runner) {
            inner.leases.remove(key);
        }
        Ok(())
    }
}
