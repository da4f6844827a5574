//! Scripted publisher.
//!
//! Each operation first plays back its queued outcomes, then behaves like a
//! platform that accepts everything: containers are created with sequential
//! ids, report ready, and publish to sequential media ids.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use influencer_core::{
    application::{
        PortError,
        ports::{PortResult, Publisher},
    },
    domain::{ContainerId, ContainerStatus, MediaId},
};

#[derive(Debug, Clone, Default)]
pub struct ScriptedPublisher {
    inner: Arc<Mutex<Inner>>,
}

/// A container the publisher was asked to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedContainer {
    pub id: ContainerId,
    pub image_url: String,
    pub caption: String,
}

#[derive(Debug, Default)]
struct Inner {
    create_script: VecDeque<PortError>,
    status_script: VecDeque<PortResult<ContainerStatus>>,
    publish_script: VecDeque<PortError>,
    limit: Option<u32>,

    created: Vec<CreatedContainer>,
    published: Vec<(ContainerId, MediaId)>,
    status_calls: usize,
}

impl ScriptedPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for `create_container`.
    pub fn fail_create(self, error: PortError) -> Self {
        self.lock().create_script.push_back(error);
        self
    }

    /// Queue status answers for `get_container_status`; afterwards it reports ready.
    pub fn statuses(self, statuses: impl IntoIterator<Item = ContainerStatus>) -> Self {
        self.lock()
            .status_script
            .extend(statuses.into_iter().map(Ok));
        self
    }

    /// Queue a failure for `get_container_status`.
    pub fn fail_status(self, error: PortError) -> Self {
        self.lock().status_script.push_back(Err(error));
        self
    }

    /// Queue a failure for `publish_container`.
    pub fn fail_publish(self, error: PortError) -> Self {
        self.lock().publish_script.push_back(error);
        self
    }

    /// Remaining quota reported by `get_publishing_limit`.
    pub fn with_limit(self, limit: Option<u32>) -> Self {
        self.lock().limit = limit;
        self
    }

    /// Containers created so far.
    pub fn created(&self) -> Vec<CreatedContainer> {
        self.lock().created.clone()
    }

    /// Published `(container, media)` pairs.
    pub fn published(&self) -> Vec<(ContainerId, MediaId)> {
        self.lock().published.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.lock().status_calls
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Publisher for ScriptedPublisher {
    fn create_container(&self, image_url: &str, caption: &str) -> PortResult<ContainerId> {
        let mut inner = self.lock();
        if let Some(error) = inner.create_script.pop_front() {
            return Err(error);
        }

        let id = ContainerId::new(format!("container-{}", inner.created.len() + 1));
        debug!(container_id = %id, "Container created");
        inner.created.push(CreatedContainer {
            id: id.clone(),
            image_url: image_url.to_string(),
            caption: caption.to_string(),
        });
        Ok(id)
    }

    fn get_container_status(&self, id: &ContainerId) -> PortResult<ContainerStatus> {
        let mut inner = self.lock();
        inner.status_calls += 1;
        if !inner.created.iter().any(|c| &c.id == id) {
            return Err(PortError::permanent(format!("unknown container {id}")));
        }
        inner
            .status_script
            .pop_front()
            .unwrap_or(Ok(ContainerStatus::Ready))
    }

    fn publish_container(&self, id: &ContainerId) -> PortResult<MediaId> {
        let mut inner = self.lock();
        if let Some(error) = inner.publish_script.pop_front() {
            return Err(error);
        }
        if !inner.created.iter().any(|c| &c.id == id) {
            return Err(PortError::permanent(format!("unknown container {id}")));
        }

        let media = MediaId::new(format!("media-{}", inner.published.len() + 1));
        inner.published.push((id.clone(), media.clone()));
        Ok(media)
    }

    fn get_publishing_limit(&self) -> PortResult<Option<u32>> {
        Ok(self.lock().limit)
    }
}
