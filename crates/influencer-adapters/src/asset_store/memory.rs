//! In-memory asset store for testing and local wiring.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard},
};

use tracing::debug;

use influencer_core::application::{
    PortError,
    ports::{AssetStore, PortResult},
};

/// Default URL prefix for stored objects.
pub const DEFAULT_BASE_URL: &str = "memory://assets";

/// Thread-safe in-memory object store.
#[derive(Debug, Clone)]
pub struct InMemoryAssetStore {
    base_url: String,
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: HashMap<String, StoredObject>,
    put_failures: VecDeque<PortError>,
    uploads: usize,
}

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

impl InMemoryAssetStore {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    /// Make the next `put_bytes` call fail with `error`. Calls queue up.
    pub fn fail_next_put(self, error: PortError) -> Self {
        self.lock().put_failures.push_back(error);
        self
    }

    /// Number of successful uploads.
    pub fn uploads(&self) -> usize {
        self.lock().uploads
    }

    /// Stored bytes and content type of `key`.
    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.lock()
            .objects
            .get(key)
            .map(|o| (o.data.clone(), o.content_type.clone()))
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.lock().objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for InMemoryAssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetStore for InMemoryAssetStore {
    fn put_bytes(&self, key: &str, data: &[u8], content_type: &str) -> PortResult<String> {
        if key.is_empty() {
            return Err(PortError::permanent("asset key must not be empty"));
        }

        let mut inner = self.lock();
        if let Some(error) = inner.put_failures.pop_front() {
            return Err(error);
        }

        inner.objects.insert(
            key.to_string(),
            StoredObject {
                data: data.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        inner.uploads += 1;
        debug!(key, bytes = data.len(), "Asset stored");
        Ok(self.url(key))
    }

    fn get_url(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self
            .lock()
            .objects
            .contains_key(key)
            .then(|| self.url(key)))
    }
}
