//! Domain value objects: identifiers, content hashes, container status.
//!
//! # Design
//!
//! These are pure value types with equality-by-value and no identity. The
//! string-backed identifiers are newtypes so a `ContainerId` can never be
//! passed where a `MediaId` is expected.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// Maximum length of a job key.
pub const MAX_JOB_KEY_LEN: usize = 128;

/// Compute a SHA-256 lower-case hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let hash = Sha256::digest(data);
    format!("{hash:x}")
}

// ── JobKey ───────────────────────────────────────────────────────────────────

/// Idempotency key identifying a publish job.
///
/// Supplied by the caller or derived from the plan content. Two submissions
/// with the same key always address the same job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobKey(String);

impl JobKey {
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        let invalid = |reason: &str| DomainError::InvalidJobKey {
            key: key.clone(),
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("must not be empty"));
        }
        if key.len() > MAX_JOB_KEY_LEN {
            return Err(invalid("longer than 128 characters"));
        }
        if let Some(c) = key
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | ':' | '/' | '-')))
        {
            return Err(invalid(&format!("unsupported character {c:?}")));
        }

        Ok(Self(key))
    }

    /// Key derived from a content digest: `plan-<hex>`.
    pub(crate) fn from_digest(hex: &str) -> Self {
        Self(format!("plan-{hex}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for JobKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for JobKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobKey> for String {
    fn from(key: JobKey) -> Self {
        key.0
    }
}

// ── ContentHash ──────────────────────────────────────────────────────────────

/// SHA-256 digest of an image payload, 64 lower-case hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash the given bytes.
    pub fn of(data: &[u8]) -> Self {
        Self(sha256_hex(data))
    }

    /// Parse a hash reported by a producer.
    pub fn parse(hex: impl AsRef<str>) -> Result<Self, DomainError> {
        let hex = hex.as_ref().trim().to_ascii_lowercase();
        if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DomainError::InvalidImage(format!(
                "sha256 must be 64 hex characters, got '{hex}'"
            )));
        }
        Ok(Self(hex))
    }

    /// Whether `data` hashes to this digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        sha256_hex(data) == self.0
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

// ── Remote handles ───────────────────────────────────────────────────────────

/// Handle of a media container on the publishing platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a published media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaId(String);

impl MediaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one orchestrator run, used as the lease owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunnerId(uuid::Uuid);

impl RunnerId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "runner-{}", self.0)
    }
}

// ── ContainerStatus ──────────────────────────────────────────────────────────

/// Processing status of a remote media container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerStatus {
    /// Still processing; poll again later.
    Pending,
    Ready,
    /// The platform rejected the media.
    Failed,
}

impl ContainerStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_produces_known_hash() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn job_key_rejects_whitespace_and_empty() {
        assert!(JobKey::new("").is_err());
        assert!(JobKey::new("spring drop").is_err());
        assert!(JobKey::new("a".repeat(129)).is_err());
        assert!(JobKey::new("campaign/2026-10:post_1").is_ok());
    }

    #[test]
    fn job_key_deserialization_validates() {
        let ok: Result<JobKey, _> = serde_json::from_str("\"post-1\"");
        assert!(ok.is_ok());
        let bad: Result<JobKey, _> = serde_json::from_str("\"bad key\"");
        assert!(bad.is_err());
    }

    #[test]
    fn content_hash_parse_normalizes_case() {
        let upper = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";
        let hash = ContentHash::parse(upper).unwrap();
        assert_eq!(hash, ContentHash::of(b""));
        assert!(hash.matches(b""));
        assert!(!hash.matches(b"x"));
    }

    #[test]
    fn content_hash_rejects_short_digest() {
        assert!(matches!(
            ContentHash::parse("abc123"),
            Err(DomainError::InvalidImage(_))
        ));
    }

    #[test]
    fn runner_ids_are_unique() {
        assert_ne!(RunnerId::new(), RunnerId::new());
        assert!(RunnerId::new().to_string().starts_with("runner-"));
    }
}
