//! Append-only audit events emitted for every pipeline step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::value_objects::JobKey;

/// Kind of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditEventType {
    #[serde(rename = "job.created")]
    JobCreated,
    #[serde(rename = "generation.attempted")]
    GenerationAttempted,
    #[serde(rename = "image.generated")]
    ImageGenerated,
    #[serde(rename = "asset.stored")]
    AssetStored,
    #[serde(rename = "container.created")]
    ContainerCreated,
    #[serde(rename = "container.ready")]
    ContainerReady,
    #[serde(rename = "media.published")]
    MediaPublished,
    #[serde(rename = "step.failed")]
    StepFailed,
    #[serde(rename = "retry.scheduled")]
    RetryScheduled,
    #[serde(rename = "job.failed")]
    JobFailed,
    #[serde(rename = "job.abandoned")]
    JobAbandoned,
}

impl AuditEventType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::JobCreated => "job.created",
            Self::GenerationAttempted => "generation.attempted",
            Self::ImageGenerated => "image.generated",
            Self::AssetStored => "asset.stored",
            Self::ContainerCreated => "container.created",
            Self::ContainerReady => "container.ready",
            Self::MediaPublished => "media.published",
            Self::StepFailed => "step.failed",
            Self::RetryScheduled => "retry.scheduled",
            Self::JobFailed => "job.failed",
            Self::JobAbandoned => "job.abandoned",
        }
    }
}

impl fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit event record. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub job_key: JobKey,
    pub payload: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, job_key: JobKey, created_at: DateTime<Utc>) -> Self {
        Self {
            event_type,
            job_key,
            payload: Map::new(),
            created_at,
        }
    }

    /// Add a payload field.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_as_dotted_tag() {
        let json = serde_json::to_string(&AuditEventType::RetryScheduled).unwrap();
        assert_eq!(json, "\"retry.scheduled\"");
        assert_eq!(AuditEventType::JobAbandoned.to_string(), "job.abandoned");
    }

    #[test]
    fn payload_builder_collects_fields() {
        let event = AuditEvent::new(
            AuditEventType::StepFailed,
            JobKey::new("k").unwrap(),
            Utc::now(),
        )
        .with("step", "generate")
        .with("attempt", 2);

        assert_eq!(event.get("step"), Some(&Value::from("generate")));
        assert_eq!(event.get("attempt"), Some(&Value::from(2)));
        assert!(event.get("missing").is_none());
    }
}
