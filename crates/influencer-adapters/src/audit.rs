//! Audit sinks.

use std::sync::{Arc, RwLock};

use influencer_core::{
    application::{
        PortError,
        ports::{AuditSink, PortResult},
    },
    domain::{AuditEvent, AuditEventType, JobKey},
};

/// Writes every event as a structured `tracing` record under the `audit`
/// target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn append(&self, event: AuditEvent) -> PortResult<()> {
        let payload = serde_json::Value::Object(event.payload);
        tracing::info!(
            target: "audit",
            kind = %event.event_type,
            job_key = %event.job_key,
            at = %event.created_at.to_rfc3339(),
            %payload,
            "audit event"
        );
        Ok(())
    }
}

/// Keeps events in memory, in append order.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuditSink {
    events: Arc<RwLock<Vec<AuditEvent>>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events of one job, in append order.
    pub fn for_job(&self, key: &JobKey) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| &e.job_key == key)
            .collect()
    }

    pub fn count(&self, kind: AuditEventType) -> usize {
        self.events()
            .iter()
            .filter(|e| e.event_type == kind)
            .count()
    }

    /// Event type tags in append order.
    pub fn kinds(&self) -> Vec<AuditEventType> {
        self.events().iter().map(|e| e.event_type).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, event: AuditEvent) -> PortResult<()> {
        self.events
            .write()
            .map_err(|_| PortError::transient("audit log lock poisoned"))?
            .push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(kind: AuditEventType, key: &str) -> AuditEvent {
        AuditEvent::new(kind, JobKey::new(key).unwrap(), Utc::now())
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemoryAuditSink::new();
        sink.append(event(AuditEventType::JobCreated, "a")).unwrap();
        sink.append(event(AuditEventType::JobCreated, "b")).unwrap();
        sink.append(event(AuditEventType::StepFailed, "a")).unwrap();

        assert_eq!(
            sink.kinds(),
            vec![
                AuditEventType::JobCreated,
                AuditEventType::JobCreated,
                AuditEventType::StepFailed
            ]
        );
        assert_eq!(sink.for_job(&JobKey::new("a").unwrap()).len(), 2);
        assert_eq!(sink.count(AuditEventType::JobCreated), 2);
    }

    #[test]
    fn tracing_sink_accepts_events() {
        let sink = TracingAuditSink;
        assert!(
            sink.append(event(AuditEventType::MediaPublished, "a").with("media_id", "m"))
                .is_ok()
        );
    }
}
