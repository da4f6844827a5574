pub mod audit;
pub mod image;
pub mod job;
pub mod plan;
pub mod prompt;

pub use crate::domain::DomainError;
pub use audit::{AuditEvent, AuditEventType};
pub use image::{GeneratedImage, ImagePayload};
pub use job::{PublishJob, StateTransition};
pub use plan::PostPlan;
pub use prompt::{PromptSpec, PromptSpecBuilder};
