//! Application services - orchestrate use cases.
//!
//! Services coordinate the domain layer and ports to accomplish
//! high-level use cases like "publish this plan" or "abandon that job".

pub mod policy;
pub mod publish_service;

pub use policy::{PipelineConfig, PollPolicy, RetryPolicy};
pub use publish_service::PublishService;
