//! Application layer for the publish pipeline.
//!
//! This layer contains:
//! - **Services**: Use case orchestration (PublishService) and its policies
//! - **Ports**: Interface definitions (traits) for external dependencies
//! - **Errors**: Port and store error types
//!
//! The application layer coordinates the domain layer. Transition rules live
//! in `crate::domain`; retry and polling decisions live here.

pub mod error;
pub mod ports;
pub mod services;

// Re-export main services
pub use services::{PipelineConfig, PollPolicy, PublishService, RetryPolicy};

// Re-export port traits (for adapter implementation)
pub use ports::{AssetStore, AuditSink, Clock, ImageGenerator, JobStore, Publisher};

pub use error::{PortError, StoreError};
