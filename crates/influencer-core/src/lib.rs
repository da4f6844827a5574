//! Influencer Manager Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for generating
//! images and publishing them through a state-tracked, idempotent job
//! pipeline, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │        influencer-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │  (PublishService, Retry/Poll policies)  │
//! │         Orchestrates Use Cases          │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ (Generator, Assets, Publisher, Store,   │
//! │  Clock, Audit)                          │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    influencer-adapters (Infrastructure) │
//! │ (InMemoryJobStore, scripted fakes, etc) │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ (JobState, PublishJob, PostPlan, ...)   │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use influencer_core::prelude::*;
//!
//! // 1. Describe the post
//! let prompt = PromptSpec::builder("a lighthouse at dusk")
//!     .aspect_ratio("4:5")
//!     .build()?;
//! let plan = PostPlan::new("Evening light", prompt).with_hashtags(["coast"]);
//!
//! // 2. Run it through the service (with injected adapters)
//! let service = PublishService::new(generator, assets, publisher, store, clock, audit);
//! let job = service.run(plan)?;
//! assert_eq!(job.state(), JobState::Published);
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        PipelineConfig, PollPolicy, PortError, PublishService, RetryPolicy, StoreError,
        ports::{
            AssetStore, AuditSink, Clock, ImageGenerator, JobStore, PortResult, Publisher,
            StoreResult,
        },
    };
    pub use crate::domain::{
        AuditEvent, AuditEventType, ContainerId, ContainerStatus, ContentHash, DomainError,
        GeneratedImage, ImagePayload, JobKey, JobState, MediaId, PostPlan, PromptSpec, PublishJob, RunnerId,
        StateTransition,
    };
    pub use crate::error::{ErrorCategory, PipelineError, PipelineResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
