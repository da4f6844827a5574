//! Infrastructure adapters for influencer-manager.
//!
//! This crate implements the ports defined in `influencer-core::application::ports`.
//! Network clients for the generation model and the publishing platform are
//! out of scope; the scripted adapters here stand in for them.

pub mod asset_store;
pub mod audit;
pub mod clock;
pub mod generator;
pub mod job_store;
pub mod publisher;

// Re-export commonly used adapters
pub use asset_store::InMemoryAssetStore;
pub use audit::{MemoryAuditSink, TracingAuditSink};
pub use clock::{ManualClock, SystemClock};
pub use generator::ScriptedImageGenerator;
pub use job_store::InMemoryJobStore;
pub use publisher::{CreatedContainer, ScriptedPublisher};
