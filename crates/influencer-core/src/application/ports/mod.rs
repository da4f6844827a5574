//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `influencer-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: Called by application, implemented by infrastructure
//!   - `ImageGenerator`: Image generation
//!   - `AssetStore`: Durable storage with public URLs
//!   - `Publisher`: Container creation, polling and publishing
//!   - `JobStore`: Job records, history and leases
//!   - `Clock`, `AuditSink`
//!
//! - **Driving (Input) Ports**: Called by external world, implemented by application
//!   - (Defined in CLI layer, implemented by services)

pub mod output;

pub use output::{
    AssetStore, AuditSink, Clock, ImageGenerator, JobStore, PortResult, Publisher, StoreResult,
};
