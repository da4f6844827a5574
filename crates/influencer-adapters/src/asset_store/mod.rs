//! Asset store adapters.

pub mod memory;

pub use memory::InMemoryAssetStore;
