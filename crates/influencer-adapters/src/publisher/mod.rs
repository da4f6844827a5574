//! Publisher adapters.

pub mod scripted;

pub use scripted::{CreatedContainer, ScriptedPublisher};
