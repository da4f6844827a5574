//! Image generator adapters.

pub mod scripted;

pub use scripted::ScriptedImageGenerator;
