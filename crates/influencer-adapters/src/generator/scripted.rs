//! Scripted image generator.
//!
//! Plays back queued outcomes, then falls back to a deterministic image
//! derived from the prompt. Useful for tests and for exercising the pipeline
//! without a model behind it.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tracing::debug;

use influencer_core::{
    application::{
        PortError,
        ports::{ImageGenerator, PortResult},
    },
    domain::{GeneratedImage, PromptSpec},
};

#[derive(Debug, Clone, Default)]
pub struct ScriptedImageGenerator {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    script: VecDeque<PortResult<GeneratedImage>>,
    prompts: Vec<PromptSpec>,
}

impl ScriptedImageGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a failure for the next unscripted call.
    pub fn then_fail(self, error: PortError) -> Self {
        self.lock().script.push_back(Err(error));
        self
    }

    /// Queue a specific image.
    pub fn then_return(self, image: GeneratedImage) -> Self {
        self.lock().script.push_back(Ok(image));
        self
    }

    /// Number of `generate_image` calls made.
    pub fn calls(&self) -> usize {
        self.lock().prompts.len()
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<PromptSpec> {
        self.lock().prompts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageGenerator for ScriptedImageGenerator {
    fn generate_image(&self, prompt: &PromptSpec) -> PortResult<GeneratedImage> {
        let mut inner = self.lock();
        inner.prompts.push(prompt.clone());
        debug!(calls = inner.prompts.len(), "Generating image");

        if let Some(outcome) = inner.script.pop_front() {
            return outcome;
        }
        placeholder(prompt)
    }
}

/// Deterministic stand-in image: same prompt, same bytes, same hash.
fn placeholder(prompt: &PromptSpec) -> PortResult<GeneratedImage> {
    let bytes = format!(
        "placeholder:{}:{}:{}",
        prompt.aspect_ratio(),
        prompt.seed().unwrap_or_default(),
        prompt.text()
    )
    .into_bytes();
    GeneratedImage::from_bytes(bytes, "image/png").map_err(|e| PortError::permanent(e.to_string()))
}
