//! Generation request sent to the image generator.

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

pub const DEFAULT_ASPECT_RATIO: &str = "1:1";

/// Prompt specification for an image generation request.
///
/// Immutable once built; construct through [`PromptSpec::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PromptSpec {
    text: String,
    style_guide_ref: Option<String>,
    aspect_ratio: String,
    seed: Option<u64>,
    reference_images: Vec<String>,
}

impl PromptSpec {
    pub fn builder(text: impl Into<String>) -> PromptSpecBuilder {
        PromptSpecBuilder {
            text: text.into(),
            style_guide_ref: None,
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            seed: None,
            reference_images: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style_guide_ref(&self) -> Option<&str> {
        self.style_guide_ref.as_deref()
    }

    pub fn aspect_ratio(&self) -> &str {
        &self.aspect_ratio
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn reference_images(&self) -> &[String] {
        &self.reference_images
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() {
            return Err(DomainError::InvalidPrompt("prompt text is empty".into()));
        }
        parse_aspect_ratio(&self.aspect_ratio)?;
        if self.reference_images.iter().any(|r| r.trim().is_empty()) {
            return Err(DomainError::InvalidPrompt(
                "reference image identifiers must not be blank".into(),
            ));
        }
        Ok(())
    }
}

/// Parse a `W:H` aspect ratio into its two positive components.
pub fn parse_aspect_ratio(ratio: &str) -> Result<(u32, u32), DomainError> {
    let invalid = || DomainError::InvalidPrompt(format!("aspect ratio '{ratio}' is not W:H"));
    let (w, h) = ratio.split_once(':').ok_or_else(invalid)?;
    let w: u32 = w.trim().parse().map_err(|_| invalid())?;
    let h: u32 = h.trim().parse().map_err(|_| invalid())?;
    if w == 0 || h == 0 {
        return Err(invalid());
    }
    Ok((w, h))
}

/// Builder for [`PromptSpec`].
#[derive(Debug, Clone)]
pub struct PromptSpecBuilder {
    text: String,
    style_guide_ref: Option<String>,
    aspect_ratio: String,
    seed: Option<u64>,
    reference_images: Vec<String>,
}

impl PromptSpecBuilder {
    pub fn style_guide_ref(mut self, reference: impl Into<String>) -> Self {
        self.style_guide_ref = Some(reference.into());
        self
    }

    pub fn aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = ratio.into();
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn reference_image(mut self, id: impl Into<String>) -> Self {
        self.reference_images.push(id.into());
        self
    }

    pub fn build(self) -> Result<PromptSpec, DomainError> {
        let spec = PromptSpec {
            text: self.text.trim().to_string(),
            style_guide_ref: self.style_guide_ref,
            aspect_ratio: self.aspect_ratio.trim().to_string(),
            seed: self.seed,
            reference_images: self.reference_images,
        };
        spec.validate()?;
        Ok(spec)
    }
}
