//! Publishing intent supplied by the caller before any job exists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::entities::prompt::PromptSpec;
use crate::domain::error::DomainError;
use crate::domain::value_objects::JobKey;

/// Instagram caption limit, in characters.
pub const MAX_CAPTION_CHARS: usize = 2200;

/// Instagram hashtag limit per post.
pub const MAX_HASHTAGS: usize = 30;

/// Plan describing how an image will be generated and published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPlan {
    caption_template: String,
    hashtags: Vec<String>,
    scheduled_at: Option<DateTime<Utc>>,
    prompt: PromptSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    idempotency_key: Option<JobKey>,
}

impl PostPlan {
    pub fn new(caption_template: impl Into<String>, prompt: PromptSpec) -> Self {
        Self {
            caption_template: caption_template.into(),
            hashtags: Vec::new(),
            scheduled_at: None,
            prompt,
            idempotency_key: None,
        }
    }

    pub fn with_hashtags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn scheduled_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    /// Use a caller-chosen idempotency key instead of the content-derived one.
    pub fn with_idempotency_key(mut self, key: JobKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }

    pub fn caption_template(&self) -> &str {
        &self.caption_template
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    pub fn scheduled_for(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    pub fn prompt(&self) -> &PromptSpec {
        &self.prompt
    }

    /// The job key: explicit if set, otherwise `plan-<sha256 of content>`.
    pub fn job_key(&self) -> JobKey {
        if let Some(key) = &self.idempotency_key {
            return key.clone();
        }
        JobKey::from_digest(&self.fingerprint())
    }

    /// Final caption: template, blank line, then `#tag`s (deduplicated, order kept).
    pub fn caption(&self) -> String {
        let body = self.caption_template.trim();
        let mut seen = Vec::<String>::new();
        for tag in &self.hashtags {
            let tag = normalize_tag(tag);
            if !seen.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
                seen.push(tag);
            }
        }

        if seen.is_empty() {
            return body.to_string();
        }
        let tags = seen
            .iter()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ");
        if body.is_empty() {
            tags
        } else {
            format!("{body}\n\n{tags}")
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        self.prompt.validate()?;

        if self.hashtags.len() > MAX_HASHTAGS {
            return Err(DomainError::InvalidPlan(format!(
                "{} hashtags exceed the limit of {MAX_HASHTAGS}",
                self.hashtags.len()
            )));
        }
        if let Some(bad) = self
            .hashtags
            .iter()
            .find(|t| normalize_tag(t).is_empty() || t.chars().any(char::is_whitespace))
        {
            return Err(DomainError::InvalidPlan(format!("invalid hashtag '{bad}'")));
        }

        let caption = self.caption();
        if caption.trim().is_empty() {
            return Err(DomainError::InvalidPlan("caption is empty".into()));
        }
        let chars = caption.chars().count();
        if chars > MAX_CAPTION_CHARS {
            return Err(DomainError::InvalidPlan(format!(
                "caption is {chars} characters, limit is {MAX_CAPTION_CHARS}"
            )));
        }
        Ok(())
    }

    fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        let mut field = |bytes: &[u8]| {
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        };

        field(self.caption_template.as_bytes());
        field((self.hashtags.len() as u64).to_be_bytes().as_slice());
        for tag in &self.hashtags {
            field(tag.as_bytes());
        }
        field(
            self.scheduled_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default()
                .as_bytes(),
        );

        let prompt = &self.prompt;
        field(prompt.text().as_bytes());
        field(prompt.style_guide_ref().unwrap_or_default().as_bytes());
        field(prompt.aspect_ratio().as_bytes());
        field(
            prompt
                .seed()
                .map(|s| s.to_string())
                .unwrap_or_default()
                .as_bytes(),
        );
        field((prompt.reference_images().len() as u64).to_be_bytes().as_slice());
        for reference in prompt.reference_images() {
            field(reference.as_bytes());
        }

        format!("{:x}", hasher.finalize())
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_string()
}
