//! Output of image generation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::value_objects::ContentHash;

/// Where the image bytes live. Exactly one source, never both or neither.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImagePayload {
    Bytes(Vec<u8>),
    Path(PathBuf),
}

/// A generated image plus the metadata needed to store and publish it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    payload: ImagePayload,
    mime: String,
    width: Option<u32>,
    height: Option<u32>,
    sha256: ContentHash,
}

impl GeneratedImage {
    /// Wrap in-memory bytes; the content hash is computed here.
    pub fn from_bytes(data: Vec<u8>, mime: impl Into<String>) -> Result<Self, DomainError> {
        if data.is_empty() {
            return Err(DomainError::InvalidImage("image payload is empty".into()));
        }
        let mime = validate_mime(mime.into())?;
        let sha256 = ContentHash::of(&data);
        Ok(Self {
            payload: ImagePayload::Bytes(data),
            mime,
            width: None,
            height: None,
            sha256,
        })
    }

    /// Reference a file on local disk with the hash reported by its producer.
    pub fn from_path(
        path: impl Into<PathBuf>,
        mime: impl Into<String>,
        sha256: ContentHash,
    ) -> Result<Self, DomainError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(DomainError::InvalidImage("image path is empty".into()));
        }
        Ok(Self {
            payload: ImagePayload::Path(path),
            mime: validate_mime(mime.into())?,
            width: None,
            height: None,
            sha256,
        })
    }

    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.payload {
            ImagePayload::Path(p) => Some(p),
            ImagePayload::Bytes(_) => None,
        }
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    pub fn sha256(&self) -> &ContentHash {
        &self.sha256
    }

    /// File extension used for asset keys.
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "image/png" => "png",
            "image/jpeg" | "image/jpg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "bin",
        }
    }
}

fn validate_mime(mime: String) -> Result<String, DomainError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !mime.starts_with("image/") || mime.len() <= "image/".len() {
        return Err(DomainError::InvalidImage(format!(
            "'{mime}' is not an image MIME type"
        )));
    }
    Ok(mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_computes_hash() {
        let image = GeneratedImage::from_bytes(b"png-bytes".to_vec(), "image/png").unwrap();
        assert!(image.sha256().matches(b"png-bytes"));
        assert_eq!(image.extension(), "png");
        assert!(image.path().is_none());
    }

    #[test]
    fn empty_bytes_rejected() {
        assert!(GeneratedImage::from_bytes(Vec::new(), "image/png").is_err());
    }

    #[test]
    fn non_image_mime_rejected() {
        assert!(matches!(
            GeneratedImage::from_bytes(b"x".to_vec(), "text/plain"),
            Err(DomainError::InvalidImage(_))
        ));
    }

    #[test]
    fn path_payload_keeps_reported_hash() {
        let hash = ContentHash::of(b"on disk");
        let image = GeneratedImage::from_path("/tmp/out.jpg", "IMAGE/JPEG", hash.clone())
            .unwrap()
            .with_dimensions(1080, 1350);
        assert_eq!(image.sha256(), &hash);
        assert_eq!(image.mime(), "image/jpeg");
        assert_eq!(image.extension(), "jpg");
        assert_eq!(image.dimensions(), Some((1080, 1350)));
    }
}
