//! Core types for image editing.

use crate::error::{EditorError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Image formats recognised by the upload surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
    /// GIF format.
    Gif,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Attempts to detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Maps a MIME type back to a known format.
    pub fn from_mime_type(mime: &str) -> Option<Self> {
        match mime.to_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::WebP),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Returns true if the media type names an image (`image/*`).
pub fn is_image_media_type(media_type: &str) -> bool {
    media_type
        .split_once('/')
        .is_some_and(|(top, sub)| top.eq_ignore_ascii_case("image") && !sub.is_empty())
}

/// The user's original upload.
///
/// Replaced wholesale on a new upload; never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// Declared media type, e.g. `image/png`.
    pub media_type: String,
    /// File name as delivered by the upload surface.
    pub name: Option<String>,
}

impl SourceImage {
    /// Creates a source image from in-memory bytes.
    ///
    /// Rejects media types outside `image/*`, as the upload surface does.
    pub fn new(data: Vec<u8>, media_type: impl Into<String>) -> Result<Self> {
        let media_type = media_type.into();
        if !is_image_media_type(&media_type) {
            return Err(EditorError::InvalidRequest(format!(
                "unsupported media type '{media_type}': only image/* files can be edited"
            )));
        }
        Ok(Self {
            data,
            media_type,
            name: None,
        })
    }

    /// Sets the original file name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Reads an image file, deriving its media type from the extension or,
    /// failing that, from its magic bytes.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| EditorError::Read(format!("{}: {e}", path.display())))?;

        let format = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(ImageFormat::from_extension)
            .or_else(|| ImageFormat::from_magic_bytes(&data))
            .ok_or_else(|| {
                EditorError::InvalidRequest(format!(
                    "{} is not a recognised image file",
                    path.display()
                ))
            })?;

        let mut image = Self::new(data, format.mime_type())?;
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            image = image.with_name(name);
        }
        Ok(image)
    }

    /// Returns the size of the image data in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A transport-ready rendering of a [`SourceImage`]: base64 text plus media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodedPayload {
    /// Base64 text, without any data URL prefix.
    pub data: String,
    /// Media type of the encoded bytes.
    pub mime_type: String,
}

/// A single edit instruction bound to an encoded image.
#[derive(Debug, Clone)]
pub struct EditRequest {
    /// The encoded source image.
    pub image: EncodedPayload,
    /// The natural-language instruction.
    pub prompt: String,
}

impl EditRequest {
    /// Creates a new edit request.
    pub fn new(image: EncodedPayload, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
        }
    }
}

/// Metadata about the generation process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditMetadata {
    /// Model used for generation.
    pub model: Option<String>,
    /// Round-trip duration in milliseconds.
    pub duration_ms: Option<u64>,
    /// Finish reason reported for the candidate.
    pub finish_reason: Option<String>,
}

/// An image returned by the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "edited image should be saved or displayed"]
pub struct EditedImage {
    /// Media type reported by the service.
    pub mime_type: String,
    /// Base64 data exactly as returned.
    pub data: String,
    /// Generation metadata.
    pub metadata: EditMetadata,
}

impl EditedImage {
    /// Creates a new edited image.
    pub fn new(
        mime_type: impl Into<String>,
        data: impl Into<String>,
        metadata: EditMetadata,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
            metadata,
        }
    }

    /// Returns the self-contained image reference, e.g. `data:image/png;base64,...`.
    pub fn data_url(&self) -> String {
        crate::image::encoder::to_data_url(&self.mime_type, &self.data)
    }

    /// Decodes the image data into raw bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| EditorError::Decode(e.to_string()))
    }

    /// Returns the known format for this image, if any.
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_mime_type(&self.mime_type)
    }

    /// Decodes and saves the image to the specified path.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.to_bytes()?;
        tokio::fs::write(path, &bytes).await?;
        Ok(bytes.len())
    }
}
