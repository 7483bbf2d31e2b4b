//! Decoding of generated images for embedding.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use slidecraft_core::{Error, ImagePayload, Result};

/// Raster formats PowerPoint can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Bmp,
}

impl ImageFormat {
    /// Detect the format from the payload's magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }
        if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            return Some(Self::Gif);
        }
        if bytes.len() > 14 && bytes.starts_with(b"BM") {
            return Some(Self::Bmp);
        }
        None
    }

    /// File extension used for the media part.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
        }
    }

    /// MIME type registered in `[Content_Types].xml`.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
        }
    }
}

/// A decoded image ready to be stored in the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
}

impl EmbeddedImage {
    /// Decode a `data:` URI into raw image bytes.
    ///
    /// The format is taken from the bytes themselves; the declared MIME type is
    /// only used in the error message when the bytes are not a known format.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let payload = ImagePayload::from_data_uri(uri)
            .map_err(|e| Error::ExportFailure(format!("Malformed image payload: {}", e)))?;

        let compact: String = payload
            .data
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();

        let bytes = STANDARD
            .decode(compact.as_bytes())
            .map_err(|e| Error::ExportFailure(format!("Malformed image payload: {}", e)))?;

        let format = ImageFormat::from_magic(&bytes).ok_or_else(|| {
            Error::ExportFailure(format!(
                "Unsupported image data (declared as {})",
                payload.mime_type
            ))
        })?;

        Ok(Self { bytes, format })
    }
}

/// A 1×1 PNG, base64-encoded.
#[cfg(test)]
pub(crate) const PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkY\
                                    PhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
