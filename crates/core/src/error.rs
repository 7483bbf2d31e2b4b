//! Error types for deck generation and export.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating, editing, or exporting a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The theme identifier is not one of the supported themes.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// The structuring service failed or returned something that is not a deck.
    #[error("Failed to structure presentation data: {0}")]
    GenerationFailure(String),

    /// The image service failed or returned no image.
    #[error("Image generation failed: {0}")]
    ImageGenerationFailure(String),

    /// The deck does not satisfy the export preconditions.
    #[error("Invalid deck: {0}")]
    InvalidDeck(String),

    /// The presentation file could not be produced.
    #[error("Export failed: {0}")]
    ExportFailure(String),

    /// An image data URI could not be parsed.
    #[error("Invalid image payload: {0}")]
    InvalidImagePayload(String),

    /// ZIP archive error (reading PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (reading PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),
}
