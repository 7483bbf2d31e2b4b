use async_trait::async_trait;
use slidecraft_core::{Deck, ImagePayload, Result};

/// Boundary to the generative services.
///
/// Implementations make exactly one remote call per method and never retry.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Turn raw text into a structured deck.
    ///
    /// Fails with `GenerationFailure` when the call fails or the response is
    /// not deck-shaped.
    async fn structurize(&self, raw_text: &str) -> Result<Deck>;

    /// Produce one 16:9 image for a slide's image description.
    ///
    /// Fails with `ImageGenerationFailure` when the call fails or returns no image.
    async fn synthesize_image(&self, description: &str) -> Result<ImagePayload>;
}
