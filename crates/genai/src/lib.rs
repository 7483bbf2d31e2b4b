//! Content generation adapter.
//!
//! [`ContentGenerator`] is the boundary to the generative services: one call
//! turns raw text into a [`Deck`](slidecraft_core::Deck), the other turns an
//! image description into an [`ImagePayload`](slidecraft_core::ImagePayload).
//! [`GeminiClient`] implements it against the Gemini REST API.

mod dto;
pub mod gemini;
pub mod generator;
mod prompt;

pub use gemini::{GeminiClient, GeminiConfig, ImageBackend};
pub use generator::ContentGenerator;
pub use prompt::{image_prompt, parse_deck_text};
