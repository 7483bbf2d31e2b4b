//! Domain types for representing a generated deck.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// An entire presentation: a title and its slides in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    /// Overall presentation title.
    pub title: String,

    /// Slides in presentation (and export) order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create a new deck with the given title and no slides.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the end of the deck.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Builder-style variant of [`Deck::add_slide`].
    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.add_slide(slide);
        self
    }

    /// Number of slides.
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    /// Whether the deck has no slides.
    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Look up a slide by id.
    pub fn slide(&self, id: &str) -> Option<&Slide> {
        self.slides.iter().find(|s| s.id == id)
    }

    /// Position of the slide with the given id.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.slides.iter().position(|s| s.id == id)
    }

    /// Attach a generated image to the slide with the given id.
    ///
    /// Only that slide's image field changes; an existing image is overwritten.
    /// Returns `false` if no slide has this id.
    pub fn attach_image(&mut self, id: &str, image: &ImagePayload) -> bool {
        match self.slides.iter_mut().find(|s| s.id == id) {
            Some(slide) => {
                slide.generated_image_url = Some(image.to_data_uri());
                true
            }
            None => false,
        }
    }

    /// Number of slides that carry a generated image.
    pub fn image_count(&self) -> usize {
        self.slides.iter().filter(|s| s.has_image()).count()
    }

    /// Check the preconditions for export: a non-blank title and at least one slide.
    pub fn ensure_exportable(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::InvalidDeck("deck title is empty".to_string()));
        }
        if self.slides.is_empty() {
            return Err(Error::InvalidDeck("deck has no slides".to_string()));
        }
        Ok(())
    }
}

/// A single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// Identifier assigned by the structuring service; stable for the slide's lifetime.
    pub id: String,

    /// Slide heading.
    pub title: String,

    /// Bullet lines, in order.
    pub content: Vec<String>,

    /// Presenter notes.
    pub speaker_notes: String,

    /// Suggested visual for image generation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_description: Option<String>,

    /// Generated image as a `data:` URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_image_url: Option<String>,
}

impl Slide {
    /// Create a new slide with no bullets, notes, or image.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: Vec::new(),
            speaker_notes: String::new(),
            image_description: None,
            generated_image_url: None,
        }
    }

    /// Add a bullet line.
    pub fn add_bullet(&mut self, text: impl Into<String>) {
        self.content.push(text.into());
    }

    /// Builder-style bullet list.
    pub fn with_bullets<I, S>(mut self, bullets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content.extend(bullets.into_iter().map(Into::into));
        self
    }

    /// Builder-style speaker notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.speaker_notes = notes.into();
        self
    }

    /// Builder-style image description.
    pub fn with_image_description(mut self, description: impl Into<String>) -> Self {
        self.image_description = Some(description.into());
        self
    }

    /// Builder-style generated image.
    pub fn with_image(mut self, image: &ImagePayload) -> Self {
        self.generated_image_url = Some(image.to_data_uri());
        self
    }

    /// Whether a generated image is attached.
    pub fn has_image(&self) -> bool {
        self.generated_image_url
            .as_deref()
            .map(|u| !u.trim().is_empty())
            .unwrap_or(false)
    }

    /// Image description, if present and non-blank.
    pub fn image_prompt(&self) -> Option<&str> {
        self.image_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// An encoded image as returned by the image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,

    /// Base64-encoded image bytes.
    pub data: String,
}

impl ImagePayload {
    /// MIME type assumed when the service does not report one.
    pub const DEFAULT_MIME_TYPE: &'static str = "image/png";

    /// Create a payload from a MIME type and base64 data.
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// Render as a `data:<mime>;base64,<data>` URI.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    /// Parse a base64 `data:` URI.
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| Error::InvalidImagePayload("missing 'data:' scheme".to_string()))?;

        let (header, data) = rest
            .split_once(',')
            .ok_or_else(|| Error::InvalidImagePayload("missing ',' separator".to_string()))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| Error::InvalidImagePayload("payload is not base64".to_string()))?;

        if data.trim().is_empty() {
            return Err(Error::InvalidImagePayload("empty image data".to_string()));
        }

        let mime_type = if mime_type.is_empty() {
            Self::DEFAULT_MIME_TYPE
        } else {
            mime_type
        };

        Ok(Self::new(mime_type, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_slide_deck() -> Deck {
        Deck::new("Roadmap")
            .with_slide(
                Slide::new("a", "Intro")
                    .with_bullets(["One", "Two"])
                    .with_notes("Say hello")
                    .with_image_description("A skyline"),
            )
            .with_slide(Slide::new("b", "Outro").with_notes("Wrap up"))
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{
            "title": "Q1 Plan",
            "slides": [
                {"id": "s1", "title": "Intro", "content": ["A", "B"], "speakerNotes": "n1"},
                {"id": "s2", "title": "Next", "content": [], "speakerNotes": "", "imageDescription": "chart"}
            ]
        }"#;

        let deck: Deck = serde_json::from_str(json).unwrap();
        assert_eq!(deck.title, "Q1 Plan");
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[0].content, vec!["A", "B"]);
        assert_eq!(deck.slides[0].speaker_notes, "n1");
        assert_eq!(deck.slides[0].image_description, None);
        assert_eq!(deck.slides[1].image_description.as_deref(), Some("chart"));
        assert!(!deck.slides[1].has_image());
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = r#"{"title": "T", "slides": [{"id": "s1", "title": "Intro", "content": []}]}"#;
        assert!(serde_json::from_str::<Deck>(json).is_err());
    }

    #[test]
    fn test_attach_image_touches_only_target() {
        let mut deck = two_slide_deck();
        let before_b = deck.slides[1].clone();
        let image = ImagePayload::new("image/png", "AAAA");

        assert!(deck.attach_image("a", &image));

        assert_eq!(
            deck.slides[0].generated_image_url.as_deref(),
            Some("data:image/png;base64,AAAA")
        );
        assert_eq!(deck.slides[1], before_b);
        assert_eq!(deck.image_count(), 1);
    }

    #[test]
    fn test_attach_image_unknown_id() {
        let mut deck = two_slide_deck();
        let original = deck.clone();
        assert!(!deck.attach_image("zzz", &ImagePayload::new("image/png", "AAAA")));
        assert_eq!(deck, original);
    }

    #[test]
    fn test_attach_image_overwrites() {
        let mut deck = two_slide_deck();
        deck.attach_image("a", &ImagePayload::new("image/png", "AAAA"));
        deck.attach_image("a", &ImagePayload::new("image/jpeg", "BBBB"));
        assert_eq!(
            deck.slides[0].generated_image_url.as_deref(),
            Some("data:image/jpeg;base64,BBBB")
        );
    }

    #[test]
    fn test_ensure_exportable() {
        assert!(two_slide_deck().ensure_exportable().is_ok());
        assert!(matches!(
            Deck::new("Empty").ensure_exportable(),
            Err(Error::InvalidDeck(_))
        ));
        assert!(matches!(
            Deck::new("   ").with_slide(Slide::new("a", "A")).ensure_exportable(),
            Err(Error::InvalidDeck(_))
        ));
    }

    #[test]
    fn test_data_uri_round_trip() {
        let payload = ImagePayload::from_data_uri("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(payload.data, "/9j/4AAQ");
        assert_eq!(payload.to_data_uri(), "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_data_uri_rejects_malformed() {
        assert!(ImagePayload::from_data_uri("https://example.com/a.png").is_err());
        assert!(ImagePayload::from_data_uri("data:image/png;base64").is_err());
        assert!(ImagePayload::from_data_uri("data:image/svg+xml,<svg/>").is_err());
        assert!(ImagePayload::from_data_uri("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_image_prompt_ignores_blank() {
        let slide = Slide::new("a", "A").with_image_description("  ");
        assert_eq!(slide.image_prompt(), None);
        let slide = Slide::new("a", "A").with_image_description(" city ");
        assert_eq!(slide.image_prompt(), Some("city"));
    }
}
