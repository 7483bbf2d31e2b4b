//! Prompts, response schema, and response parsing.

use serde::Deserialize;
use serde_json::{json, Value};
use slidecraft_core::{Deck, Error, Result, Slide};

/// Prefix added to every image description.
pub const IMAGE_PROMPT_PREFIX: &str =
    "A professional, corporate-style high-quality presentation visual: ";

/// Aspect ratio requested for slide images.
pub const IMAGE_ASPECT_RATIO: &str = "16:9";

/// Prompt for turning raw text into a deck.
pub fn structuring_prompt(raw_text: &str) -> String {
    format!(
        "Transform the following text into a professional presentation structure.\n\
         Break the content into logical slides. Each slide should have a concise title, \
         3-5 bullet points, and brief speaker notes.\n\
         Provide a suggestion for a professional, high-quality stock photo image description \
         that would complement the slide's content.\n\n\
         TEXT:\n{}",
        raw_text
    )
}

/// Prompt for one slide image.
pub fn image_prompt(description: &str) -> String {
    format!("{}{}", IMAGE_PROMPT_PREFIX, description.trim())
}

/// Response schema for the structuring call.
pub fn deck_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "The overall title of the presentation"
            },
            "slides": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "id": { "type": "STRING" },
                        "title": { "type": "STRING" },
                        "content": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "speakerNotes": { "type": "STRING" },
                        "imageDescription": { "type": "STRING" }
                    },
                    "required": ["id", "title", "content", "speakerNotes"]
                }
            }
        },
        "required": ["title", "slides"]
    })
}

#[derive(Debug, Deserialize)]
struct DeckShape {
    title: String,
    slides: Vec<SlideShape>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlideShape {
    id: String,
    title: String,
    content: Vec<String>,
    speaker_notes: String,
    #[serde(default)]
    image_description: Option<String>,
}

impl From<SlideShape> for Slide {
    fn from(shape: SlideShape) -> Self {
        let mut slide = Slide::new(shape.id, shape.title)
            .with_bullets(shape.content)
            .with_notes(shape.speaker_notes);
        slide.image_description = shape.image_description;
        slide
    }
}

/// Parse the structuring response text into a deck.
///
/// Blank text is read as `{}` and therefore fails. Only the shape is checked.
pub fn parse_deck_text(text: &str) -> Result<Deck> {
    let trimmed = text.trim();
    let json = if trimmed.is_empty() { "{}" } else { trimmed };

    let shape: DeckShape = serde_json::from_str(json)
        .map_err(|e| Error::GenerationFailure(format!("Response is not a deck: {}", e)))?;

    let mut deck = Deck::new(shape.title);
    for slide in shape.slides {
        deck.add_slide(slide.into());
    }
    Ok(deck)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_schema_shaped_response() {
        let text = r#"{
            "title": "Q1 Plan",
            "slides": [
                {"id": "s1", "title": "Intro", "content": ["A", "B"], "speakerNotes": "n1",
                 "imageDescription": "Team at a whiteboard"},
                {"id": "s2", "title": "Next", "content": [], "speakerNotes": ""}
            ]
        }"#;
        let deck = parse_deck_text(text).unwrap();

        assert_eq!(deck.title, "Q1 Plan");
        assert_eq!(deck.len(), 2);
        assert_eq!(deck.slides[0].content, vec!["A", "B"]);
        assert_eq!(deck.slides[0].speaker_notes, "n1");
        assert_eq!(deck.slides[0].image_prompt(), Some("Team at a whiteboard"));
        assert_eq!(deck.slides[1].image_description, None);
        assert!(!deck.slides[0].has_image());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let text = r#"{"title": "T", "slides": [{"id": "s1", "title": "Intro", "content": []}]}"#;
        assert!(matches!(parse_deck_text(text), Err(Error::GenerationFailure(_))));
    }

    #[test]
    fn test_blank_text_fails() {
        for text in ["", "   \n"] {
            assert!(matches!(parse_deck_text(text), Err(Error::GenerationFailure(_))));
        }
    }

    #[test]
    fn test_not_json_fails() {
        assert!(matches!(
            parse_deck_text("Sure! Here is your deck:"),
            Err(Error::GenerationFailure(_))
        ));
    }

    #[test]
    fn test_model_cannot_inject_image() {
        let text = r#"{"title": "T", "slides": [{"id": "s1", "title": "A", "content": [],
            "speakerNotes": "", "generatedImageUrl": "data:image/png;base64,AAAA"}]}"#;
        let deck = parse_deck_text(text).unwrap();
        assert!(!deck.slides[0].has_image());
    }

    #[test]
    fn test_prompts() {
        assert!(structuring_prompt("Raw notes").ends_with("TEXT:\nRaw notes"));
        assert_eq!(
            image_prompt(" City skyline "),
            "A professional, corporate-style high-quality presentation visual: City skyline"
        );
    }

    #[test]
    fn test_schema_requires_core_fields() {
        let schema = deck_schema();
        assert_eq!(schema["required"], json!(["title", "slides"]));
        assert_eq!(
            schema["properties"]["slides"]["items"]["required"],
            json!(["id", "title", "content", "speakerNotes"])
        );
    }
}
