//! Interactive session state.
//!
//! The session is the single writer for the current deck. Front ends call the
//! `begin_*` methods to start an action, run the remote call however they like,
//! and hand the outcome back through the matching `finish_*` method.

use crate::{Deck, ImagePayload, Result, Slide, ThemeId, ThemeProfile};
use std::collections::BTreeSet;

/// Sample input offered to first-time users.
pub const SAMPLE_TEXT: &str = "Strategic Roadmap 2025: Tech Horizon

Current Landscape:
The industry is shifting towards decentralized computing and edge AI. \
Competition has intensified in the SaaS sector, necessitating a pivot towards \
integrated ecosystems.

Core Objectives:
- Achieve carbon neutrality by Q4 2025
- Expand market share in APAC by 18%
- Redefine internal workflows using LLM-driven automation

Innovation Pillars:
- Adaptive UI/UX using biometric feedback
- Quantum-resistant encryption for cloud storage
- Real-time supply chain transparency using distributed ledgers

Conclusion:
Our focus remains steadfast on sustainable growth and pioneering technological \
breakthroughs. The road ahead is challenging but ripe with opportunity.";

const IMAGE_FAILURE_MESSAGE: &str = "Failed to generate AI image. Please try again.";

/// Handle for an in-flight image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTicket {
    /// Deck epoch at the time the request was issued.
    pub epoch: u64,
    /// Target slide.
    pub slide_id: String,
    /// Prompt sent to the image service.
    pub description: String,
}

/// Outcome of applying an image result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageUpdate {
    /// The image was attached to its slide.
    Applied,
    /// The deck changed since the request was issued; the result was discarded.
    Stale,
    /// The request failed; the deck is unchanged.
    Failed,
}

/// State of one interactive session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    input: String,
    deck: Option<Deck>,
    /// Bumped on every deck replacement.
    epoch: u64,
    theme: ThemeId,
    active: usize,
    generating: bool,
    pending_images: BTreeSet<String>,
    error: Option<String>,
}

impl Session {
    /// Create an empty session with the default theme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style theme selection.
    pub fn with_theme(mut self, theme: ThemeId) -> Self {
        self.theme = theme;
        self
    }

    /// Replace the raw input text.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Load the sample input text.
    pub fn load_sample(&mut self) {
        self.set_input(SAMPLE_TEXT);
    }

    /// Current raw input text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Start a structuring request.
    ///
    /// Returns the text to send, or `None` if the input is blank or a request
    /// is already running.
    pub fn begin_generation(&mut self) -> Option<String> {
        if self.generating || self.input.trim().is_empty() {
            return None;
        }
        self.generating = true;
        self.error = None;
        Some(self.input.clone())
    }

    /// Apply the outcome of a structuring request.
    ///
    /// A new deck replaces the old one wholesale; on failure the old deck is kept.
    pub fn finish_generation(&mut self, result: Result<Deck>) {
        self.generating = false;
        match result {
            Ok(deck) => {
                log::debug!("Replacing deck with '{}' ({} slides)", deck.title, deck.len());
                self.deck = Some(deck);
                self.epoch += 1;
                self.active = 0;
                self.pending_images.clear();
            }
            Err(e) => {
                log::warn!("Structuring failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
    }

    /// Whether a structuring request is running.
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    /// Current deck, if one has been generated.
    pub fn deck(&self) -> Option<&Deck> {
        self.deck.as_ref()
    }

    /// Current deck epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Start an image request for a slide.
    ///
    /// Returns `None` if there is no such slide, it has no image description,
    /// or a request for it is already pending.
    pub fn begin_image(&mut self, slide_id: &str) -> Option<ImageTicket> {
        let slide = self.deck.as_ref()?.slide(slide_id)?;
        let description = slide.image_prompt()?.to_string();

        if !self.pending_images.insert(slide_id.to_string()) {
            return None;
        }

        Some(ImageTicket {
            epoch: self.epoch,
            slide_id: slide_id.to_string(),
            description,
        })
    }

    /// Apply the outcome of an image request.
    pub fn finish_image(
        &mut self,
        ticket: &ImageTicket,
        result: Result<ImagePayload>,
    ) -> ImageUpdate {
        if ticket.epoch != self.epoch {
            log::debug!("Discarding image for '{}' from an older deck", ticket.slide_id);
            return ImageUpdate::Stale;
        }
        self.pending_images.remove(&ticket.slide_id);

        match result {
            Ok(image) => {
                let attached = self
                    .deck
                    .as_mut()
                    .map(|deck| deck.attach_image(&ticket.slide_id, &image))
                    .unwrap_or(false);
                if attached {
                    ImageUpdate::Applied
                } else {
                    ImageUpdate::Stale
                }
            }
            Err(e) => {
                log::warn!("Image generation failed for '{}': {}", ticket.slide_id, e);
                self.error = Some(IMAGE_FAILURE_MESSAGE.to_string());
                ImageUpdate::Failed
            }
        }
    }

    /// Whether an image request for this slide is in flight.
    pub fn is_image_pending(&self, slide_id: &str) -> bool {
        self.pending_images.contains(slide_id)
    }

    /// Number of image requests in flight for the current deck.
    pub fn pending_image_count(&self) -> usize {
        self.pending_images.len()
    }

    /// Index of the active slide.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// The active slide, if a deck is loaded.
    pub fn active_slide(&self) -> Option<&Slide> {
        self.deck.as_ref()?.slides.get(self.active)
    }

    /// Move to the next slide, stopping at the last one.
    pub fn next_slide(&mut self) -> usize {
        let last = self.slide_count().saturating_sub(1);
        self.active = (self.active + 1).min(last);
        self.active
    }

    /// Move to the previous slide, stopping at the first one.
    pub fn previous_slide(&mut self) -> usize {
        self.active = self.active.saturating_sub(1);
        self.active
    }

    /// Jump to a slide by index. Returns `false` if the index is out of range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.slide_count() {
            self.active = index;
            true
        } else {
            false
        }
    }

    fn slide_count(&self) -> usize {
        self.deck.as_ref().map(Deck::len).unwrap_or(0)
    }

    /// Select the theme used for rendering and export.
    pub fn select_theme(&mut self, theme: ThemeId) {
        self.theme = theme;
    }

    /// Selected theme id.
    pub fn theme_id(&self) -> ThemeId {
        self.theme
    }

    /// Selected theme profile.
    pub fn theme(&self) -> &'static ThemeProfile {
        self.theme.profile()
    }

    /// Record a user-visible error message.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    /// Last error message.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Clear the last error message.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn deck(title: &str) -> Deck {
        Deck::new(title)
            .with_slide(
                Slide::new("s1", "Intro")
                    .with_bullets(["A", "B"])
                    .with_notes("n1")
                    .with_image_description("A sunrise over a city"),
            )
            .with_slide(
                Slide::new("s2", "Plan")
                    .with_bullets(["C"])
                    .with_notes("n2")
                    .with_image_description("A roadmap"),
            )
            .with_slide(Slide::new("s3", "Close").with_notes("n3"))
    }

    fn loaded_session() -> Session {
        let mut session = Session::new();
        session.set_input("some text");
        session.begin_generation().unwrap();
        session.finish_generation(Ok(deck("Q1 Plan")));
        session
    }

    fn png() -> ImagePayload {
        ImagePayload::new("image/png", "iVBORw0KGgo=")
    }

    #[test]
    fn test_blank_input_does_not_start() {
        let mut session = Session::new();
        assert_eq!(session.begin_generation(), None);
        session.set_input("   \n ");
        assert_eq!(session.begin_generation(), None);
        assert!(!session.is_generating());
    }

    #[test]
    fn test_generation_is_exclusive() {
        let mut session = Session::new();
        session.set_input("text");
        assert_eq!(session.begin_generation().as_deref(), Some("text"));
        assert!(session.is_generating());
        assert_eq!(session.begin_generation(), None);
    }

    #[test]
    fn test_successful_generation_replaces_deck() {
        let mut session = loaded_session();
        session.next_slide();
        assert_eq!(session.active_index(), 1);

        session.begin_generation().unwrap();
        session.finish_generation(Ok(deck("Q2 Plan")));

        assert_eq!(session.deck().unwrap().title, "Q2 Plan");
        assert_eq!(session.active_index(), 0);
        assert_eq!(session.epoch(), 2);
        assert!(!session.is_generating());
    }

    #[test]
    fn test_failed_generation_keeps_prior_deck() {
        let mut session = loaded_session();
        session.begin_generation().unwrap();
        session.finish_generation(Err(Error::GenerationFailure("bad json".to_string())));

        assert_eq!(session.deck().unwrap().title, "Q1 Plan");
        assert_eq!(session.epoch(), 1);
        assert!(session.error().unwrap().contains("bad json"));
        assert!(!session.is_generating());
    }

    #[test]
    fn test_begin_generation_clears_error() {
        let mut session = loaded_session();
        session.report_error("old");
        session.begin_generation().unwrap();
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_image_update_isolation() {
        let mut session = loaded_session();
        let before = session.deck().unwrap().slides[1].clone();

        let ticket = session.begin_image("s1").unwrap();
        assert_eq!(ticket.description, "A sunrise over a city");
        assert!(session.is_image_pending("s1"));

        assert_eq!(session.finish_image(&ticket, Ok(png())), ImageUpdate::Applied);

        let deck = session.deck().unwrap();
        assert!(deck.slides[0].has_image());
        assert_eq!(deck.slides[1], before);
        assert!(!session.is_image_pending("s1"));
    }

    #[test]
    fn test_out_of_order_image_completion() {
        let mut session = loaded_session();
        let first = session.begin_image("s1").unwrap();
        let second = session.begin_image("s2").unwrap();

        let jpeg = ImagePayload::new("image/jpeg", "/9j/");
        assert_eq!(session.finish_image(&second, Ok(jpeg)), ImageUpdate::Applied);
        assert_eq!(session.finish_image(&first, Ok(png())), ImageUpdate::Applied);

        let deck = session.deck().unwrap();
        assert!(deck.slides[0]
            .generated_image_url
            .as_deref()
            .unwrap()
            .starts_with("data:image/png"));
        assert!(deck.slides[1]
            .generated_image_url
            .as_deref()
            .unwrap()
            .starts_with("data:image/jpeg"));
        assert!(!deck.slides[2].has_image());
    }

    #[test]
    fn test_stale_image_after_replacement() {
        let mut session = loaded_session();
        let ticket = session.begin_image("s1").unwrap();

        // Same slide ids, new deck.
        session.begin_generation().unwrap();
        session.finish_generation(Ok(deck("Replacement")));
        assert_eq!(session.pending_image_count(), 0);

        assert_eq!(session.finish_image(&ticket, Ok(png())), ImageUpdate::Stale);
        assert_eq!(session.deck().unwrap().image_count(), 0);
    }

    #[test]
    fn test_stale_image_for_missing_id() {
        let mut session = loaded_session();
        let ticket = ImageTicket {
            epoch: session.epoch(),
            slide_id: "gone".to_string(),
            description: "x".to_string(),
        };
        assert_eq!(session.finish_image(&ticket, Ok(png())), ImageUpdate::Stale);
    }

    #[test]
    fn test_failed_image_sets_error() {
        let mut session = loaded_session();
        let ticket = session.begin_image("s2").unwrap();
        let update = session.finish_image(
            &ticket,
            Err(Error::ImageGenerationFailure("no image".to_string())),
        );
        assert_eq!(update, ImageUpdate::Failed);
        assert_eq!(session.error(), Some(IMAGE_FAILURE_MESSAGE));
        assert_eq!(session.deck().unwrap().image_count(), 0);
        assert!(!session.is_image_pending("s2"));
    }

    #[test]
    fn test_begin_image_guards() {
        let mut session = Session::new();
        assert_eq!(session.begin_image("s1"), None);

        let mut session = loaded_session();
        assert_eq!(session.begin_image("missing"), None);
        // s3 has no image description.
        assert_eq!(session.begin_image("s3"), None);
        assert!(session.begin_image("s1").is_some());
        assert_eq!(session.begin_image("s1"), None);
    }

    #[test]
    fn test_navigation_is_clamped() {
        let mut session = loaded_session();
        assert_eq!(session.previous_slide(), 0);
        assert_eq!(session.next_slide(), 1);
        assert_eq!(session.next_slide(), 2);
        assert_eq!(session.next_slide(), 2);
        assert_eq!(session.active_slide().unwrap().id, "s3");
        assert!(session.go_to(0));
        assert!(!session.go_to(3));
        assert_eq!(session.active_index(), 0);
    }

    #[test]
    fn test_navigation_without_deck() {
        let mut session = Session::new();
        assert_eq!(session.next_slide(), 0);
        assert_eq!(session.active_slide(), None);
    }

    #[test]
    fn test_theme_selection() {
        let mut session = Session::new();
        assert_eq!(session.theme_id(), ThemeId::Corporate);
        session.select_theme(ThemeId::Elegant);
        assert_eq!(session.theme().heading_font, "Georgia");
    }

    #[test]
    fn test_sample_text() {
        let mut session = Session::new();
        session.load_sample();
        assert!(session.input().starts_with("Strategic Roadmap 2025"));
    }
}
