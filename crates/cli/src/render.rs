//! Plain-text rendering of decks for the terminal.

use slidecraft_core::{Deck, Slide, TextNormalizer, ThemeId, ThemeRegistry};
use std::fmt::Write;

/// Image state of a slide as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    None,
    Available,
    Pending,
    Generated,
}

impl ImageStatus {
    pub fn of(slide: &Slide, pending: bool) -> Self {
        if slide.has_image() {
            Self::Generated
        } else if pending {
            Self::Pending
        } else if slide.image_prompt().is_some() {
            Self::Available
        } else {
            Self::None
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Available => " [img?]",
            Self::Pending => " [img…]",
            Self::Generated => " [img]",
        }
    }
}

/// One slide: heading, bullets, and the image line.
pub fn render_slide(slide: &Slide, index: usize, total: usize, status: ImageStatus) -> String {
    let normalizer = TextNormalizer::new();
    let mut out = String::new();

    let _ = writeln!(out, "[{}/{}] {}", index + 1, total, normalizer.normalize_line(&slide.title));
    for bullet in normalizer.normalize_bullets(&slide.content) {
        let _ = writeln!(out, "  • {}", bullet);
    }

    match (status, slide.image_prompt()) {
        (ImageStatus::Generated, _) => out.push_str("  Image: generated\n"),
        (ImageStatus::Pending, _) => out.push_str("  Image: generating...\n"),
        (ImageStatus::Available, Some(prompt)) => {
            let _ = writeln!(out, "  Image idea: {} (run `image` to generate)", prompt);
        }
        _ => {}
    }
    out
}

/// Speaker notes of one slide.
pub fn render_notes(slide: &Slide) -> String {
    let lines = TextNormalizer::new().normalize_to_lines(&slide.speaker_notes);
    if lines.is_empty() {
        return "  (no speaker notes)\n".to_string();
    }
    lines
        .iter()
        .map(|l| if l.is_empty() { "\n".to_string() } else { format!("  {}\n", l) })
        .collect()
}

/// Numbered slide list with the active slide marked.
pub fn render_outline<F>(deck: &Deck, active: usize, is_pending: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut out = String::new();
    let _ = writeln!(out, "{} ({} slides)", deck.title, deck.len());
    for (idx, slide) in deck.slides.iter().enumerate() {
        let cursor = if idx == active { '>' } else { ' ' };
        let status = ImageStatus::of(slide, is_pending(&slide.id));
        let _ = writeln!(out, "{} {:>2}. {}{}", cursor, idx + 1, slide.title, status.marker());
    }
    out
}

/// Theme table with the selected theme marked.
pub fn render_themes(selected: Option<ThemeId>) -> String {
    let mut out = String::new();
    for profile in ThemeRegistry::profiles() {
        let cursor = if Some(profile.id) == selected { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{} {:<10} {:<5} bg #{} text #{} accent #{} fonts {}/{}",
            cursor,
            profile.id.as_str(),
            if profile.is_dark() { "dark" } else { "light" },
            profile.background_color,
            profile.text_color,
            profile.accent_color,
            profile.heading_font,
            profile.body_font
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecraft_core::ImagePayload;

    fn slide() -> Slide {
        Slide::new("s1", "Intro")
            .with_bullets(["- A", "B  b"])
            .with_notes("line one\n\nline two")
            .with_image_description("Skyline")
    }

    #[test]
    fn test_render_slide() {
        let text = render_slide(&slide(), 0, 3, ImageStatus::Available);
        assert!(text.starts_with("[1/3] Intro\n"));
        assert!(text.contains("  • - A\n"));
        assert!(text.contains("  • B b\n"));
        assert!(text.contains("Image idea: Skyline"));
    }

    #[test]
    fn test_image_status() {
        let mut s = slide();
        assert_eq!(ImageStatus::of(&s, false), ImageStatus::Available);
        assert_eq!(ImageStatus::of(&s, true), ImageStatus::Pending);
        s = s.with_image(&ImagePayload::new("image/png", "AAAA"));
        assert_eq!(ImageStatus::of(&s, true), ImageStatus::Generated);
        assert_eq!(ImageStatus::of(&Slide::new("x", "X"), false), ImageStatus::None);
    }

    #[test]
    fn test_render_notes() {
        assert_eq!(render_notes(&slide()), "  line one\n\n  line two\n");
        assert_eq!(render_notes(&Slide::new("x", "X")), "  (no speaker notes)\n");
    }

    #[test]
    fn test_render_outline_marks_active() {
        let deck = Deck::new("Plan")
            .with_slide(slide())
            .with_slide(Slide::new("s2", "Next"));
        let text = render_outline(&deck, 1, |id| id == "s1");
        assert!(text.starts_with("Plan (2 slides)\n"));
        assert!(text.contains("   1. Intro [img…]\n"));
        assert!(text.contains(">  2. Next\n"));
    }

    #[test]
    fn test_render_themes() {
        let text = render_themes(Some(ThemeId::Elegant));
        assert_eq!(text.lines().count(), 4);
        assert!(text.contains("* elegant"));
        assert!(text.contains("corporate  dark"));
        assert!(text.contains("fonts Georgia/Arial"));
    }
}
