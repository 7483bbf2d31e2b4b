//! Text normalization for slide text and export file names.
//!
//! Generated text is written straight into XML parts, so it is NFC-normalized
//! and stripped of control characters that XML 1.0 cannot carry.

use regex::Regex;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

/// Regex to collapse runs of spaces and tabs into one.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

/// Regex matching any whitespace run, including line breaks.
static WHITESPACE_RUN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Characters not allowed in XML 1.0 documents (tab, LF and CR are allowed).
static XML_ILLEGAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\u{FFFE}\u{FFFF}]").unwrap()
});

/// Separator used when deriving a file name from a deck title.
pub const FILE_NAME_SEPARATOR: &str = "_";

/// Extension of exported presentation files.
pub const EXPORT_EXTENSION: &str = "pptx";

/// Derive the export file stem from a deck title.
///
/// Each whitespace run becomes a single `_`; every other character is kept.
pub fn export_file_stem(title: &str) -> String {
    WHITESPACE_RUN_REGEX
        .replace_all(title, FILE_NAME_SEPARATOR)
        .into_owned()
}

/// Derive the full export file name (`<stem>.pptx`) from a deck title.
pub fn export_file_name(title: &str) -> String {
    format!("{}.{}", export_file_stem(title), EXPORT_EXTENSION)
}

/// Text normalizer for slide content.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    /// Whether to preserve original line breaks.
    preserve_line_breaks: bool,
}

impl TextNormalizer {
    /// Create a normalizer that flattens line breaks (titles and bullets).
    pub fn new() -> Self {
        Self {
            preserve_line_breaks: false,
        }
    }

    /// Set whether to preserve original line breaks (speaker notes).
    pub fn with_preserve_line_breaks(mut self, preserve: bool) -> Self {
        self.preserve_line_breaks = preserve;
        self
    }

    /// Normalize a piece of text.
    ///
    /// - Applies Unicode NFC
    /// - Drops XML-illegal control characters
    /// - Collapses whitespace runs to single spaces
    /// - Trims leading/trailing whitespace
    pub fn normalize_line(&self, text: &str) -> String {
        let composed: String = text.nfc().collect();
        let cleaned = XML_ILLEGAL_REGEX.replace_all(&composed, "");
        let unified = cleaned.replace("\r\n", "\n").replace('\r', "\n");

        if self.preserve_line_breaks {
            unified
                .lines()
                .map(|line| WHITESPACE_COLLAPSE_REGEX.replace_all(line, " ").trim().to_string())
                .collect::<Vec<_>>()
                .join("\n")
                .trim_matches('\n')
                .to_string()
        } else {
            WHITESPACE_RUN_REGEX
                .replace_all(&unified, " ")
                .trim()
                .to_string()
        }
    }

    /// Normalize bullets, one output line per entry.
    ///
    /// The author's text is kept as written, empty entries included.
    pub fn normalize_bullets(&self, bullets: &[String]) -> Vec<String> {
        bullets.iter().map(|b| self.normalize_line(b)).collect()
    }

    /// Normalize text into lines.
    ///
    /// Blank lines between paragraphs are kept; leading and trailing ones are not.
    pub fn normalize_to_lines(&self, text: &str) -> Vec<String> {
        let normalized = self
            .clone()
            .with_preserve_line_breaks(true)
            .normalize_line(text);

        normalized.lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_single_space() {
        assert_eq!(export_file_name("Q1 Plan"), "Q1_Plan.pptx");
    }

    #[test]
    fn test_file_name_collapses_whitespace_runs() {
        assert_eq!(export_file_stem("Q1   Plan\t\t2025"), "Q1_Plan_2025");
        assert_eq!(export_file_stem("Line\nbreak"), "Line_break");
    }

    #[test]
    fn test_file_name_preserves_other_characters() {
        assert_eq!(export_file_stem("R&D: Year-End (v2)"), "R&D:_Year-End_(v2)");
        assert_eq!(export_file_stem("Café résumé"), "Café_résumé");
    }

    #[test]
    fn test_file_name_edges() {
        assert_eq!(export_file_stem(" padded "), "_padded_");
        assert_eq!(export_file_stem("NoSpaces"), "NoSpaces");
    }

    #[test]
    fn test_collapse_whitespace() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize_line("Hello    world"), "Hello world");
        assert_eq!(normalizer.normalize_line("  Hello\n world  "), "Hello world");
    }

    #[test]
    fn test_preserve_line_breaks() {
        let normalizer = TextNormalizer::new().with_preserve_line_breaks(true);
        assert_eq!(
            normalizer.normalize_line("First   line\r\nSecond\tline\n"),
            "First line\nSecond line"
        );
    }

    #[test]
    fn test_strips_control_characters() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.normalize_line("Bad\u{0007}bell\u{000B}"), "Badbell");
    }

    #[test]
    fn test_nfc_composition() {
        let normalizer = TextNormalizer::new();
        let decomposed = "Cafe\u{0301}";
        assert_eq!(normalizer.normalize_line(decomposed), "Caf\u{00E9}");
    }

    #[test]
    fn test_normalize_bullets_keeps_every_entry() {
        let normalizer = TextNormalizer::new();
        let bullets: Vec<String> = ["- Revenue up 12%", "", "* 3 new hires", "  two   words "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let normalized = normalizer.normalize_bullets(&bullets);
        assert_eq!(normalized.len(), bullets.len());
        assert_eq!(normalized, vec!["- Revenue up 12%", "", "* 3 new hires", "two words"]);
    }

    #[test]
    fn test_normalize_to_lines() {
        let normalizer = TextNormalizer::new();
        let lines = normalizer.normalize_to_lines("\nOpen strong.\n\n  Then   pause.\n");
        assert_eq!(lines, vec!["Open strong.", "", "Then pause."]);
        assert!(normalizer.normalize_to_lines("  \n ").is_empty());
    }
}
