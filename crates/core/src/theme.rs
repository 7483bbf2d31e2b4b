//! Fixed theme table shared by on-screen rendering and export.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of one of the supported themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    /// Dark corporate profile.
    #[default]
    Corporate,
    /// Light modern profile.
    Modern,
    /// Minimal light profile.
    Minimal,
    /// Elegant warm profile with a serif heading face.
    Elegant,
}

impl ThemeId {
    /// All themes in selector order.
    pub const ALL: [ThemeId; 4] = [
        ThemeId::Corporate,
        ThemeId::Modern,
        ThemeId::Minimal,
        ThemeId::Elegant,
    ];

    /// The selector string for this theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Corporate => "corporate",
            ThemeId::Modern => "modern",
            ThemeId::Minimal => "minimal",
            ThemeId::Elegant => "elegant",
        }
    }

    /// The color/typography profile for this theme.
    pub fn profile(&self) -> &'static ThemeProfile {
        &THEMES[*self as usize]
    }
}

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corporate" => Ok(ThemeId::Corporate),
            "modern" => Ok(ThemeId::Modern),
            "minimal" => Ok(ThemeId::Minimal),
            "elegant" => Ok(ThemeId::Elegant),
            _ => Err(Error::UnknownTheme(s.to_string())),
        }
    }
}

/// Colors are six-digit sRGB hex without a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeProfile {
    pub id: ThemeId,
    pub background_color: &'static str,
    pub text_color: &'static str,
    pub accent_color: &'static str,
    pub secondary_color: &'static str,
    /// Typeface for slide titles.
    pub heading_font: &'static str,
    /// Typeface for bullet text.
    pub body_font: &'static str,
}

impl ThemeProfile {
    /// Whether text is light on a dark background.
    pub fn is_dark(&self) -> bool {
        luminance(self.background_color) < luminance(self.text_color)
    }
}

// Indexed by `ThemeId as usize`.
static THEMES: [ThemeProfile; 4] = [
    ThemeProfile {
        id: ThemeId::Corporate,
        background_color: "0f172a",
        text_color: "ffffff",
        accent_color: "60a5fa",
        secondary_color: "94a3b8",
        heading_font: "Arial",
        body_font: "Arial",
    },
    ThemeProfile {
        id: ThemeId::Modern,
        background_color: "ffffff",
        text_color: "18181b",
        accent_color: "059669",
        secondary_color: "71717a",
        heading_font: "Arial",
        body_font: "Arial",
    },
    ThemeProfile {
        id: ThemeId::Minimal,
        background_color: "f8fafc",
        text_color: "000000",
        accent_color: "f97316",
        secondary_color: "a1a1aa",
        heading_font: "Arial",
        body_font: "Arial",
    },
    ThemeProfile {
        id: ThemeId::Elegant,
        background_color: "f5f5f4",
        text_color: "1c1917",
        accent_color: "78350f",
        secondary_color: "78716c",
        heading_font: "Georgia",
        body_font: "Arial",
    },
];

/// Lookup table from theme identifiers to profiles.
pub struct ThemeRegistry;

impl ThemeRegistry {
    /// Resolve a selector string to its profile.
    pub fn resolve(identifier: &str) -> Result<&'static ThemeProfile> {
        identifier.parse::<ThemeId>().map(|id| id.profile())
    }

    /// All profiles in selector order.
    pub fn profiles() -> &'static [ThemeProfile] {
        &THEMES
    }
}

/// Rough relative luminance of a hex color, 0..=255.
fn luminance(hex: &str) -> u32 {
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|c| u32::from_str_radix(c, 16).ok())
            .unwrap_or(0)
    };
    (channel(0..2) * 299 + channel(2..4) * 587 + channel(4..6) * 114) / 1000
}
