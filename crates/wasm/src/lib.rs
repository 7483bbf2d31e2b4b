//! Browser bindings.
//!
//! Exposes the theme table for live slide rendering and the PPTX exporter so
//! the download can be produced client-side.

use serde::Serialize;
use slidecraft_core::{Deck, ThemeRegistry};
use slidecraft_pptx::{ExportArtifact, InspectedDeck, PptxInspector, PptxWriter};
use std::io::Cursor;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Compact view of an exported file, for previews and checks in the page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionResult {
    pub title: Option<String>,
    pub slide_count: usize,
    pub slides: Vec<SlideSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSummary {
    pub title: Option<String>,
    pub bullets: Vec<String>,
    pub notes: Option<String>,
    pub background: Option<String>,
    pub has_image: bool,
}

impl From<InspectedDeck> for InspectionResult {
    fn from(deck: InspectedDeck) -> Self {
        let slides = deck
            .slides
            .iter()
            .map(|s| SlideSummary {
                title: s.title().map(str::to_string),
                bullets: s.bullets().into_iter().map(str::to_string).collect(),
                notes: s.notes.clone(),
                background: s.background.clone(),
                has_image: s.picture().is_some(),
            })
            .collect::<Vec<_>>();
        Self {
            title: deck.title,
            slide_count: slides.len(),
            slides,
        }
    }
}

/// Export a deck to `.pptx`.
///
/// # Arguments
/// * `deck` - Deck object (`{ title, slides: [{ id, title, content, speakerNotes, ... }] }`)
/// * `theme` - One of `corporate`, `modern`, `minimal`, `elegant`
///
/// # Returns
/// `{ fileName, bytes }` with `bytes` as a `Uint8Array`, or throws on error.
#[wasm_bindgen]
pub fn export_deck(deck: JsValue, theme: &str) -> Result<JsValue, JsValue> {
    let deck: Deck = serde_wasm_bindgen::from_value(deck)
        .map_err(|e| JsValue::from_str(&format!("Invalid deck: {}", e)))?;

    let artifact = export_deck_impl(&deck, theme).map_err(|e| JsValue::from_str(&e))?;

    let result = js_sys::Object::new();
    js_sys::Reflect::set(&result, &"fileName".into(), &JsValue::from_str(&artifact.file_name))?;
    let bytes = js_sys::Uint8Array::from(artifact.bytes.as_slice());
    js_sys::Reflect::set(&result, &"bytes".into(), &bytes.into())?;
    Ok(result.into())
}

fn export_deck_impl(deck: &Deck, theme: &str) -> Result<ExportArtifact, String> {
    let profile = ThemeRegistry::resolve(theme).map_err(|e| e.to_string())?;
    PptxWriter::new()
        .export(deck, profile)
        .map_err(|e| e.to_string())
}

/// All theme profiles in selector order.
#[wasm_bindgen]
pub fn list_themes() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(ThemeRegistry::profiles())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Download file name for a deck title.
#[wasm_bindgen]
pub fn export_file_name(title: &str) -> String {
    slidecraft_core::export_file_name(title)
}

/// Read a `.pptx` back into a summary.
#[wasm_bindgen]
pub fn inspect_pptx(data: &[u8]) -> Result<JsValue, JsValue> {
    let result = inspect_pptx_impl(data).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&result)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn inspect_pptx_impl(data: &[u8]) -> Result<InspectionResult, String> {
    // Local file header signature
    if !data.starts_with(b"PK\x03\x04") {
        return Err("Not a PPTX file".to_string());
    }

    let deck = PptxInspector::new()
        .inspect(Cursor::new(data))
        .map_err(|e| format!("PPTX parsing error: {}", e))?;
    Ok(deck.into())
}
