//! PPTX (Office Open XML) export for SlideCraft decks.
//!
//! [`PptxWriter`] turns a deck and a theme into a 16:9 `.pptx` package;
//! [`PptxInspector`] reads a package back for display and verification.

pub mod inspector;
pub mod layout;
pub mod media;
mod package;
mod slide;
pub mod writer;

pub use inspector::{FrameKind, InspectedDeck, InspectedSlide, PptxInspector, ShapeFrame};
pub use layout::{Frame, SlideLayout};
pub use media::{EmbeddedImage, ImageFormat};
pub use writer::{ExportArtifact, PackagePart, PptxWriter};
