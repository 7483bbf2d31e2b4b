//! Core domain types, theme registry, text normalization, and the
//! interactive session state machine for SlideCraft.

pub mod error;
pub mod normalize;
pub mod session;
pub mod theme;
pub mod types;

pub use error::{Error, Result};
pub use normalize::{export_file_name, export_file_stem, TextNormalizer, FILE_NAME_SEPARATOR};
pub use session::{ImageTicket, ImageUpdate, Session, SAMPLE_TEXT};
pub use theme::{ThemeId, ThemeProfile, ThemeRegistry};
pub use types::{Deck, ImagePayload, Slide};
