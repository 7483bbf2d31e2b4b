//! PPTX export serializer.

use crate::layout::SlideLayout;
use crate::media::{EmbeddedImage, ImageFormat};
use crate::package;
use crate::slide::{self, SlideContent};
use slidecraft_core::{
    export_file_name, Deck, Error, Result, TextNormalizer, ThemeProfile, FILE_NAME_SEPARATOR,
};
use std::collections::BTreeSet;
use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::{Component, Path, PathBuf};
use zip::write::FileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// One file inside the package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePart {
    /// Path inside the archive, without a leading slash.
    pub name: String,
    pub data: Vec<u8>,
}

impl PackagePart {
    fn xml(name: impl Into<String>, xml: String) -> Self {
        Self {
            name: name.into(),
            data: xml.into_bytes(),
        }
    }
}

/// A finished presentation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// File name derived from the deck title, e.g. `Q1_Plan.pptx`.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its file name.
    ///
    /// Path separators in the name become `_`, so the file always lands
    /// directly inside `dir`. The bytes go to a temporary sibling first and
    /// are renamed into place, so a failed write never leaves a truncated
    /// `.pptx` behind.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        let name = self.disk_file_name()?;
        let path = dir.join(&name);
        if path.parent() != Some(dir) {
            return Err(Error::ExportFailure(format!(
                "Refusing to write '{}' outside {}",
                self.file_name,
                dir.display()
            )));
        }
        self.write_to_path(&path)
    }

    /// File name safe to create on disk: a single normal path component.
    pub fn disk_file_name(&self) -> Result<String> {
        let name = self.file_name.replace(['/', '\\'], FILE_NAME_SEPARATOR);
        let mut components = Path::new(&name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(name),
            _ => Err(Error::ExportFailure(format!(
                "'{}' is not a usable file name",
                self.file_name
            ))),
        }
    }

    /// Write the artifact to an explicit path.
    pub fn write_to_path(&self, path: &Path) -> Result<PathBuf> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".part");
        let tmp = PathBuf::from(tmp);

        let outcome = fs::write(&tmp, &self.bytes).and_then(|_| fs::rename(&tmp, path));
        if let Err(e) = outcome {
            let _ = fs::remove_file(&tmp);
            return Err(Error::ExportFailure(format!(
                "Failed to write {}: {}",
                path.display(),
                e
            )));
        }

        log::debug!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(path.to_path_buf())
    }
}

/// Serializer from a deck and theme to a `.pptx` package.
#[derive(Debug, Clone)]
pub struct PptxWriter {
    text: TextNormalizer,
    notes: TextNormalizer,
}

impl PptxWriter {
    /// Create a new PPTX writer.
    pub fn new() -> Self {
        Self {
            text: TextNormalizer::new(),
            notes: TextNormalizer::new().with_preserve_line_breaks(true),
        }
    }

    /// Export a deck to an in-memory `.pptx` file.
    pub fn export(&self, deck: &Deck, theme: &ThemeProfile) -> Result<ExportArtifact> {
        let cursor = self.write(deck, theme, Cursor::new(Vec::new()))?;
        Ok(ExportArtifact {
            file_name: export_file_name(&deck.title),
            bytes: cursor.into_inner(),
        })
    }

    /// Write the package to any seekable writer and hand the writer back.
    pub fn write<W: Write + Seek>(
        &self,
        deck: &Deck,
        theme: &ThemeProfile,
        writer: W,
    ) -> Result<W> {
        let parts = self.build_parts(deck, theme)?;

        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default());

        let mut zip = ZipWriter::new(writer);
        for part in &parts {
            zip.start_file(part.name.as_str(), options)
                .map_err(|e| Error::ExportFailure(format!("Failed to add '{}': {}", part.name, e)))?;
            zip.write_all(&part.data)
                .map_err(|e| Error::ExportFailure(format!("Failed to write '{}': {}", part.name, e)))?;
        }

        zip.finish()
            .map_err(|e| Error::ExportFailure(format!("Failed to finish archive: {}", e)))
    }

    /// Build every package part in archive order.
    ///
    /// All images are decoded before anything is serialized, so a malformed
    /// payload fails the export without producing output.
    pub fn build_parts(&self, deck: &Deck, theme: &ThemeProfile) -> Result<Vec<PackagePart>> {
        deck.ensure_exportable()?;

        let images = deck
            .slides
            .iter()
            .map(|s| match s.generated_image_url.as_deref() {
                Some(uri) if s.has_image() => EmbeddedImage::from_data_uri(uri).map(Some),
                _ => Ok(None),
            })
            .collect::<Result<Vec<_>>>()?;

        let formats: BTreeSet<ImageFormat> = images.iter().flatten().map(|i| i.format).collect();
        let count = deck.len();

        let mut parts = vec![
            PackagePart::xml(
                "[Content_Types].xml",
                package::content_types_xml(count, &formats).map_err(xml_err)?,
            ),
            PackagePart::xml("_rels/.rels", package::root_rels_xml().map_err(xml_err)?),
            PackagePart::xml("docProps/app.xml", package::app_props_xml(count).map_err(xml_err)?),
            PackagePart::xml(
                "docProps/core.xml",
                package::core_props_xml(&self.text.normalize_line(&deck.title)).map_err(xml_err)?,
            ),
            PackagePart::xml(
                "ppt/presentation.xml",
                package::presentation_xml(count).map_err(xml_err)?,
            ),
            PackagePart::xml(
                "ppt/_rels/presentation.xml.rels",
                package::presentation_rels_xml(count).map_err(xml_err)?,
            ),
            PackagePart::xml("ppt/presProps.xml", package::pres_props_xml()),
            PackagePart::xml("ppt/viewProps.xml", package::view_props_xml()),
            PackagePart::xml("ppt/tableStyles.xml", package::table_styles_xml()),
            PackagePart::xml("ppt/slideMasters/slideMaster1.xml", package::slide_master_xml()),
            PackagePart::xml(
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                package::slide_master_rels_xml().map_err(xml_err)?,
            ),
            PackagePart::xml("ppt/slideLayouts/slideLayout1.xml", package::slide_layout_xml()),
            PackagePart::xml(
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
                package::slide_layout_rels_xml().map_err(xml_err)?,
            ),
            PackagePart::xml("ppt/theme/theme1.xml", package::theme_xml(theme).map_err(xml_err)?),
            PackagePart::xml(
                "ppt/notesMasters/notesMaster1.xml",
                package::notes_master_xml().map_err(xml_err)?,
            ),
            PackagePart::xml(
                "ppt/notesMasters/_rels/notesMaster1.xml.rels",
                package::notes_master_rels_xml().map_err(xml_err)?,
            ),
            PackagePart::xml(
                "ppt/theme/theme2.xml",
                package::theme_xml(slidecraft_core::ThemeId::Modern.profile()).map_err(xml_err)?,
            ),
        ];

        let mut media_index = 0;
        for (idx, (source, image)) in deck.slides.iter().zip(images).enumerate() {
            let number = idx + 1;
            let content = SlideContent {
                title: self.text.normalize_line(&source.title),
                bullets: self.text.normalize_bullets(&source.content),
                image_description: source.image_prompt(),
                layout: SlideLayout::for_slide(image.is_some()),
            };

            log::debug!(
                "Slide {}: '{}' ({} bullets, image: {})",
                number,
                content.title,
                content.bullets.len(),
                image.is_some()
            );

            let media_name = image.as_ref().map(|img| {
                media_index += 1;
                format!("image{}.{}", media_index, img.format.extension())
            });

            parts.push(PackagePart::xml(
                format!("ppt/slides/slide{}.xml", number),
                slide::slide_xml(&content, theme).map_err(xml_err)?,
            ));
            parts.push(PackagePart::xml(
                format!("ppt/slides/_rels/slide{}.xml.rels", number),
                slide::slide_rels_xml(number, media_name.as_deref()).map_err(xml_err)?,
            ));

            let notes = self.notes.normalize_to_lines(&source.speaker_notes);
            parts.push(PackagePart::xml(
                format!("ppt/notesSlides/notesSlide{}.xml", number),
                slide::notes_xml(&notes).map_err(xml_err)?,
            ));
            parts.push(PackagePart::xml(
                format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", number),
                slide::notes_rels_xml(number).map_err(xml_err)?,
            ));

            if let (Some(name), Some(img)) = (media_name, image) {
                parts.push(PackagePart {
                    name: format!("ppt/media/{}", name),
                    data: img.bytes,
                });
            }
        }

        log::debug!("Built {} package parts for '{}'", parts.len(), deck.title);
        Ok(parts)
    }
}

impl Default for PptxWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn xml_err(e: std::fmt::Error) -> Error {
    Error::ExportFailure(format!("Failed to format XML: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::{FrameKind, PptxInspector};
    use crate::layout::SLIDE_WIDTH;
    use crate::media::PIXEL_PNG;
    use slidecraft_core::{ImagePayload, Slide, ThemeId, ThemeRegistry};

    fn pixel() -> ImagePayload {
        ImagePayload::new("image/png", PIXEL_PNG)
    }

    fn q1_plan() -> Deck {
        Deck::new("Q1 Plan").with_slide(
            Slide::new("s1", "Intro")
                .with_bullets(["A", "B"])
                .with_notes("n1"),
        )
    }

    fn mixed_deck() -> Deck {
        Deck::new("Strategic   Roadmap 2025")
            .with_slide(Slide::new("s1", "Landscape").with_bullets(["Edge AI", "SaaS pivot"]).with_notes("Open"))
            .with_slide(
                Slide::new("s2", "Objectives")
                    .with_bullets(["Carbon neutral", "APAC +18%", "LLM automation"])
                    .with_notes("Middle\nSecond line")
                    .with_image_description("Wind turbines at dawn")
                    .with_image(&pixel()),
            )
            .with_slide(Slide::new("s3", "Conclusion").with_bullets(["Grow"]).with_notes("Close"))
    }

    fn export_and_inspect(deck: &Deck, theme: ThemeId) -> (ExportArtifact, crate::InspectedDeck) {
        let artifact = PptxWriter::new().export(deck, theme.profile()).unwrap();
        let inspected = PptxInspector::new()
            .inspect(Cursor::new(artifact.bytes.clone()))
            .unwrap();
        (artifact, inspected)
    }

    #[test]
    fn test_q1_plan_scenario() {
        let (artifact, inspected) = export_and_inspect(&q1_plan(), ThemeId::Minimal);

        assert_eq!(artifact.file_name, "Q1_Plan.pptx");
        assert_eq!(inspected.slides.len(), 1);
        assert_eq!(inspected.title.as_deref(), Some("Q1 Plan"));

        let slide = &inspected.slides[0];
        assert_eq!(slide.background.as_deref(), Some("f8fafc"));
        assert_eq!(slide.title(), Some("Intro"));
        assert_eq!(slide.bullets(), vec!["A", "B"]);
        assert!(slide.notes.as_deref().unwrap().contains("n1"));
        assert!(slide.picture().is_none());

        let body = slide.frame("Content").unwrap();
        assert_eq!(body.cx * 100 / SLIDE_WIDTH, 90);
    }

    #[test]
    fn test_slide_count_and_order_for_every_theme() {
        let deck = mixed_deck();
        for profile in ThemeRegistry::profiles() {
            let (_, inspected) = export_and_inspect(&deck, profile.id);
            let titles: Vec<_> = inspected.slides.iter().map(|s| s.title().unwrap_or("")).collect();
            assert_eq!(titles, vec!["Landscape", "Objectives", "Conclusion"]);
            for slide in &inspected.slides {
                assert_eq!(slide.background.as_deref(), Some(profile.background_color));
            }
        }
    }

    #[test]
    fn test_layout_branches_on_image() {
        let (_, inspected) = export_and_inspect(&mixed_deck(), ThemeId::Corporate);

        for (slide, has_image) in inspected.slides.iter().zip([false, true, false]) {
            let body = slide.frame("Content").unwrap();
            if has_image {
                let picture = slide.picture().unwrap();
                assert_eq!(body.cx * 100 / SLIDE_WIDTH, 50);
                assert_eq!(picture.cx * 100 / SLIDE_WIDTH, 40);
                assert_eq!(picture.y, body.y);
                assert!(picture.x >= body.x + body.cx);
            } else {
                assert_eq!(body.cx * 100 / SLIDE_WIDTH, 90);
                assert!(slide.frames.iter().all(|f| f.kind != FrameKind::Picture));
            }
        }
    }

    #[test]
    fn test_image_is_embedded() {
        let parts = PptxWriter::new()
            .build_parts(&mixed_deck(), ThemeId::Modern.profile())
            .unwrap();
        let media: Vec<_> = parts.iter().filter(|p| p.name.starts_with("ppt/media/")).collect();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].name, "ppt/media/image1.png");
        assert_eq!(&media[0].data[1..4], b"PNG");

        let rels = parts
            .iter()
            .find(|p| p.name == "ppt/slides/_rels/slide2.xml.rels")
            .unwrap();
        assert!(String::from_utf8_lossy(&rels.data).contains("../media/image1.png"));
    }

    #[test]
    fn test_export_is_byte_identical() {
        let writer = PptxWriter::new();
        let deck = mixed_deck();
        let theme = ThemeId::Elegant.profile();
        let first = writer.export(&deck, theme).unwrap();
        let second = writer.export(&deck, theme).unwrap();
        assert_eq!(first.bytes, second.bytes);
    }

    #[test]
    fn test_export_does_not_mutate_deck() {
        let deck = mixed_deck();
        let snapshot = deck.clone();
        PptxWriter::new().export(&deck, ThemeId::Corporate.profile()).unwrap();
        assert_eq!(deck, snapshot);
    }

    #[test]
    fn test_notes_keep_line_breaks() {
        let (_, inspected) = export_and_inspect(&mixed_deck(), ThemeId::Modern);
        assert_eq!(inspected.slides[1].notes.as_deref(), Some("Middle\nSecond line"));
    }

    #[test]
    fn test_malformed_image_fails_export() {
        let mut deck = q1_plan();
        deck.slides[0].generated_image_url = Some("data:image/png;base64,@@@".to_string());
        match PptxWriter::new().export(&deck, ThemeId::Modern.profile()) {
            Err(Error::ExportFailure(_)) => {}
            other => panic!("expected ExportFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_preconditions() {
        let writer = PptxWriter::new();
        let theme = ThemeId::Modern.profile();
        assert!(matches!(
            writer.export(&Deck::new("No slides"), theme),
            Err(Error::InvalidDeck(_))
        ));
        assert!(matches!(
            writer.export(&Deck::new("").with_slide(Slide::new("a", "A")), theme),
            Err(Error::InvalidDeck(_))
        ));
    }

    #[test]
    fn test_bullet_text_is_normalized() {
        let deck = Deck::new("Clean").with_slide(
            Slide::new("s1", "Messy  title")
                .with_bullets(["• Already bulleted", "  spaced   out ", ""])
                .with_notes(""),
        );
        let (_, inspected) = export_and_inspect(&deck, ThemeId::Modern);
        let slide = &inspected.slides[0];
        assert_eq!(slide.title(), Some("Messy title"));
        assert_eq!(slide.bullets().len(), deck.slides[0].content.len());
        assert_eq!(slide.bullets(), vec!["• Already bulleted", "spaced out", ""]);
        assert_eq!(slide.notes, None);
    }

    #[test]
    fn test_every_content_entry_is_a_bullet() {
        let deck = Deck::new("Hiring").with_slide(
            Slide::new("s1", "Update").with_bullets(["- Revenue up 12%", "", "* 3 new hires"]),
        );
        let (_, inspected) = export_and_inspect(&deck, ThemeId::Corporate);
        assert_eq!(
            inspected.slides[0].bullets(),
            vec!["- Revenue up 12%", "", "* 3 new hires"]
        );
    }

    #[test]
    fn test_empty_content_has_no_bullets() {
        let deck = Deck::new("Bare").with_slide(Slide::new("s1", "Only a title"));
        let (_, inspected) = export_and_inspect(&deck, ThemeId::Minimal);
        assert!(inspected.slides[0].bullets().is_empty());
    }

    #[test]
    fn test_notes_keep_blank_lines() {
        let deck = Deck::new("Talk").with_slide(
            Slide::new("s1", "Intro").with_notes("Open strong.\n\nThen pause."),
        );
        let (_, inspected) = export_and_inspect(&deck, ThemeId::Elegant);
        assert_eq!(inspected.slides[0].notes.as_deref(), Some("Open strong.\n\nThen pause."));
    }

    #[test]
    fn test_write_to_dir() {
        let dir = std::env::temp_dir().join(format!("slidecraft-export-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let artifact = PptxWriter::new().export(&q1_plan(), ThemeId::Minimal.profile()).unwrap();
        let path = artifact.write_to_dir(&dir).unwrap();

        assert_eq!(path.file_name().unwrap(), "Q1_Plan.pptx");
        assert_eq!(fs::read(&path).unwrap(), artifact.bytes);
        assert!(!dir.join("Q1_Plan.pptx.part").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    fn artifact_for(title: &str) -> ExportArtifact {
        let deck = Deck::new(title).with_slide(Slide::new("s1", "Intro"));
        PptxWriter::new().export(&deck, ThemeId::Minimal.profile()).unwrap()
    }

    #[test]
    fn test_write_to_dir_with_slash_in_title() {
        let dir = std::env::temp_dir().join(format!("slidecraft-slash-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let artifact = artifact_for("2024/2025 Roadmap");
        assert_eq!(artifact.file_name, "2024/2025_Roadmap.pptx");

        let path = artifact.write_to_dir(&dir).unwrap();
        assert_eq!(path, dir.join("2024_2025_Roadmap.pptx"));
        assert_eq!(fs::read(&path).unwrap(), artifact.bytes);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_to_dir_stays_inside_dir() {
        let root = std::env::temp_dir().join(format!("slidecraft-escape-{}", std::process::id()));
        let dir = root.join("exports");
        fs::create_dir_all(&dir).unwrap();

        let artifact = artifact_for("../x");
        assert_eq!(artifact.file_name, "../x.pptx");

        let path = artifact.write_to_dir(&dir).unwrap();
        assert_eq!(path.parent(), Some(dir.as_path()));
        assert_eq!(path.file_name().unwrap(), ".._x.pptx");
        assert!(!root.join("x.pptx").exists());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_disk_file_name_rejects_dot_components() {
        for name in ["", ".", ".."] {
            let artifact = ExportArtifact {
                file_name: name.to_string(),
                bytes: Vec::new(),
            };
            assert!(matches!(artifact.disk_file_name(), Err(Error::ExportFailure(_))));
        }
        let artifact = artifact_for("a\\b");
        assert_eq!(artifact.disk_file_name().unwrap(), "a_b.pptx");
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let artifact = PptxWriter::new().export(&q1_plan(), ThemeId::Minimal.profile()).unwrap();
        let missing = std::env::temp_dir().join("slidecraft-no-such-dir").join("nested");
        assert!(matches!(
            artifact.write_to_dir(&missing),
            Err(Error::ExportFailure(_))
        ));
    }
}
