//! Read-back of `.pptx` packages.
//!
//! Used by the CLI `inspect` command and by the export tests to check what a
//! presentation viewer would see: slide order, backgrounds, frames and notes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Serialize;
use slidecraft_core::{Error, Result};
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

const SLIDE_REL_SUFFIX: &str = "/relationships/slide";
const NOTES_REL_SUFFIX: &str = "/relationships/notesSlide";

/// Kind of a positioned element on a slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Text,
    Picture,
}

/// A shape or picture with its position and text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShapeFrame {
    pub name: String,
    pub kind: FrameKind,
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
    /// Paragraph texts in document order, empty paragraphs included.
    pub paragraphs: Vec<String>,
    /// Texts of the paragraphs that carry a bullet glyph (`a:buChar`).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
    /// Alt text (`descr`), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ShapeFrame {
    fn new(kind: FrameKind) -> Self {
        Self {
            name: String::new(),
            kind,
            x: 0,
            y: 0,
            cx: 0,
            cy: 0,
            paragraphs: Vec::new(),
            bullets: Vec::new(),
            description: None,
        }
    }
}

/// One slide as read back from the package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectedSlide {
    pub number: usize,
    pub path: String,
    /// Solid background color as `rrggbb`.
    pub background: Option<String>,
    pub frames: Vec<ShapeFrame>,
    pub notes: Option<String>,
}

impl InspectedSlide {
    /// First frame with the given name.
    pub fn frame(&self, name: &str) -> Option<&ShapeFrame> {
        self.frames.iter().find(|f| f.name == name)
    }

    /// Text of the title frame.
    pub fn title(&self) -> Option<&str> {
        self.frame("Title")
            .and_then(|f| f.paragraphs.first())
            .map(String::as_str)
    }

    /// Bulleted paragraphs of the content frame.
    pub fn bullets(&self) -> Vec<&str> {
        self.frame("Content")
            .map(|f| f.bullets.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn picture(&self) -> Option<&ShapeFrame> {
        self.frames.iter().find(|f| f.kind == FrameKind::Picture)
    }
}

/// Summary of a whole package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectedDeck {
    /// `dc:title` from the core properties.
    pub title: Option<String>,
    pub slides: Vec<InspectedSlide>,
    /// Media part names, sorted.
    pub media: Vec<String>,
}

/// Reader for PPTX (Office Open XML) packages.
pub struct PptxInspector;

impl PptxInspector {
    /// Create a new PPTX inspector.
    pub fn new() -> Self {
        Self
    }

    /// Inspect a package from a reader.
    pub fn inspect<R: Read + Seek>(&self, reader: R) -> Result<InspectedDeck> {
        let mut archive =
            ZipArchive::new(reader).map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let title = if archive.by_name("docProps/core.xml").is_ok() {
            let core = read_part(&mut archive, "docProps/core.xml")?;
            parse_core_title(&core)?
        } else {
            None
        };

        let slide_paths = self.slide_order(&mut archive)?;
        log::debug!("Package lists {} slides", slide_paths.len());

        let mut slides = Vec::with_capacity(slide_paths.len());
        for (idx, path) in slide_paths.into_iter().enumerate() {
            slides.push(self.inspect_slide(&mut archive, path, idx + 1)?);
        }

        let mut media: Vec<String> = archive
            .file_names()
            .filter(|name| name.starts_with("ppt/media/"))
            .map(str::to_string)
            .collect();
        media.sort();

        Ok(InspectedDeck { title, slides, media })
    }

    /// Ordered slide part paths.
    ///
    /// `sldIdLst` in `presentation.xml` is authoritative; when it is missing the
    /// slide relationships are sorted by the number in their id or target.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels = read_relationships(archive, "ppt/_rels/presentation.xml.rels")?;
        let presentation = read_part(archive, "ppt/presentation.xml")?;
        let listed = parse_slide_id_list(&presentation)?;

        let by_id: HashMap<&str, &Relationship> = rels.iter().map(|r| (r.id.as_str(), r)).collect();

        if !listed.is_empty() {
            return listed
                .iter()
                .map(|rid| {
                    by_id
                        .get(rid.as_str())
                        .map(|rel| resolve_target("ppt", &rel.target))
                        .ok_or_else(|| Error::XmlError(format!("Slide relationship '{}' is missing", rid)))
                })
                .collect();
        }

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|r| r.kind.ends_with(SLIDE_REL_SUFFIX))
            .map(|r| {
                let order = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_target("ppt", &r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    fn inspect_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: String,
        number: usize,
    ) -> Result<InspectedSlide> {
        let content = read_part(archive, &path)?;
        let (background, frames) = parse_slide_xml(&content)?;

        let (dir, file) = split_part_path(&path);
        let rels_path = format!("{}/_rels/{}.rels", dir, file);
        let notes = if archive.by_name(&rels_path).is_ok() {
            let rels = read_relationships(archive, &rels_path)?;
            match rels.iter().find(|r| r.kind.ends_with(NOTES_REL_SUFFIX)) {
                Some(rel) => {
                    let notes_path = resolve_target(dir, &rel.target);
                    let xml = read_part(archive, &notes_path)?;
                    parse_notes_xml(&xml)?
                }
                None => None,
            }
        } else {
            None
        };

        Ok(InspectedSlide {
            number,
            path,
            background,
            frames,
            notes,
        })
    }
}

impl Default for PptxInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    kind: String,
    target: String,
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

fn read_relationships<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<Relationship>> {
    let content = read_part(archive, path)?;
    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    let mut rels = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if e.name().as_ref() == b"Relationship" => {
                rels.push(Relationship {
                    id: attr(e, b"Id").unwrap_or_default(),
                    kind: attr(e, b"Type").unwrap_or_default(),
                    target: attr(e, b"Target").unwrap_or_default(),
                });
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing '{}': {}", path, e)));
            }
            _ => {}
        }
    }
    Ok(rels)
}

fn parse_core_title(xml: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut in_title = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"title" => in_title = true,
            Ok(Event::End(ref e)) if local_name(e.name().as_ref()) == b"title" => in_title = false,
            Ok(Event::Text(ref e)) if in_title => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::XmlError(format!("Error parsing core properties: {}", e)))?;
                return Ok(Some(text.into_owned()));
            }
            Ok(Event::Eof) => return Ok(None),
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing core properties: {}", e)));
            }
            _ => {}
        }
    }
}

/// Relationship ids from `<p:sldIdLst>`, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut ids = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) if local_name(e.name().as_ref()) == b"sldId" => {
                if let Some(rid) = attr(e, b"r:id") {
                    ids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing presentation: {}", e)));
            }
            _ => {}
        }
    }
    Ok(ids)
}

/// Background color and frames of a slide.
fn parse_slide_xml(xml: &str) -> Result<(Option<String>, Vec<ShapeFrame>)> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut background = None;
    let mut frames = Vec::new();

    let mut in_bg = false;
    let mut in_xfrm = false;
    let mut current: Option<ShapeFrame> = None;
    let mut paragraph: Option<String> = None;
    let mut bulleted = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::XmlError(format!("Error parsing slide: {}", e)))?;

        match event {
            Event::Start(ref e) => match local_name(e.name().as_ref()) {
                b"bg" => in_bg = true,
                b"sp" => current = Some(ShapeFrame::new(FrameKind::Text)),
                b"pic" => current = Some(ShapeFrame::new(FrameKind::Picture)),
                b"xfrm" => in_xfrm = true,
                b"p" => {
                    if current.is_some() {
                        paragraph = Some(String::new());
                        bulleted = false;
                    }
                }
                other => apply_element(other, e, in_bg, in_xfrm, &mut background, current.as_mut()),
            },
            Event::Empty(ref e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if local == b"buChar" && paragraph.is_some() {
                    bulleted = true;
                }
                apply_element(local, e, in_bg, in_xfrm, &mut background, current.as_mut());
            }
            Event::Text(ref e) => {
                if let Some(text) = paragraph.as_mut() {
                    let value = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Error parsing slide text: {}", e)))?;
                    text.push_str(&value);
                }
            }
            Event::End(ref e) => match local_name(e.name().as_ref()) {
                b"bg" => in_bg = false,
                b"xfrm" => in_xfrm = false,
                b"p" => {
                    if let (Some(text), Some(shape)) = (paragraph.take(), current.as_mut()) {
                        let text = text.trim().to_string();
                        if bulleted {
                            shape.bullets.push(text.clone());
                        }
                        shape.paragraphs.push(text);
                    }
                }
                b"sp" | b"pic" => {
                    if let Some(shape) = current.take() {
                        frames.push(shape);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok((background, frames))
}

fn apply_element(
    name: &[u8],
    e: &BytesStart<'_>,
    in_bg: bool,
    in_xfrm: bool,
    background: &mut Option<String>,
    shape: Option<&mut ShapeFrame>,
) {
    if in_bg {
        if name == b"srgbClr" && background.is_none() {
            *background = attr(e, b"val");
        }
        return;
    }

    let Some(shape) = shape else {
        return;
    };

    match name {
        b"cNvPr" => {
            shape.name = attr(e, b"name").unwrap_or_default();
            shape.description = attr(e, b"descr").filter(|d| !d.is_empty());
        }
        b"off" if in_xfrm => {
            shape.x = attr_i64(e, b"x");
            shape.y = attr_i64(e, b"y");
        }
        b"ext" if in_xfrm => {
            shape.cx = attr_i64(e, b"cx");
            shape.cy = attr_i64(e, b"cy");
        }
        _ => {}
    }
}

/// Speaker notes text, one line per paragraph.
///
/// Empty paragraphs between lines are kept as blank lines.
fn parse_notes_xml(xml: &str) -> Result<Option<String>> {
    let (_, frames) = parse_slide_xml(xml)?;
    let lines: Vec<&str> = frames
        .iter()
        .filter(|f| f.kind == FrameKind::Text)
        .flat_map(|f| f.paragraphs.iter().map(String::as_str))
        .collect();

    let text = lines.join("\n");
    let text = text.trim_matches('\n');
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text.to_string()))
    }
}

fn attr(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| match a.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
        })
}

fn attr_i64(e: &BytesStart<'_>, key: &[u8]) -> i64 {
    attr(e, key).and_then(|v| v.parse().ok()).unwrap_or(0)
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let start = s
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i)?;
    s[start..].parse().ok()
}

/// Directory and file name of a part path.
fn split_part_path(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}

/// Resolve a relationship target against the source part's directory.
fn resolve_target(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
