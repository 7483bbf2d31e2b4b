//! Slide and notes-slide parts.

use crate::layout::{
    centipoints, Frame, SlideLayout, BODY_FONT_SIZE_PT, BULLET_INDENT, BULLET_SPACING_PT,
    TITLE_FONT_SIZE_PT,
};
use crate::package::{
    relationships_xml, Rel, XmlResult, GROUP_SHAPE_HEADER, PML_NAMESPACES, XML_DECL,
};
use quick_xml::escape::escape;
use slidecraft_core::ThemeProfile;
use std::fmt::Write;

/// Relationship ids inside a slide's rels part.
const LAYOUT_REL_ID: &str = "rId1";
const NOTES_REL_ID: &str = "rId2";
const IMAGE_REL_ID: &str = "rId3";

const EMPTY_NOTES_PARAGRAPH: &str = r#"<a:p><a:endParaRPr lang="en-US" dirty="0"/></a:p>"#;

/// Normalized text and geometry for one slide.
pub(crate) struct SlideContent<'a> {
    pub title: String,
    pub bullets: Vec<String>,
    pub image_description: Option<&'a str>,
    pub layout: SlideLayout,
}

pub(crate) fn slide_xml(content: &SlideContent<'_>, theme: &ThemeProfile) -> XmlResult {
    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, "<p:sld {}>", PML_NAMESPACES)?;
    xml.push_str("<p:cSld>");

    // Background must come before spTree.
    write!(
        xml,
        r#"<p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        theme.background_color
    )?;

    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_SHAPE_HEADER);

    write_title(&mut xml, &content.title, &content.layout.title, theme)?;
    write_bullets(&mut xml, &content.bullets, &content.layout.body, theme)?;
    if let Some(frame) = &content.layout.image {
        write_picture(&mut xml, frame, content.image_description.unwrap_or(""))?;
    }

    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sld>");
    Ok(xml)
}

fn write_shape_header(xml: &mut String, id: u32, name: &str, frame: &Frame) -> std::fmt::Result {
    xml.push_str("<p:sp><p:nvSpPr>");
    write!(xml, r#"<p:cNvPr id="{}" name="{}"/>"#, id, name)?;
    xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);
    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/>"#);
    xml.push_str("</p:spPr>");
    Ok(())
}

fn write_xfrm(xml: &mut String, frame: &Frame) -> std::fmt::Result {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.cx, frame.cy
    )
}

fn write_run_props(
    xml: &mut String,
    size_pt: u32,
    bold: bool,
    color: &str,
    face: &str,
) -> std::fmt::Result {
    write!(xml, r#"<a:rPr lang="en-US" sz="{}""#, centipoints(size_pt))?;
    if bold {
        xml.push_str(r#" b="1""#);
    }
    xml.push_str(r#" dirty="0">"#);
    write!(xml, r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#, color)?;
    let face = escape(face);
    write!(xml, r#"<a:latin typeface="{}"/><a:cs typeface="{}"/>"#, face, face)?;
    xml.push_str("</a:rPr>");
    Ok(())
}

fn write_title(
    xml: &mut String,
    title: &str,
    frame: &Frame,
    theme: &ThemeProfile,
) -> std::fmt::Result {
    write_shape_header(xml, 2, "Title", frame)?;
    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0" anchor="ctr"/><a:lstStyle/>"#);
    xml.push_str("<a:p><a:r>");
    write_run_props(xml, TITLE_FONT_SIZE_PT, true, theme.text_color, theme.heading_font)?;
    write!(xml, "<a:t>{}</a:t>", escape(title))?;
    xml.push_str("</a:r></a:p>");
    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_bullets(
    xml: &mut String,
    bullets: &[String],
    frame: &Frame,
    theme: &ThemeProfile,
) -> std::fmt::Result {
    write_shape_header(xml, 3, "Content", frame)?;
    xml.push_str("<p:txBody>");
    xml.push_str(r#"<a:bodyPr wrap="square" rtlCol="0" anchor="t"/><a:lstStyle/>"#);

    if bullets.is_empty() {
        // A text body needs at least one paragraph.
        write!(
            xml,
            r#"<a:p><a:endParaRPr lang="en-US" sz="{}" dirty="0"/></a:p>"#,
            centipoints(BODY_FONT_SIZE_PT)
        )?;
    }

    for bullet in bullets {
        xml.push_str("<a:p>");
        write!(
            xml,
            r#"<a:pPr marL="{}" indent="-{}">"#,
            BULLET_INDENT, BULLET_INDENT
        )?;
        write!(
            xml,
            r#"<a:spcBef><a:spcPts val="{}"/></a:spcBef>"#,
            centipoints(BULLET_SPACING_PT)
        )?;
        write!(xml, r#"<a:buClr><a:srgbClr val="{}"/></a:buClr>"#, theme.text_color)?;
        xml.push_str(r#"<a:buFont typeface="Arial"/><a:buChar char="•"/>"#);
        xml.push_str("</a:pPr>");
        xml.push_str("<a:r>");
        write_run_props(xml, BODY_FONT_SIZE_PT, false, theme.text_color, theme.body_font)?;
        write!(xml, "<a:t>{}</a:t>", escape(bullet))?;
        xml.push_str("</a:r></a:p>");
    }

    xml.push_str("</p:txBody></p:sp>");
    Ok(())
}

fn write_picture(xml: &mut String, frame: &Frame, description: &str) -> std::fmt::Result {
    xml.push_str("<p:pic><p:nvPicPr>");
    write!(
        xml,
        r#"<p:cNvPr id="4" name="Image" descr="{}"/>"#,
        escape(description)
    )?;
    xml.push_str(r#"<p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/>"#);
    xml.push_str("</p:nvPicPr>");
    xml.push_str("<p:blipFill>");
    write!(xml, r#"<a:blip r:embed="{}"/>"#, IMAGE_REL_ID)?;
    xml.push_str("<a:stretch><a:fillRect/></a:stretch></p:blipFill>");
    xml.push_str("<p:spPr>");
    write_xfrm(xml, frame)?;
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom>"#);
    xml.push_str("</p:spPr></p:pic>");
    Ok(())
}

pub(crate) fn slide_rels_xml(number: usize, media_name: Option<&str>) -> XmlResult {
    let mut rels = vec![
        Rel::new(LAYOUT_REL_ID, "slideLayout", "../slideLayouts/slideLayout1.xml"),
        Rel::new(NOTES_REL_ID, "notesSlide", format!("../notesSlides/notesSlide{}.xml", number)),
    ];
    if let Some(name) = media_name {
        rels.push(Rel::new(IMAGE_REL_ID, "image", format!("../media/{}", name)));
    }
    relationships_xml(&rels)
}

/// Notes slide holding the speaker notes, one paragraph per line.
///
/// Blank lines become empty paragraphs.
pub(crate) fn notes_xml(lines: &[String]) -> XmlResult {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, "<p:notes {}>", PML_NAMESPACES)?;
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(GROUP_SHAPE_HEADER);

    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(r#"<p:cNvPr id="2" name="Notes Placeholder 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(r#"<p:nvPr><p:ph type="body" idx="1"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr/>");
    xml.push_str("<p:txBody><a:bodyPr/><a:lstStyle/>");
    if lines.is_empty() {
        xml.push_str(EMPTY_NOTES_PARAGRAPH);
    }
    for line in lines {
        if line.is_empty() {
            xml.push_str(EMPTY_NOTES_PARAGRAPH);
            continue;
        }
        write!(
            xml,
            r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
            escape(line)
        )?;
    }
    xml.push_str("</p:txBody></p:sp>");

    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:notes>");
    Ok(xml)
}

pub(crate) fn notes_rels_xml(number: usize) -> XmlResult {
    relationships_xml(&[
        Rel::new("rId1", "notesMaster", "../notesMasters/notesMaster1.xml"),
        Rel::new("rId2", "slide", format!("../slides/slide{}.xml", number)),
    ])
}
