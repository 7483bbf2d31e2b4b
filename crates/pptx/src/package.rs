//! Package-level parts: content types, relationships, presentation, master,
//! layout, theme, notes master, and document properties.

use crate::layout::{NOTES_HEIGHT, NOTES_WIDTH, SLIDE_HEIGHT, SLIDE_WIDTH};
use crate::media::ImageFormat;
use quick_xml::escape::escape;
use slidecraft_core::ThemeProfile;
use std::collections::BTreeSet;
use std::fmt::Write;

pub(crate) type XmlResult = std::result::Result<String, std::fmt::Error>;

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Namespace declarations shared by PresentationML parts.
pub(crate) const PML_NAMESPACES: &str = concat!(
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#,
);

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

/// Application name written to document properties.
const APPLICATION: &str = "SlideCraft";

/// Empty group-shape header every `spTree` starts with.
pub(crate) const GROUP_SHAPE_HEADER: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#,
);

const CLR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
    r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
    r#"hlink="hlink" folHlink="folHlink"/>"#,
);

/// Relationship id of the first slide in `presentation.xml.rels`.
pub(crate) fn slide_rel_id(number: usize) -> String {
    // rId1 is the slide master.
    format!("rId{}", number + 1)
}

/// One `<Relationship>` entry.
pub(crate) struct Rel<'a> {
    pub id: String,
    pub kind: &'a str,
    pub target: String,
}

impl<'a> Rel<'a> {
    pub fn new(id: impl Into<String>, kind: &'a str, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            target: target.into(),
        }
    }
}

/// Serialize a relationships part. `kind` is the last segment of the
/// officeDocument relationship type (e.g. `slide`), or a full URI.
pub(crate) fn relationships_xml(rels: &[Rel<'_>]) -> XmlResult {
    let mut xml = String::with_capacity(256 + rels.len() * 160);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{}">"#, REL_NS)?;
    for rel in rels {
        let rel_type = if rel.kind.starts_with("http") {
            rel.kind.to_string()
        } else {
            format!("{}/{}", REL_TYPE_BASE, rel.kind)
        };
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id,
            rel_type,
            escape(&rel.target)
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

pub(crate) fn content_types_xml(slide_count: usize, image_formats: &BTreeSet<ImageFormat>) -> XmlResult {
    let mut xml = String::with_capacity(2048 + slide_count * 300);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    for format in image_formats {
        write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            format.extension(),
            format.content_type()
        )?;
    }

    let mut overrides: Vec<(String, &str)> = vec![
        ("/ppt/presentation.xml".into(), "presentationml.presentation.main+xml"),
        ("/ppt/slideMasters/slideMaster1.xml".into(), "presentationml.slideMaster+xml"),
        ("/ppt/slideLayouts/slideLayout1.xml".into(), "presentationml.slideLayout+xml"),
        ("/ppt/notesMasters/notesMaster1.xml".into(), "presentationml.notesMaster+xml"),
        ("/ppt/theme/theme1.xml".into(), "theme+xml"),
        ("/ppt/theme/theme2.xml".into(), "theme+xml"),
        ("/ppt/presProps.xml".into(), "presentationml.presProps+xml"),
        ("/ppt/viewProps.xml".into(), "presentationml.viewProps+xml"),
        ("/ppt/tableStyles.xml".into(), "presentationml.tableStyles+xml"),
        ("/docProps/app.xml".into(), "extended-properties+xml"),
    ];
    for n in 1..=slide_count {
        overrides.push((format!("/ppt/slides/slide{}.xml", n), "presentationml.slide+xml"));
        overrides.push((
            format!("/ppt/notesSlides/notesSlide{}.xml", n),
            "presentationml.notesSlide+xml",
        ));
    }
    for (part, kind) in &overrides {
        write!(
            xml,
            r#"<Override PartName="{}" ContentType="{}.{}"/>"#,
            part, CT_BASE, kind
        )?;
    }
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str("</Types>");
    Ok(xml)
}

pub(crate) fn root_rels_xml() -> XmlResult {
    relationships_xml(&[
        Rel::new("rId1", "officeDocument", "ppt/presentation.xml"),
        Rel::new(
            "rId2",
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml",
        ),
        Rel::new("rId3", "extended-properties", "docProps/app.xml"),
    ])
}

pub(crate) fn app_props_xml(slide_count: usize) -> XmlResult {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#);
    xml.push_str(r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#);
    write!(xml, "<Application>{}</Application>", APPLICATION)?;
    xml.push_str("<PresentationFormat>On-screen Show (16:9)</PresentationFormat>");
    write!(xml, "<Slides>{}</Slides><Notes>{}</Notes>", slide_count, slide_count)?;
    xml.push_str("</Properties>");
    Ok(xml)
}

/// Core properties carry no timestamps so repeated exports are byte-identical.
pub(crate) fn core_props_xml(title: &str) -> XmlResult {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#);
    xml.push_str(r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#);
    xml.push_str(r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#);
    write!(xml, "<dc:title>{}</dc:title>", escape(title))?;
    write!(xml, "<dc:creator>{}</dc:creator>", APPLICATION)?;
    write!(xml, "<cp:lastModifiedBy>{}</cp:lastModifiedBy>", APPLICATION)?;
    xml.push_str("<cp:revision>1</cp:revision>");
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

pub(crate) fn presentation_xml(slide_count: usize) -> XmlResult {
    let mut xml = String::with_capacity(1024 + slide_count * 48);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:presentation {} saveSubsetFonts="1">"#, PML_NAMESPACES)?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    write!(
        xml,
        r#"<p:notesMasterIdLst><p:notesMasterId r:id="{}"/></p:notesMasterIdLst>"#,
        notes_master_rel_id(slide_count)
    )?;
    xml.push_str("<p:sldIdLst>");
    for n in 1..=slide_count {
        write!(xml, r#"<p:sldId id="{}" r:id="{}"/>"#, 255 + n, slide_rel_id(n))?;
    }
    xml.push_str("</p:sldIdLst>");
    write!(xml, r#"<p:sldSz cx="{}" cy="{}"/>"#, SLIDE_WIDTH, SLIDE_HEIGHT)?;
    write!(xml, r#"<p:notesSz cx="{}" cy="{}"/>"#, NOTES_WIDTH, NOTES_HEIGHT)?;
    xml.push_str("</p:presentation>");
    Ok(xml)
}

fn notes_master_rel_id(slide_count: usize) -> String {
    format!("rId{}", slide_count + 2)
}

pub(crate) fn presentation_rels_xml(slide_count: usize) -> XmlResult {
    let mut rels = vec![Rel::new("rId1", "slideMaster", "slideMasters/slideMaster1.xml")];
    for n in 1..=slide_count {
        rels.push(Rel::new(slide_rel_id(n), "slide", format!("slides/slide{}.xml", n)));
    }
    let next = slide_count + 2;
    rels.push(Rel::new(notes_master_rel_id(slide_count), "notesMaster", "notesMasters/notesMaster1.xml"));
    rels.push(Rel::new(format!("rId{}", next + 1), "presProps", "presProps.xml"));
    rels.push(Rel::new(format!("rId{}", next + 2), "viewProps", "viewProps.xml"));
    rels.push(Rel::new(format!("rId{}", next + 3), "theme", "theme/theme1.xml"));
    rels.push(Rel::new(format!("rId{}", next + 4), "tableStyles", "tableStyles.xml"));
    relationships_xml(&rels)
}

pub(crate) fn pres_props_xml() -> String {
    format!("{}<p:presentationPr {}/>", XML_DECL, PML_NAMESPACES)
}

pub(crate) fn view_props_xml() -> String {
    format!(
        r#"{}<p:viewPr {}><p:gridSpacing cx="76200" cy="76200"/></p:viewPr>"#,
        XML_DECL, PML_NAMESPACES
    )
}

pub(crate) fn table_styles_xml() -> String {
    format!(
        r#"{}<a:tblStyleLst xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" def="{{5C22544A-7EE6-4342-B048-85BDC9FD1C3A}}"/>"#,
        XML_DECL
    )
}

/// Slide master: themed background, color map, and minimal text styles.
pub(crate) fn slide_master_xml() -> String {
    let mut xml = String::with_capacity(1536);
    xml.push_str(XML_DECL);
    xml.push_str(&format!("<p:sldMaster {}>", PML_NAMESPACES));
    xml.push_str("<p:cSld>");
    xml.push_str(r#"<p:bg><p:bgPr><a:solidFill><a:schemeClr val="bg1"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#);
    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_SHAPE_HEADER);
    xml.push_str("</p:spTree>");
    xml.push_str("</p:cSld>");
    xml.push_str(CLR_MAP);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("<p:txStyles>");
    xml.push_str(r#"<p:titleStyle><a:lvl1pPr><a:defRPr sz="3600"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mj-lt"/></a:defRPr></a:lvl1pPr></p:titleStyle>"#);
    xml.push_str(r#"<p:bodyStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill><a:latin typeface="+mn-lt"/></a:defRPr></a:lvl1pPr></p:bodyStyle>"#);
    xml.push_str(r#"<p:otherStyle><a:lvl1pPr><a:defRPr sz="1800"><a:solidFill><a:schemeClr val="tx1"/></a:solidFill></a:defRPr></a:lvl1pPr></p:otherStyle>"#);
    xml.push_str("</p:txStyles>");
    xml.push_str("</p:sldMaster>");
    xml
}

pub(crate) fn slide_master_rels_xml() -> XmlResult {
    relationships_xml(&[
        Rel::new("rId1", "slideLayout", "../slideLayouts/slideLayout1.xml"),
        Rel::new("rId2", "theme", "../theme/theme1.xml"),
    ])
}

/// The single blank layout every slide uses.
pub(crate) fn slide_layout_xml() -> String {
    let mut xml = String::with_capacity(768);
    xml.push_str(XML_DECL);
    xml.push_str(&format!(r#"<p:sldLayout {} type="blank" preserve="1">"#, PML_NAMESPACES));
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(GROUP_SHAPE_HEADER);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>");
    xml.push_str("</p:sldLayout>");
    xml
}

pub(crate) fn slide_layout_rels_xml() -> XmlResult {
    relationships_xml(&[Rel::new("rId1", "slideMaster", "../slideMasters/slideMaster1.xml")])
}

pub(crate) fn notes_master_xml() -> XmlResult {
    let mut xml = String::with_capacity(1536);
    xml.push_str(XML_DECL);
    write!(xml, "<p:notesMaster {}>", PML_NAMESPACES)?;
    xml.push_str("<p:cSld>");
    xml.push_str(r#"<p:bg><p:bgPr><a:solidFill><a:schemeClr val="bg1"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#);
    xml.push_str("<p:spTree>");
    xml.push_str(GROUP_SHAPE_HEADER);
    xml.push_str("<p:sp><p:nvSpPr>");
    xml.push_str(r#"<p:cNvPr id="2" name="Notes Placeholder 1"/>"#);
    xml.push_str(r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr>"#);
    xml.push_str(r#"<p:nvPr><p:ph type="body" sz="quarter" idx="1"/></p:nvPr>"#);
    xml.push_str("</p:nvSpPr><p:spPr><a:xfrm>");
    // Lower half of the portrait notes page, 0.75in side margins.
    write!(
        xml,
        r#"<a:off x="685800" y="{}"/><a:ext cx="{}" cy="{}"/>"#,
        NOTES_HEIGHT / 2 - 228_600,
        NOTES_WIDTH - 2 * 685_800,
        NOTES_HEIGHT * 9 / 20
    )?;
    xml.push_str(r#"</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr>"#);
    xml.push_str(r#"<p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:endParaRPr lang="en-US"/></a:p></p:txBody>"#);
    xml.push_str("</p:sp>");
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(CLR_MAP);
    xml.push_str("</p:notesMaster>");
    Ok(xml)
}

pub(crate) fn notes_master_rels_xml() -> XmlResult {
    relationships_xml(&[Rel::new("rId1", "theme", "../theme/theme2.xml")])
}

/// Accent colors 2–6 are shared by every theme; only accent1 follows the profile.
const EXTRA_ACCENTS: [&str; 5] = ["64748b", "0ea5e9", "10b981", "f59e0b", "ef4444"];

/// DrawingML theme generated from a profile: dk1 is the text color, lt1 the
/// background, accent1 the accent, and the major/minor fonts the heading/body faces.
pub(crate) fn theme_xml(profile: &ThemeProfile) -> XmlResult {
    let name = profile.id.as_str();
    let mut xml = String::with_capacity(3072);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="SlideCraft {}">"#,
        name
    )?;
    xml.push_str("<a:themeElements>");

    write!(xml, r#"<a:clrScheme name="{}">"#, name)?;
    let scheme = [
        ("dk1", profile.text_color),
        ("lt1", profile.background_color),
        ("dk2", profile.secondary_color),
        ("lt2", profile.background_color),
        ("accent1", profile.accent_color),
        ("accent2", EXTRA_ACCENTS[0]),
        ("accent3", EXTRA_ACCENTS[1]),
        ("accent4", EXTRA_ACCENTS[2]),
        ("accent5", EXTRA_ACCENTS[3]),
        ("accent6", EXTRA_ACCENTS[4]),
        ("hlink", profile.accent_color),
        ("folHlink", profile.secondary_color),
    ];
    for (slot, color) in scheme {
        write!(xml, r#"<a:{slot}><a:srgbClr val="{color}"/></a:{slot}>"#)?;
    }
    xml.push_str("</a:clrScheme>");

    write!(xml, r#"<a:fontScheme name="{}">"#, name)?;
    for (tag, face) in [("majorFont", profile.heading_font), ("minorFont", profile.body_font)] {
        write!(
            xml,
            r#"<a:{tag}><a:latin typeface="{}"/><a:ea typeface=""/><a:cs typeface=""/></a:{tag}>"#,
            escape(face)
        )?;
    }
    xml.push_str("</a:fontScheme>");

    xml.push_str(r#"<a:fmtScheme name="SlideCraft">"#);
    let solid = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    xml.push_str("<a:fillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        write!(xml, r#"<a:ln w="{}">{}</a:ln>"#, width, solid)?;
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(solid);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme>");

    xml.push_str("</a:themeElements>");
    xml.push_str("<a:objectDefaults/><a:extraClrSchemeLst/>");
    xml.push_str("</a:theme>");
    Ok(xml)
}
