//! `.pptx` serialisation: an OOXML PresentationML package (zip of XML parts).
//!
//! The package is the minimum PowerPoint, Keynote and LibreOffice all open:
//! one master, one blank layout, one theme, one part per slide and PNG media.
//! Fixed parts live in `parts`; everything that depends on the deck is
//! written here with `quick-xml`.
//!
//! [`save_deck`] writes to a temporary file next to the destination and
//! renames it into place, so a failed job never leaves a partial file.

use crate::deck::parts::*;
use crate::deck::{Deck, Paragraph, Rect, Shape, Slide, TextBox};
use crate::error::Pdf2PptxError;
use crate::model::TextAlign;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::borrow::Cow;
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Failure while assembling the package.
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("zip: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PackageError> for Pdf2PptxError {
    fn from(e: PackageError) -> Self {
        Pdf2PptxError::PackageFailed(e.to_string())
    }
}

/// Serialise `deck` and atomically write it to `dest`.
pub fn save_deck(deck: &Deck, title: &str, dest: &Path) -> Result<(), Pdf2PptxError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let write_failed = |source: std::io::Error| Pdf2PptxError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".pdf2pptx-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_failed)?;

    write_package(deck, title, tmp.as_file_mut())?;
    tmp.as_file_mut().sync_all().map_err(write_failed)?;
    tmp.persist(dest).map_err(|e| write_failed(e.error))?;

    info!(
        "Wrote {} ({} slides, {} shapes)",
        dest.display(),
        deck.slide_count(),
        deck.element_count()
    );
    Ok(())
}

/// Write the whole package into `out` and hand it back.
pub fn write_package<W: Write + Seek>(
    deck: &Deck,
    title: &str,
    out: W,
) -> Result<W, PackageError> {
    let mut zip = ZipWriter::new(out);
    let xml = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    // PNG is already compressed.
    let media = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let slides = deck.slide_count();

    put(&mut zip, "[Content_Types].xml", &content_types_xml(slides)?, xml)?;
    put(&mut zip, "_rels/.rels", &package_rels_xml()?, xml)?;
    put(&mut zip, "docProps/core.xml", &core_props_xml(title)?, xml)?;
    put(&mut zip, "docProps/app.xml", &app_props_xml(slides)?, xml)?;
    put(&mut zip, "ppt/presentation.xml", &presentation_xml(deck)?, xml)?;
    put(
        &mut zip,
        "ppt/_rels/presentation.xml.rels",
        &presentation_rels_xml(slides)?,
        xml,
    )?;
    put(&mut zip, "ppt/presProps.xml", PRES_PROPS.as_bytes(), xml)?;
    put(&mut zip, "ppt/tableStyles.xml", TABLE_STYLES.as_bytes(), xml)?;
    put(&mut zip, "ppt/theme/theme1.xml", THEME.as_bytes(), xml)?;
    put(
        &mut zip,
        "ppt/slideMasters/slideMaster1.xml",
        SLIDE_MASTER.as_bytes(),
        xml,
    )?;
    put(
        &mut zip,
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        SLIDE_MASTER_RELS.as_bytes(),
        xml,
    )?;
    put(
        &mut zip,
        "ppt/slideLayouts/slideLayout1.xml",
        SLIDE_LAYOUT.as_bytes(),
        xml,
    )?;
    put(
        &mut zip,
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        SLIDE_LAYOUT_RELS.as_bytes(),
        xml,
    )?;

    let mut image_no = 0usize;
    for (i, slide) in deck.slides.iter().enumerate() {
        let n = i + 1;
        let mut targets = Vec::new();
        for shape in &slide.shapes {
            if let Shape::Picture { png, .. } = shape {
                image_no += 1;
                let name = format!("image{image_no}.png");
                put(&mut zip, &format!("ppt/media/{name}"), png, media)?;
                targets.push(format!("../media/{name}"));
            }
        }
        put(
            &mut zip,
            &format!("ppt/slides/slide{n}.xml"),
            &slide_xml(slide)?,
            xml,
        )?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            &slide_rels_xml(&targets)?,
            xml,
        )?;
    }

    debug!("Package: {} slides, {} media parts", slides, image_no);
    Ok(zip.finish()?)
}

fn put<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    bytes: &[u8],
    options: SimpleFileOptions,
) -> Result<(), PackageError> {
    zip.start_file(name, options)?;
    zip.write_all(bytes)?;
    Ok(())
}

// ── XML helpers ──────────────────────────────────────────────────────────

type Xml = Writer<Cursor<Vec<u8>>>;

fn new_part() -> Result<Xml, PackageError> {
    let mut w = Writer::new(Cursor::new(Vec::new()));
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    Ok(w)
}

fn into_bytes(w: Xml) -> Vec<u8> {
    w.into_inner().into_inner()
}

fn element<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
    let mut e = BytesStart::new(name);
    for &(k, v) in attrs {
        e.push_attribute((k, v));
    }
    e
}

fn start(w: &mut Xml, name: &str, attrs: &[(&str, &str)]) -> Result<(), PackageError> {
    w.write_event(Event::Start(element(name, attrs)))?;
    Ok(())
}

fn empty(w: &mut Xml, name: &str, attrs: &[(&str, &str)]) -> Result<(), PackageError> {
    w.write_event(Event::Empty(element(name, attrs)))?;
    Ok(())
}

fn end(w: &mut Xml, name: &str) -> Result<(), PackageError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element(w: &mut Xml, name: &str, value: &str) -> Result<(), PackageError> {
    start(w, name, &[])?;
    w.write_event(Event::Text(BytesText::new(&xml_safe(value))))?;
    end(w, name)
}

/// Drop characters XML 1.0 cannot carry (PDF text often has stray controls).
fn xml_safe(s: &str) -> Cow<'_, str> {
    let ok = |c: char| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}');
    if s.chars().all(ok) {
        Cow::Borrowed(s)
    } else {
        Cow::Owned(s.chars().filter(|&c| ok(c)).collect())
    }
}

fn relationship(w: &mut Xml, id: &str, kind: &str, target: &str) -> Result<(), PackageError> {
    empty(
        w,
        "Relationship",
        &[("Id", id), ("Type", kind), ("Target", target)],
    )
}

// ── Package-level parts ──────────────────────────────────────────────────

fn content_types_xml(slides: usize) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(&mut w, "Types", &[("xmlns", NS_CONTENT_TYPES)])?;
    empty(&mut w, "Default", &[("Extension", "rels"), ("ContentType", CT_RELS)])?;
    empty(
        &mut w,
        "Default",
        &[("Extension", "xml"), ("ContentType", "application/xml")],
    )?;
    empty(
        &mut w,
        "Default",
        &[("Extension", "png"), ("ContentType", "image/png")],
    )?;

    let fixed = [
        ("/ppt/presentation.xml", CT_PRESENTATION),
        ("/ppt/slideMasters/slideMaster1.xml", CT_SLIDE_MASTER),
        ("/ppt/slideLayouts/slideLayout1.xml", CT_SLIDE_LAYOUT),
        ("/ppt/theme/theme1.xml", CT_THEME),
        ("/ppt/presProps.xml", CT_PRES_PROPS),
        ("/ppt/tableStyles.xml", CT_TABLE_STYLES),
        ("/docProps/core.xml", CT_CORE_PROPS),
        ("/docProps/app.xml", CT_EXTENDED_PROPS),
    ];
    for (part, ct) in fixed {
        empty(&mut w, "Override", &[("PartName", part), ("ContentType", ct)])?;
    }
    for n in 1..=slides {
        let part = format!("/ppt/slides/slide{n}.xml");
        empty(&mut w, "Override", &[("PartName", &part), ("ContentType", CT_SLIDE)])?;
    }

    end(&mut w, "Types")?;
    Ok(into_bytes(w))
}

fn package_rels_xml() -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(&mut w, "Relationships", &[("xmlns", NS_RELS)])?;
    relationship(&mut w, "rId1", REL_OFFICE_DOCUMENT, "ppt/presentation.xml")?;
    relationship(&mut w, "rId2", REL_CORE_PROPS, "docProps/core.xml")?;
    relationship(&mut w, "rId3", REL_EXTENDED_PROPS, "docProps/app.xml")?;
    end(&mut w, "Relationships")?;
    Ok(into_bytes(w))
}

fn core_props_xml(title: &str) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(
        &mut w,
        "cp:coreProperties",
        &[
            (
                "xmlns:cp",
                "http://schemas.openxmlformats.org/package/2006/metadata/core-properties",
            ),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ],
    )?;
    text_element(&mut w, "dc:title", title)?;
    text_element(&mut w, "dc:creator", env!("CARGO_PKG_NAME"))?;
    end(&mut w, "cp:coreProperties")?;
    Ok(into_bytes(w))
}

fn app_props_xml(slides: usize) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(
        &mut w,
        "Properties",
        &[(
            "xmlns",
            "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties",
        )],
    )?;
    text_element(
        &mut w,
        "Application",
        concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION")),
    )?;
    text_element(&mut w, "Slides", &slides.to_string())?;
    end(&mut w, "Properties")?;
    Ok(into_bytes(w))
}

fn presentation_xml(deck: &Deck) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(
        &mut w,
        "p:presentation",
        &[
            ("xmlns:a", NS_A),
            ("xmlns:r", NS_R),
            ("xmlns:p", NS_P),
            ("saveSubsetFonts", "1"),
        ],
    )?;

    start(&mut w, "p:sldMasterIdLst", &[])?;
    empty(&mut w, "p:sldMasterId", &[("id", "2147483648"), ("r:id", "rId1")])?;
    end(&mut w, "p:sldMasterIdLst")?;

    if !deck.slides.is_empty() {
        start(&mut w, "p:sldIdLst", &[])?;
        for i in 0..deck.slide_count() {
            let id = (256 + i).to_string();
            let rid = format!("rId{}", i + 2);
            empty(&mut w, "p:sldId", &[("id", &id), ("r:id", &rid)])?;
        }
        end(&mut w, "p:sldIdLst")?;
    }

    let (cx, cy) = (deck.width_emu.to_string(), deck.height_emu.to_string());
    empty(&mut w, "p:sldSz", &[("cx", &cx), ("cy", &cy)])?;
    empty(&mut w, "p:notesSz", &[("cx", "6858000"), ("cy", "9144000")])?;

    end(&mut w, "p:presentation")?;
    Ok(into_bytes(w))
}

/// rId1 master, rId2.. slides, then props, table styles and theme.
fn presentation_rels_xml(slides: usize) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(&mut w, "Relationships", &[("xmlns", NS_RELS)])?;
    relationship(&mut w, "rId1", REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml")?;
    for n in 1..=slides {
        let id = format!("rId{}", n + 1);
        relationship(&mut w, &id, REL_SLIDE, &format!("slides/slide{n}.xml"))?;
    }
    let tail = [
        (REL_PRES_PROPS, "presProps.xml"),
        (REL_TABLE_STYLES, "tableStyles.xml"),
        (REL_THEME, "theme/theme1.xml"),
    ];
    for (k, (kind, target)) in tail.into_iter().enumerate() {
        let id = format!("rId{}", slides + 2 + k);
        relationship(&mut w, &id, kind, target)?;
    }
    end(&mut w, "Relationships")?;
    Ok(into_bytes(w))
}

// ── Slides ───────────────────────────────────────────────────────────────

/// rId1 is the layout; pictures follow as rId2.. in shape order.
fn slide_rels_xml(picture_targets: &[String]) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(&mut w, "Relationships", &[("xmlns", NS_RELS)])?;
    relationship(
        &mut w,
        "rId1",
        REL_SLIDE_LAYOUT,
        "../slideLayouts/slideLayout1.xml",
    )?;
    for (k, target) in picture_targets.iter().enumerate() {
        relationship(&mut w, &format!("rId{}", k + 2), REL_IMAGE, target)?;
    }
    end(&mut w, "Relationships")?;
    Ok(into_bytes(w))
}

fn slide_xml(slide: &Slide) -> Result<Vec<u8>, PackageError> {
    let mut w = new_part()?;
    start(
        &mut w,
        "p:sld",
        &[("xmlns:a", NS_A), ("xmlns:r", NS_R), ("xmlns:p", NS_P)],
    )?;
    start(&mut w, "p:cSld", &[])?;

    if let Some(bg) = slide.background {
        start(&mut w, "p:bg", &[])?;
        start(&mut w, "p:bgPr", &[])?;
        solid_fill(&mut w, &bg.to_hex())?;
        empty(&mut w, "a:effectLst", &[])?;
        end(&mut w, "p:bgPr")?;
        end(&mut w, "p:bg")?;
    }

    start(&mut w, "p:spTree", &[])?;
    start(&mut w, "p:nvGrpSpPr", &[])?;
    empty(&mut w, "p:cNvPr", &[("id", "1"), ("name", "")])?;
    empty(&mut w, "p:cNvGrpSpPr", &[])?;
    empty(&mut w, "p:nvPr", &[])?;
    end(&mut w, "p:nvGrpSpPr")?;
    start(&mut w, "p:grpSpPr", &[])?;
    start(&mut w, "a:xfrm", &[])?;
    empty(&mut w, "a:off", &[("x", "0"), ("y", "0")])?;
    empty(&mut w, "a:ext", &[("cx", "0"), ("cy", "0")])?;
    empty(&mut w, "a:chOff", &[("x", "0"), ("y", "0")])?;
    empty(&mut w, "a:chExt", &[("cx", "0"), ("cy", "0")])?;
    end(&mut w, "a:xfrm")?;
    end(&mut w, "p:grpSpPr")?;

    let mut picture_rel = 1usize;
    for (k, shape) in slide.shapes.iter().enumerate() {
        let id = k + 2;
        match shape {
            Shape::Text(tb) => write_text_box(&mut w, id, tb)?,
            Shape::Rectangle { rect, fill } => {
                write_rectangle(&mut w, id, rect, fill.map(|c| c.to_hex()).as_deref())?
            }
            Shape::Picture { rect, .. } => {
                picture_rel += 1;
                write_picture(&mut w, id, rect, &format!("rId{picture_rel}"))?
            }
        }
    }

    end(&mut w, "p:spTree")?;
    end(&mut w, "p:cSld")?;
    start(&mut w, "p:clrMapOvr", &[])?;
    empty(&mut w, "a:masterClrMapping", &[])?;
    end(&mut w, "p:clrMapOvr")?;
    end(&mut w, "p:sld")?;
    Ok(into_bytes(w))
}

fn solid_fill(w: &mut Xml, hex: &str) -> Result<(), PackageError> {
    start(w, "a:solidFill", &[])?;
    empty(w, "a:srgbClr", &[("val", hex)])?;
    end(w, "a:solidFill")
}

fn xfrm(w: &mut Xml, rect: &Rect) -> Result<(), PackageError> {
    let (x, y) = (rect.x.to_string(), rect.y.to_string());
    let (cx, cy) = (rect.cx.to_string(), rect.cy.to_string());
    start(w, "a:xfrm", &[])?;
    empty(w, "a:off", &[("x", &x), ("y", &y)])?;
    empty(w, "a:ext", &[("cx", &cx), ("cy", &cy)])?;
    end(w, "a:xfrm")
}

fn rect_geometry(w: &mut Xml) -> Result<(), PackageError> {
    start(w, "a:prstGeom", &[("prst", "rect")])?;
    empty(w, "a:avLst", &[])?;
    end(w, "a:prstGeom")
}

fn non_visual(w: &mut Xml, id: usize, name: &str) -> Result<(), PackageError> {
    let id = id.to_string();
    let name = format!("{name} {}", id);
    empty(w, "p:cNvPr", &[("id", &id), ("name", &name)])
}

fn write_rectangle(
    w: &mut Xml,
    id: usize,
    rect: &Rect,
    fill: Option<&str>,
) -> Result<(), PackageError> {
    start(w, "p:sp", &[])?;
    start(w, "p:nvSpPr", &[])?;
    non_visual(w, id, "Rectangle")?;
    empty(w, "p:cNvSpPr", &[])?;
    empty(w, "p:nvPr", &[])?;
    end(w, "p:nvSpPr")?;

    start(w, "p:spPr", &[])?;
    xfrm(w, rect)?;
    rect_geometry(w)?;
    match fill {
        Some(hex) => solid_fill(w, hex)?,
        None => empty(w, "a:noFill", &[])?,
    }
    start(w, "a:ln", &[])?;
    empty(w, "a:noFill", &[])?;
    end(w, "a:ln")?;
    end(w, "p:spPr")?;
    end(w, "p:sp")
}

fn write_picture(w: &mut Xml, id: usize, rect: &Rect, rel_id: &str) -> Result<(), PackageError> {
    start(w, "p:pic", &[])?;
    start(w, "p:nvPicPr", &[])?;
    non_visual(w, id, "Picture")?;
    start(w, "p:cNvPicPr", &[])?;
    empty(w, "a:picLocks", &[("noChangeAspect", "1")])?;
    end(w, "p:cNvPicPr")?;
    empty(w, "p:nvPr", &[])?;
    end(w, "p:nvPicPr")?;

    start(w, "p:blipFill", &[])?;
    empty(w, "a:blip", &[("r:embed", rel_id)])?;
    start(w, "a:stretch", &[])?;
    empty(w, "a:fillRect", &[])?;
    end(w, "a:stretch")?;
    end(w, "p:blipFill")?;

    start(w, "p:spPr", &[])?;
    xfrm(w, rect)?;
    rect_geometry(w)?;
    end(w, "p:spPr")?;
    end(w, "p:pic")
}

fn write_text_box(w: &mut Xml, id: usize, tb: &TextBox) -> Result<(), PackageError> {
    start(w, "p:sp", &[])?;
    start(w, "p:nvSpPr", &[])?;
    non_visual(w, id, "TextBox")?;
    empty(w, "p:cNvSpPr", &[("txBox", "1")])?;
    empty(w, "p:nvPr", &[])?;
    end(w, "p:nvSpPr")?;

    start(w, "p:spPr", &[])?;
    xfrm(w, &tb.rect)?;
    rect_geometry(w)?;
    empty(w, "a:noFill", &[])?;
    end(w, "p:spPr")?;

    start(w, "p:txBody", &[])?;
    empty(w, "a:bodyPr", &[("wrap", "square"), ("rtlCol", "0")])?;
    empty(w, "a:lstStyle", &[])?;
    if tb.paragraphs.is_empty() {
        empty(w, "a:p", &[])?;
    }
    for p in &tb.paragraphs {
        write_paragraph(w, p)?;
    }
    end(w, "p:txBody")?;
    end(w, "p:sp")
}

fn write_paragraph(w: &mut Xml, p: &Paragraph) -> Result<(), PackageError> {
    let algn = match p.alignment {
        TextAlign::Left => "l",
        TextAlign::Center => "ctr",
        TextAlign::Right => "r",
    };
    let size = p.style.size_hundredths.to_string();
    let bold = if p.style.bold { "1" } else { "0" };
    let italic = if p.style.italic { "1" } else { "0" };
    let run_attrs = [
        ("lang", "en-US"),
        ("sz", size.as_str()),
        ("b", bold),
        ("i", italic),
        ("dirty", "0"),
    ];

    start(w, "a:p", &[])?;
    empty(w, "a:pPr", &[("algn", algn)])?;

    if p.text.is_empty() {
        empty(w, "a:endParaRPr", &run_attrs)?;
    } else {
        start(w, "a:r", &[])?;
        start(w, "a:rPr", &run_attrs)?;
        solid_fill(w, &p.style.color.to_hex())?;
        if let Some(ref family) = p.style.font_family {
            let face = xml_safe(family);
            empty(w, "a:latin", &[("typeface", &face)])?;
            empty(w, "a:cs", &[("typeface", &face)])?;
        }
        end(w, "a:rPr")?;
        text_element(w, "a:t", &p.text)?;
        end(w, "a:r")?;
    }

    end(w, "a:p")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::units::Rgb;
    use crate::deck::RunStyle;
    use std::io::Read;

    fn sample_deck() -> Deck {
        let style = RunStyle {
            size_hundredths: 2400,
            color: Rgb { r: 0x33, g: 0x33, b: 0x33 },
            bold: true,
            italic: false,
            font_family: Some("Roboto".into()),
        };
        let rect = Rect {
            x: 100,
            y: 200,
            cx: 3000,
            cy: 4000,
        };
        let png = crate::pipeline::encode::png_bytes(&image::DynamicImage::ImageRgb8(
            image::RgbImage::new(2, 2),
        ))
        .unwrap();

        let mut deck = Deck::new(9_144_000, 6_858_000);
        deck.slides.push(Slide {
            background: Some(Rgb::WHITE),
            shapes: vec![
                Shape::Rectangle {
                    rect,
                    fill: Some(Rgb { r: 0x2C, g: 0x3E, b: 0x50 }),
                },
                Shape::Text(TextBox {
                    rect,
                    paragraphs: vec![
                        Paragraph {
                            text: "Q3 <Results> & \u{0}plans".into(),
                            style: style.clone(),
                            alignment: TextAlign::Center,
                        },
                        Paragraph {
                            text: String::new(),
                            style,
                            alignment: TextAlign::Left,
                        },
                    ],
                }),
                Shape::Picture {
                    rect,
                    png: png.clone(),
                },
            ],
        });
        deck.slides.push(Slide {
            background: None,
            shapes: vec![Shape::Picture { rect, png }],
        });
        deck
    }

    fn read_part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut s = String::new();
        archive
            .by_name(name)
            .unwrap_or_else(|_| panic!("missing part {name}"))
            .read_to_string(&mut s)
            .unwrap();
        s
    }

    fn written(deck: &Deck) -> zip::ZipArchive<Cursor<Vec<u8>>> {
        let out = write_package(deck, "Quarterly", Cursor::new(Vec::new())).unwrap();
        zip::ZipArchive::new(Cursor::new(out.into_inner())).unwrap()
    }

    #[test]
    fn package_has_every_required_part() {
        let mut archive = written(&sample_deck());
        for name in [
            "[Content_Types].xml",
            "_rels/.rels",
            "docProps/core.xml",
            "docProps/app.xml",
            "ppt/presentation.xml",
            "ppt/_rels/presentation.xml.rels",
            "ppt/presProps.xml",
            "ppt/tableStyles.xml",
            "ppt/theme/theme1.xml",
            "ppt/slideMasters/slideMaster1.xml",
            "ppt/slideMasters/_rels/slideMaster1.xml.rels",
            "ppt/slideLayouts/slideLayout1.xml",
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
            "ppt/slides/slide1.xml",
            "ppt/slides/slide2.xml",
            "ppt/slides/_rels/slide1.xml.rels",
            "ppt/media/image1.png",
            "ppt/media/image2.png",
        ] {
            assert!(archive.by_name(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn presentation_carries_canvas_and_slide_list() {
        let mut archive = written(&sample_deck());
        let pres = read_part(&mut archive, "ppt/presentation.xml");
        assert!(pres.contains(r#"<p:sldSz cx="9144000" cy="6858000"/>"#));
        assert_eq!(pres.matches("<p:sldId ").count(), 2);

        let types = read_part(&mut archive, "[Content_Types].xml");
        assert!(types.contains("/ppt/slides/slide2.xml"));
    }

    #[test]
    fn slide_xml_keeps_paint_order_and_escapes_text() {
        let mut archive = written(&sample_deck());
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");

        let rect = slide.find("Rectangle 2").unwrap();
        let text = slide.find("TextBox 3").unwrap();
        let pic = slide.find("Picture 4").unwrap();
        assert!(rect < text && text < pic);

        assert!(slide.contains("Q3 &lt;Results&gt; &amp; plans"));
        assert!(slide.contains(r#"<a:srgbClr val="2C3E50"/>"#));
        assert!(slide.contains(r#"algn="ctr""#));
        assert!(slide.contains(r#"sz="2400""#));
        assert!(slide.contains(r#"typeface="Roboto""#));
        assert!(slide.contains("<a:endParaRPr"));
        assert!(slide.contains(r#"r:embed="rId2""#));

        let rels = read_part(&mut archive, "ppt/slides/_rels/slide1.xml.rels");
        assert!(rels.contains("../media/image1.png"));
    }

    #[test]
    fn unfilled_rectangle_is_transparent() {
        let mut deck = Deck::new(9_144_000, 6_858_000);
        deck.slides.push(Slide {
            background: None,
            shapes: vec![Shape::Rectangle {
                rect: Rect {
                    x: 0,
                    y: 0,
                    cx: 100_000,
                    cy: 100_000,
                },
                fill: None,
            }],
        });
        let mut archive = written(&deck);
        let slide = read_part(&mut archive, "ppt/slides/slide1.xml");
        assert!(slide.contains("<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/>"));
        assert!(!slide.contains("<p:bg>"));
    }

    #[test]
    fn save_deck_writes_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.pptx");
        save_deck(&sample_deck(), "Quarterly", &dest).unwrap();
        assert!(dest.exists());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn save_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing").join("out.pptx");
        let err = save_deck(&sample_deck(), "x", &dest).unwrap_err();
        assert!(matches!(err, Pdf2PptxError::OutputWriteFailed { .. }));
        assert!(!dest.exists());
    }
}
