//! The three deck build strategies, one per extraction method.
//!
//! | Method              | Canvas                          | Content                       |
//! |---------------------|---------------------------------|-------------------------------|
//! | direct extraction   | first page's point size         | text boxes, then pictures     |
//! | vision extraction   | widescreen 13.333 × 7.5 in      | elements in reply order       |
//! | raster fallback     | widescreen 13.333 × 7.5 in      | one full-bleed picture        |
//!
//! Every builder rejects an empty input with [`Pdf2PptxError::BuildInput`]:
//! the orchestrator never selects a tier without data, so an empty sequence
//! here is a bug upstream. Shapes keep input order, which is paint order.

use crate::deck::units::{
    clamp_slide_dimension, hex_to_rgb, percent_of, pt_to_emu, MIN_DOCUMENT_BOX_PT,
    MIN_VISION_BOX_EMU, WIDESCREEN_HEIGHT_EMU, WIDESCREEN_WIDTH_EMU,
};
use crate::deck::{Deck, Paragraph, Rect, RunStyle, Shape, Slide, TextBox};
use crate::error::Pdf2PptxError;
use crate::model::{
    DocumentPage, PageBitmap, PageRaster, PercentRect, TextAlign, TextRun, VisionElement,
    VisionLayout,
};
use crate::pipeline::encode::png_bytes;
use image::DynamicImage;
use tracing::debug;

/// Font sizes outside this range (points) are clamped.
const MIN_FONT_PT: f32 = 1.0;
const MAX_FONT_PT: f32 = 4000.0;

// ── Direct extraction ────────────────────────────────────────────────────

/// Build from direct-extraction pages.
///
/// The first page sets the canvas for the whole deck.
pub fn build_from_document_pages(pages: &[DocumentPage]) -> Result<Deck, Pdf2PptxError> {
    let first = pages.first().ok_or(Pdf2PptxError::BuildInput {
        strategy: "document",
    })?;

    let mut deck = Deck::new(
        canvas_dimension(first.width_pt),
        canvas_dimension(first.height_pt),
    );

    for page in pages {
        let mut slide = Slide {
            background: Some(hex_to_rgb(&page.background_color_hex)),
            shapes: Vec::with_capacity(page.text_runs.len() + page.image_regions.len()),
        };

        for run in &page.text_runs {
            slide.shapes.push(Shape::Text(text_box_from_run(run)));
        }

        for region in &page.image_regions {
            let rect = Rect {
                x: pt_to_emu(region.x),
                y: pt_to_emu(region.y),
                cx: pt_to_emu(region.width).max(1),
                cy: pt_to_emu(region.height).max(1),
            };
            slide
                .shapes
                .push(picture(&region.bitmap, rect, page.page_num)?);
        }

        debug!(
            "Slide {}: {} shapes from document page",
            deck.slides.len() + 1,
            slide.shapes.len()
        );
        deck.slides.push(slide);
    }

    Ok(deck)
}

/// Page size in EMU, clamped only when outside the legal slide range.
fn canvas_dimension(pt: f32) -> i64 {
    clamp_slide_dimension(pt_to_emu(pt))
}

fn text_box_from_run(run: &TextRun) -> TextBox {
    TextBox {
        rect: Rect {
            x: pt_to_emu(run.x),
            y: pt_to_emu(run.y),
            cx: pt_to_emu(run.width.max(MIN_DOCUMENT_BOX_PT)),
            cy: pt_to_emu(run.height.max(MIN_DOCUMENT_BOX_PT)),
        },
        paragraphs: vec![Paragraph {
            text: run.text.clone(),
            style: RunStyle {
                size_hundredths: font_size_hundredths(run.font_size),
                color: hex_to_rgb(&run.color_hex),
                bold: run.bold,
                italic: run.italic,
                font_family: sanitize_font_family(&run.font_family),
            },
            alignment: TextAlign::Left,
        }],
    }
}

/// Strip a subset prefix (`ABCDEF+`) and a style suffix (`-Bold`).
///
/// `ABCDEF+Roboto-BoldItalic` → `Roboto`. Empty results are `None`.
pub fn sanitize_font_family(raw: &str) -> Option<String> {
    let name = raw.rsplit('+').next().unwrap_or(raw);
    let name = name.split('-').next().unwrap_or(name).trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn font_size_hundredths(pt: f32) -> u32 {
    let pt = if pt.is_finite() { pt } else { MIN_FONT_PT };
    (pt.clamp(MIN_FONT_PT, MAX_FONT_PT) * 100.0).round() as u32
}

// ── Vision extraction ────────────────────────────────────────────────────

/// Build from vision layouts on the widescreen canvas.
///
/// `raster` must be the raster the layouts were produced from: layout `i`
/// crops its image elements out of `raster.pages[i]`.
pub fn build_from_vision_layouts(
    layouts: &[VisionLayout],
    raster: &PageRaster,
) -> Result<Deck, Pdf2PptxError> {
    if layouts.is_empty() {
        return Err(Pdf2PptxError::BuildInput { strategy: "vision" });
    }

    let mut deck = Deck::new(WIDESCREEN_WIDTH_EMU, WIDESCREEN_HEIGHT_EMU);

    for (i, layout) in layouts.iter().enumerate() {
        let source = raster.get(i);
        let mut slide = Slide {
            background: Some(hex_to_rgb(&layout.background_color_hex)),
            shapes: Vec::with_capacity(layout.elements.len()),
        };

        for element in &layout.elements {
            let rect = vision_rect(element.frame(), deck.width_emu, deck.height_emu);
            match element {
                VisionElement::Text {
                    content,
                    font_size,
                    color_hex,
                    bold,
                    italic,
                    alignment,
                    ..
                } => {
                    let style = RunStyle {
                        size_hundredths: font_size_hundredths(*font_size),
                        color: hex_to_rgb(color_hex),
                        bold: *bold,
                        italic: *italic,
                        font_family: None,
                    };
                    let paragraphs = content
                        .split('\n')
                        .map(|line| Paragraph {
                            text: line.trim_end_matches('\r').to_string(),
                            style: style.clone(),
                            alignment: *alignment,
                        })
                        .collect();
                    slide.shapes.push(Shape::Text(TextBox { rect, paragraphs }));
                }
                VisionElement::Shape { fill_color_hex, .. } => {
                    slide.shapes.push(Shape::Rectangle {
                        rect,
                        fill: fill_color_hex.as_deref().map(hex_to_rgb),
                    });
                }
                VisionElement::Image { frame } => match source.and_then(|p| crop_page(p, frame)) {
                    Some(cropped) => slide.shapes.push(picture(&cropped, rect, i + 1)?),
                    None => debug!("Slide {}: image element skipped (empty crop)", i + 1),
                },
            }
        }

        debug!(
            "Slide {}: {} shapes from {} vision elements",
            i + 1,
            slide.shapes.len(),
            layout.elements.len()
        );
        deck.slides.push(slide);
    }

    Ok(deck)
}

/// Model geometry is untrusted: offsets stay within one canvas of the
/// slide and extents never exceed the canvas.
fn vision_rect(frame: &PercentRect, width: i64, height: i64) -> Rect {
    Rect {
        x: percent_of(width, frame.x.clamp(-100.0, 100.0)),
        y: percent_of(height, frame.y.clamp(-100.0, 100.0)),
        cx: percent_of(width, extent_pct(frame.width)).max(MIN_VISION_BOX_EMU),
        cy: percent_of(height, extent_pct(frame.height)).max(MIN_VISION_BOX_EMU),
    }
}

fn extent_pct(pct: f32) -> f32 {
    pct.clamp(0.0, 100.0)
}

/// Pixel rectangle `(x, y, w, h)` of a percentage frame on a `w × h` bitmap.
///
/// The origin is clamped into the bitmap and the far edge to its bounds;
/// `None` when nothing is left.
pub fn crop_rect(
    width: u32,
    height: u32,
    frame: &PercentRect,
) -> Option<(u32, u32, u32, u32)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (w, h) = (i64::from(width), i64::from(height));

    let x = percent_of(w, frame.x).clamp(0, w - 1);
    let y = percent_of(h, frame.y).clamp(0, h - 1);
    let right = x.saturating_add(percent_of(w, extent_pct(frame.width))).min(w);
    let bottom = y.saturating_add(percent_of(h, extent_pct(frame.height))).min(h);

    if right <= x || bottom <= y {
        return None;
    }
    Some((x as u32, y as u32, (right - x) as u32, (bottom - y) as u32))
}

fn crop_page(page: &PageBitmap, frame: &PercentRect) -> Option<DynamicImage> {
    let (x, y, w, h) = crop_rect(page.image.width(), page.image.height(), frame)?;
    Some(page.image.crop_imm(x, y, w, h))
}

// ── Raster fallback ──────────────────────────────────────────────────────

/// One full-bleed picture per page on the widescreen canvas.
pub fn build_from_raster(raster: &PageRaster) -> Result<Deck, Pdf2PptxError> {
    if raster.is_empty() {
        return Err(Pdf2PptxError::BuildInput { strategy: "raster" });
    }

    let mut deck = Deck::new(WIDESCREEN_WIDTH_EMU, WIDESCREEN_HEIGHT_EMU);
    let full = Rect {
        x: 0,
        y: 0,
        cx: deck.width_emu,
        cy: deck.height_emu,
    };

    for (i, page) in raster.pages.iter().enumerate() {
        deck.slides.push(Slide {
            background: None,
            shapes: vec![picture(&page.image, full, i + 1)?],
        });
    }

    Ok(deck)
}

fn picture(image: &DynamicImage, rect: Rect, slide: usize) -> Result<Shape, Pdf2PptxError> {
    let png = png_bytes(image).map_err(|e| Pdf2PptxError::PictureEncodeFailed {
        slide,
        detail: e.to_string(),
    })?;
    Ok(Shape::Picture { rect, png })
}
