//! Direct extraction: text runs, embedded pictures and an approximate page
//! colour read straight from a native document.
//!
//! Only document sources reach this stage. Output is one [`DocumentPage`] per
//! selected page, in raster order, so the deck builder can pair them up.
//!
//! ## Background colour
//!
//! The page colour is a **heuristic**: the page is rendered at one tenth of
//! its point size and the top-left pixel is read. It is right for flat slide
//! backgrounds and wrong for gradients, photos or pages whose corner carries
//! a logo. When sampling fails the page keeps `#FFFFFF`.

use crate::config::ConversionConfig;
use crate::error::Pdf2PptxError;
use crate::model::{DocumentPage, ImageRegion, TextRun};
use crate::pipeline::document::{
    bind_pdfium, span_flags, DocumentPages, PdfiumDocument, RawTextSpan,
};
use crate::pipeline::render::downscale_to_fit;
use std::path::PathBuf;
use tracing::{debug, info};

/// Scale used for the background sample render.
const BACKGROUND_SAMPLE_SCALE: f32 = 0.1;

/// Limits applied while collecting embedded images.
#[derive(Debug, Clone, Copy)]
pub struct ExtractOptions {
    pub max_images_per_page: usize,
    pub max_image_pixels: u32,
}

impl From<&ConversionConfig> for ExtractOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            max_images_per_page: config.max_images_per_page,
            max_image_pixels: config.max_embedded_image_pixels,
        }
    }
}

/// Reopen the PDF and extract the given pages (0-based indices).
///
/// pdfium is not async-safe, so this runs on the blocking pool like the
/// rasteriser does.
pub async fn extract_document(
    path: PathBuf,
    password: Option<String>,
    indices: Vec<usize>,
    options: ExtractOptions,
) -> Result<Vec<DocumentPage>, Pdf2PptxError> {
    tokio::task::spawn_blocking(move || {
        let pdfium = bind_pdfium()?;
        let document = PdfiumDocument::open(&pdfium, &path, password.as_deref())?;
        extract_pages(&document, &indices, options)
    })
    .await
    .map_err(|e| Pdf2PptxError::Internal(format!("Extract task panicked: {}", e)))?
}

pub fn extract_pages<D: DocumentPages + ?Sized>(
    document: &D,
    indices: &[usize],
    options: ExtractOptions,
) -> Result<Vec<DocumentPage>, Pdf2PptxError> {
    let pages = indices
        .iter()
        .map(|&idx| extract_page(document, idx, options))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Direct extraction: {} pages, {} text runs",
        pages.len(),
        pages.iter().map(|p| p.text_runs.len()).sum::<usize>()
    );
    Ok(pages)
}

pub fn extract_page<D: DocumentPages + ?Sized>(
    document: &D,
    index: usize,
    options: ExtractOptions,
) -> Result<DocumentPage, Pdf2PptxError> {
    let size = document.page_size(index)?;
    let mut page = DocumentPage::new(index + 1, size.width_pt, size.height_pt);

    page.text_runs = document
        .text_spans(index)?
        .into_iter()
        .filter_map(text_run_from_span)
        .collect();

    for (n, placed) in document
        .image_objects(index, options.max_images_per_page)?
        .into_iter()
        .enumerate()
    {
        match placed {
            Ok(img) => page.image_regions.push(ImageRegion {
                bitmap: downscale_to_fit(img.bitmap, options.max_image_pixels),
                x: img.x,
                y: img.y,
                width: img.width.max(0.0),
                height: img.height.max(0.0),
            }),
            Err(e) => debug!("Page {}: skipping image {}: {}", index + 1, n, e),
        }
    }

    if let Some(hex) = sample_background(document, index) {
        page.background_color_hex = hex;
    }

    debug!(
        "Page {}: {} runs, {} chars, {} images, background {}",
        page.page_num,
        page.text_runs.len(),
        page.text_char_count(),
        page.image_regions.len(),
        page.background_color_hex
    );
    Ok(page)
}

/// Clean up a backend span; blank spans yield `None`.
pub fn text_run_from_span(span: RawTextSpan) -> Option<TextRun> {
    let text = span.text.trim();
    if text.is_empty() {
        return None;
    }
    Some(TextRun {
        text: text.to_string(),
        x: span.x,
        y: span.y,
        width: span.width.max(0.0),
        height: span.height.max(0.0),
        font_size: span.font_size,
        font_family: span.font_name,
        color_hex: color_hex(span.color),
        bold: span.flags & span_flags::BOLD != 0,
        italic: span.flags & span_flags::ITALIC != 0,
    })
}

/// `0xRRGGBB` → `#rrggbb`. Bits above 24 are ignored.
pub fn color_hex(packed: u32) -> String {
    format!("#{:06x}", packed & 0x00FF_FFFF)
}

/// Top-left pixel of a tiny render. See the module docs.
fn sample_background<D: DocumentPages + ?Sized>(document: &D, index: usize) -> Option<String> {
    let thumb = match document.render(index, BACKGROUND_SAMPLE_SCALE, 256) {
        Ok(img) => img.to_rgb8(),
        Err(e) => {
            debug!("Page {}: background sample failed: {}", index + 1, e);
            return None;
        }
    };
    if thumb.width() == 0 || thumb.height() == 0 {
        return None;
    }
    let [r, g, b] = thumb.get_pixel(0, 0).0;
    Some(format!("#{:02x}{:02x}{:02x}", r, g, b))
}
