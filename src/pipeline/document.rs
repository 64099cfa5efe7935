//! The decoded-document seam between pdfium and the pipeline.
//!
//! Rasterisation and direct extraction only ever talk to [`DocumentPages`].
//! [`PdfiumDocument`] is the production implementation; tests substitute an
//! in-memory fake so the whole pipeline runs without a pdfium library.
//!
//! All geometry leaving this module is in PDF points with the origin at the
//! **top-left** of the page. pdfium reports bottom-left origin; the adapter
//! flips it here so nothing downstream has to care.

use crate::error::Pdf2PptxError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Packed span-style flag bits.
///
/// Same layout as MuPDF's structured-text span flags, so the style decoding
/// in [`crate::pipeline::extract`] does not depend on which backend produced
/// the span.
pub mod span_flags {
    pub const SUPERSCRIPT: u32 = 1 << 0;
    pub const ITALIC: u32 = 1 << 1;
    pub const SERIF: u32 = 1 << 2;
    pub const MONOSPACED: u32 = 1 << 3;
    pub const BOLD: u32 = 1 << 4;
}

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f32,
    pub height_pt: f32,
}

/// A text span as reported by the backend, before any cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTextSpan {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font_name: String,
    /// See [`span_flags`].
    pub flags: u32,
    /// `0xRRGGBB`
    pub color: u32,
}

/// An embedded image object and its placement on the page.
#[derive(Debug, Clone)]
pub struct PlacedImage {
    pub bitmap: DynamicImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Read access to a decoded document, one page at a time.
///
/// Page indices are 0-based.
pub trait DocumentPages {
    fn page_count(&self) -> usize;

    fn page_size(&self, index: usize) -> Result<PageSize, Pdf2PptxError>;

    /// Render a page at `scale` (1.0 = 72 dpi), bounded to `max_pixels` on
    /// both axes.
    fn render(
        &self,
        index: usize,
        scale: f32,
        max_pixels: u32,
    ) -> Result<DynamicImage, Pdf2PptxError>;

    fn text_spans(&self, index: usize) -> Result<Vec<RawTextSpan>, Pdf2PptxError>;

    /// The first `limit` image objects on the page. Each entry fails on its
    /// own when that image cannot be decoded.
    fn image_objects(
        &self,
        index: usize,
        limit: usize,
    ) -> Result<Vec<Result<PlacedImage, String>>, Pdf2PptxError>;
}

// ── pdfium binding ───────────────────────────────────────────────────────

/// Bind to a pdfium shared library.
///
/// Search order: `PDFIUM_LIB_PATH` (a file or a directory), the working
/// directory, then the system library path.
pub fn bind_pdfium() -> Result<Pdfium, Pdf2PptxError> {
    let from_env = std::env::var("PDFIUM_LIB_PATH").ok().map(|p| {
        let path = PathBuf::from(p);
        if path.is_dir() {
            Pdfium::pdfium_platform_library_name_at_path(&path)
        } else {
            path
        }
    });

    if let Some(path) = from_env {
        match Pdfium::bind_to_library(path.as_path()) {
            Ok(bindings) => return Ok(Pdfium::new(bindings)),
            Err(e) => debug!("PDFIUM_LIB_PATH {} unusable: {}", path.display(), e),
        }
    }

    let bindings =
        Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./").as_path())
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| Pdf2PptxError::PdfiumBindingFailed(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

// ── pdfium adapter ───────────────────────────────────────────────────────

/// [`DocumentPages`] over a pdfium-loaded PDF.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
    path: PathBuf,
}

impl<'a> PdfiumDocument<'a> {
    /// Open `path`, mapping pdfium load errors onto the rasterization-class
    /// fatal errors.
    pub fn open(
        pdfium: &'a Pdfium,
        path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, Pdf2PptxError> {
        let document = pdfium.load_pdf_from_file(path, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    Pdf2PptxError::WrongPassword {
                        path: path.to_path_buf(),
                    }
                } else {
                    Pdf2PptxError::PasswordRequired {
                        path: path.to_path_buf(),
                    }
                }
            } else {
                Pdf2PptxError::CorruptPdf {
                    path: path.to_path_buf(),
                    detail: err_str,
                }
            }
        })?;

        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );

        Ok(Self {
            document,
            path: path.to_path_buf(),
        })
    }

    fn page(&self, index: usize) -> Result<PdfPage<'_>, Pdf2PptxError> {
        let total = self.page_count();
        if index >= total {
            return Err(Pdf2PptxError::PageOutOfRange {
                page: index + 1,
                total,
            });
        }
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| Pdf2PptxError::CorruptPdf {
                path: self.path.clone(),
                detail: format!("page {}: {:?}", index + 1, e),
            })
    }
}

impl DocumentPages for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, Pdf2PptxError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width_pt: page.width().value,
            height_pt: page.height().value,
        })
    }

    fn render(
        &self,
        index: usize,
        scale: f32,
        max_pixels: u32,
    ) -> Result<DynamicImage, Pdf2PptxError> {
        let page = self.page(index)?;

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(scale)
            .set_maximum_width(max_pixels as i32)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2PptxError::RasterizationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = DynamicImage::ImageRgb8(bitmap.as_image().to_rgb8());
        // Release pdfium's buffer before the next page is rendered.
        drop(bitmap);
        Ok(image)
    }

    fn text_spans(&self, index: usize) -> Result<Vec<RawTextSpan>, Pdf2PptxError> {
        let page = self.page(index)?;
        let page_height = page.height().value;
        let mut spans = Vec::new();

        for object in page.objects().iter() {
            let Some(text_object) = object.as_text_object() else {
                continue;
            };
            let text = text_object.text();
            if text.trim().is_empty() {
                continue;
            }
            let Ok(bounds) = object.bounds() else {
                continue;
            };

            let font_name = text_object.font().name();
            let color = object
                .fill_color()
                .map(|c| pack_rgb(c.red(), c.green(), c.blue()))
                .unwrap_or(0);

            spans.push(RawTextSpan {
                text,
                x: bounds.left().value,
                y: page_height - bounds.top().value,
                width: bounds.right().value - bounds.left().value,
                height: bounds.top().value - bounds.bottom().value,
                font_size: text_object.scaled_font_size().value,
                flags: style_flags_from_font_name(&font_name),
                font_name,
                color,
            });
        }

        Ok(spans)
    }

    fn image_objects(
        &self,
        index: usize,
        limit: usize,
    ) -> Result<Vec<Result<PlacedImage, String>>, Pdf2PptxError> {
        let page = self.page(index)?;
        let page_height = page.height().value;

        let images = page
            .objects()
            .iter()
            .filter(|o| o.object_type() == PdfPageObjectType::Image)
            .take(limit)
            .map(|object| {
                let bounds = object.bounds().map_err(|e| format!("{e:?}"))?;
                let image_object = object
                    .as_image_object()
                    .ok_or_else(|| "not an image object".to_string())?;
                let bitmap = image_object
                    .get_raw_image()
                    .map_err(|e| format!("{e:?}"))?;
                Ok(PlacedImage {
                    bitmap,
                    x: bounds.left().value,
                    y: page_height - bounds.top().value,
                    width: bounds.right().value - bounds.left().value,
                    height: bounds.top().value - bounds.bottom().value,
                })
            })
            .collect();

        Ok(images)
    }
}

/// Pack 8-bit channels as `0xRRGGBB`.
pub fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// pdfium exposes no span flags, so style is read off the font name,
/// e.g. `ABCDEF+Helvetica-BoldOblique`.
pub fn style_flags_from_font_name(name: &str) -> u32 {
    let lower = name.to_ascii_lowercase();
    let mut flags = 0;
    if lower.contains("bold") || lower.contains("black") || lower.contains("heavy") {
        flags |= span_flags::BOLD;
    }
    if lower.contains("italic") || lower.contains("oblique") {
        flags |= span_flags::ITALIC;
    }
    if lower.contains("mono") || lower.contains("courier") {
        flags |= span_flags::MONOSPACED;
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_channels_big_endian() {
        assert_eq!(pack_rgb(0x12, 0x34, 0x56), 0x123456);
        assert_eq!(pack_rgb(255, 255, 255), 0xFFFFFF);
    }

    #[test]
    fn font_name_style_detection() {
        let f = style_flags_from_font_name("ABCDEF+Helvetica-BoldOblique");
        assert_ne!(f & span_flags::BOLD, 0);
        assert_ne!(f & span_flags::ITALIC, 0);

        let f = style_flags_from_font_name("Arial");
        assert_eq!(f & (span_flags::BOLD | span_flags::ITALIC), 0);

        let f = style_flags_from_font_name("Inter-Black");
        assert_ne!(f & span_flags::BOLD, 0);
    }

    #[test]
    fn flag_bits_do_not_overlap() {
        let all = [
            span_flags::SUPERSCRIPT,
            span_flags::ITALIC,
            span_flags::SERIF,
            span_flags::MONOSPACED,
            span_flags::BOLD,
        ];
        let combined = all.iter().fold(0, |acc, f| acc | f);
        assert_eq!(combined.count_ones(), all.len() as u32);
    }
}
