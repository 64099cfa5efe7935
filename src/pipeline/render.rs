//! Rasterisation: turn every selected source page into a bounded bitmap.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 200 DPI would produce a
//! 9,000 × 13,000 px image. `max_rendered_pixels` caps both edges regardless
//! of physical size, keeping memory bounded for long decks. Standalone page
//! images are held to the same bound.
//!
//! A failure here is fatal for the job: every extraction tier, including the
//! terminal raster fallback, needs these bitmaps.

use crate::config::{ConversionConfig, PageSelection};
use crate::error::Pdf2PptxError;
use crate::model::{PageBitmap, PageRaster};
use crate::output::PageInfo;
use crate::pipeline::document::{bind_pdfium, DocumentPages, PdfiumDocument};
use crate::pipeline::input::ResolvedSource;
use image::imageops::FilterType;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Pixel density assumed for standalone page images.
pub const IMAGE_SOURCE_DPI: f32 = 96.0;

/// Rasterise a resolved source into one bitmap per selected page.
///
/// This runs inside `spawn_blocking` since pdfium and image decoding are
/// CPU-bound.
pub async fn rasterize(
    source: &ResolvedSource,
    config: &ConversionConfig,
) -> Result<PageRaster, Pdf2PptxError> {
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let selection = config.pages.clone();

    let raster = match source {
        ResolvedSource::Document(input) => {
            let path = input.path().to_path_buf();
            let password = config.password.clone();
            tokio::task::spawn_blocking(move || {
                let pdfium = bind_pdfium()?;
                let document = PdfiumDocument::open(&pdfium, &path, password.as_deref())?;
                rasterize_document(&document, dpi, max_pixels, &selection)
            })
            .await
            .map_err(|e| Pdf2PptxError::Internal(format!("Render task panicked: {}", e)))??
        }
        ResolvedSource::Images(paths) => {
            let paths = paths.clone();
            tokio::task::spawn_blocking(move || rasterize_images(&paths, max_pixels, &selection))
                .await
                .map_err(|e| Pdf2PptxError::Internal(format!("Render task panicked: {}", e)))??
        }
    };

    info!("Rasterised {} pages", raster.len());
    Ok(raster)
}

/// Expand a page selection, failing when nothing survives it.
pub fn selected_indices(
    selection: &PageSelection,
    total_pages: usize,
) -> Result<Vec<usize>, Pdf2PptxError> {
    let indices = selection.to_indices(total_pages);
    if indices.is_empty() {
        let page = match selection {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().max().unwrap_or(1),
        };
        return Err(Pdf2PptxError::PageOutOfRange {
            page,
            total: total_pages,
        });
    }
    Ok(indices)
}

/// Blocking rasterisation of a decoded document.
pub fn rasterize_document<D: DocumentPages + ?Sized>(
    document: &D,
    dpi: u32,
    max_pixels: u32,
    selection: &PageSelection,
) -> Result<PageRaster, Pdf2PptxError> {
    let total_pages = document.page_count();
    info!("Document loaded: {} pages", total_pages);

    let indices = selected_indices(selection, total_pages)?;
    let scale = dpi as f32 / 72.0;
    let mut pages = Vec::with_capacity(indices.len());

    for idx in indices {
        let size = document.page_size(idx)?;
        let image = document.render(idx, scale, max_pixels)?;
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );
        pages.push(PageBitmap {
            page_num: idx + 1,
            image,
            width_pt: size.width_pt,
            height_pt: size.height_pt,
        });
    }

    Ok(PageRaster { pages })
}

/// Blocking decode of standalone page images.
pub fn rasterize_images(
    paths: &[PathBuf],
    max_pixels: u32,
    selection: &PageSelection,
) -> Result<PageRaster, Pdf2PptxError> {
    let indices = selected_indices(selection, paths.len())?;
    let mut pages = Vec::with_capacity(indices.len());

    for idx in indices {
        let path = &paths[idx];
        let decoded = load_image(path)?;
        let (width_pt, height_pt) = pixels_to_points(decoded.width(), decoded.height());
        let image = downscale_to_fit(decoded, max_pixels);
        debug!(
            "Loaded {} → {}x{} px",
            path.display(),
            image.width(),
            image.height()
        );
        pages.push(PageBitmap {
            page_num: idx + 1,
            image,
            width_pt,
            height_pt,
        });
    }

    Ok(PageRaster { pages })
}

fn load_image(path: &Path) -> Result<DynamicImage, Pdf2PptxError> {
    let image = image::open(path).map_err(|e| Pdf2PptxError::ImageDecodeFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    Ok(DynamicImage::ImageRgb8(image.to_rgb8()))
}

/// Point size of a bitmap under the fixed image-source density.
pub fn pixels_to_points(width_px: u32, height_px: u32) -> (f32, f32) {
    let k = 72.0 / IMAGE_SOURCE_DPI;
    (width_px as f32 * k, height_px as f32 * k)
}

/// Resample so neither side exceeds `max_side`, keeping the aspect ratio.
///
/// Images already within bounds are returned untouched.
pub fn downscale_to_fit(image: DynamicImage, max_side: u32) -> DynamicImage {
    if image.width() <= max_side && image.height() <= max_side {
        return image;
    }
    image.resize(max_side, max_side, FilterType::Lanczos3)
}

// ── Inspection ───────────────────────────────────────────────────────────

/// Page geometry of a resolved source, without rendering anything.
pub async fn inspect_pages(
    source: &ResolvedSource,
    password: Option<&str>,
) -> Result<Vec<PageInfo>, Pdf2PptxError> {
    match source {
        ResolvedSource::Document(input) => {
            let path = input.path().to_path_buf();
            let password = password.map(str::to_string);
            tokio::task::spawn_blocking(move || {
                let pdfium = bind_pdfium()?;
                let document = PdfiumDocument::open(&pdfium, &path, password.as_deref())?;
                document_page_info(&document)
            })
            .await
            .map_err(|e| Pdf2PptxError::Internal(format!("Inspect task panicked: {}", e)))?
        }
        ResolvedSource::Images(paths) => paths
            .iter()
            .enumerate()
            .map(|(i, path)| {
                let (w, h) = image::image_dimensions(path).map_err(|e| {
                    Pdf2PptxError::ImageDecodeFailed {
                        path: path.clone(),
                        detail: e.to_string(),
                    }
                })?;
                let (width_pt, height_pt) = pixels_to_points(w, h);
                Ok(PageInfo {
                    page_num: i + 1,
                    width_pt,
                    height_pt,
                })
            })
            .collect(),
    }
}

pub fn document_page_info<D: DocumentPages + ?Sized>(
    document: &D,
) -> Result<Vec<PageInfo>, Pdf2PptxError> {
    (0..document.page_count())
        .map(|i| {
            let size = document.page_size(i)?;
            Ok(PageInfo {
                page_num: i + 1,
                width_pt: size.width_pt,
                height_pt: size.height_pt,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::{PageSize, PlacedImage, RawTextSpan};
    use image::{Rgb, RgbImage};
    use std::cell::RefCell;

    /// Renders solid-colour pages and records the scale it was asked for.
    struct FakeDocument {
        sizes: Vec<(f32, f32)>,
        scales: RefCell<Vec<f32>>,
    }

    impl DocumentPages for FakeDocument {
        fn page_count(&self) -> usize {
            self.sizes.len()
        }

        fn page_size(&self, index: usize) -> Result<PageSize, Pdf2PptxError> {
            let (w, h) = self.sizes[index];
            Ok(PageSize {
                width_pt: w,
                height_pt: h,
            })
        }

        fn render(
            &self,
            index: usize,
            scale: f32,
            max_pixels: u32,
        ) -> Result<DynamicImage, Pdf2PptxError> {
            self.scales.borrow_mut().push(scale);
            let (w, h) = self.sizes[index];
            let img = RgbImage::from_pixel(
                ((w * scale) as u32).min(max_pixels),
                ((h * scale) as u32).min(max_pixels),
                Rgb([10, 20, 30]),
            );
            Ok(DynamicImage::ImageRgb8(img))
        }

        fn text_spans(&self, _index: usize) -> Result<Vec<RawTextSpan>, Pdf2PptxError> {
            Ok(vec![])
        }

        fn image_objects(
            &self,
            _index: usize,
            _limit: usize,
        ) -> Result<Vec<Result<PlacedImage, String>>, Pdf2PptxError> {
            Ok(vec![])
        }
    }

    fn fake(pages: usize) -> FakeDocument {
        FakeDocument {
            sizes: vec![(720.0, 540.0); pages],
            scales: RefCell::new(vec![]),
        }
    }

    #[test]
    fn renders_every_page_at_dpi_scale() {
        let doc = fake(3);
        let raster = rasterize_document(&doc, 144, 2000, &PageSelection::All).unwrap();
        assert_eq!(raster.len(), 3);
        assert!(doc.scales.borrow().iter().all(|s| (*s - 2.0).abs() < 1e-6));
        let first = raster.get(0).unwrap();
        assert_eq!(first.page_num, 1);
        assert_eq!(first.width_pt, 720.0);
        assert_eq!(first.image.width(), 1440);
    }

    #[test]
    fn page_selection_is_respected() {
        let doc = fake(5);
        let raster = rasterize_document(&doc, 72, 2000, &PageSelection::Set(vec![4, 2])).unwrap();
        let nums: Vec<usize> = raster.pages.iter().map(|p| p.page_num).collect();
        assert_eq!(nums, vec![2, 4]);
    }

    #[test]
    fn empty_selection_is_out_of_range() {
        let doc = fake(2);
        let err = rasterize_document(&doc, 72, 2000, &PageSelection::Single(9)).unwrap_err();
        assert!(matches!(
            err,
            Pdf2PptxError::PageOutOfRange { page: 9, total: 2 }
        ));
    }

    #[test]
    fn downscale_keeps_aspect_and_bound() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4000, 2000));
        let out = downscale_to_fit(img, 2000);
        assert_eq!(out.width(), 2000);
        assert_eq!(out.height(), 1000);

        let small = DynamicImage::ImageRgb8(RgbImage::new(300, 200));
        let out = downscale_to_fit(small, 2000);
        assert_eq!((out.width(), out.height()), (300, 200));
    }

    #[test]
    fn standalone_images_use_96_dpi() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        RgbImage::from_pixel(960, 540, Rgb([255, 255, 255]))
            .save(&path)
            .unwrap();

        let raster = rasterize_images(&[path], 2000, &PageSelection::All).unwrap();
        let page = raster.get(0).unwrap();
        assert_eq!(page.width_pt, 720.0);
        assert_eq!(page.height_pt, 405.0);
    }

    #[test]
    fn undecodable_image_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();
        let err = rasterize_images(&[path], 2000, &PageSelection::All).unwrap_err();
        assert!(err.is_rasterization());
    }

    #[test]
    fn page_info_lists_every_page() {
        let doc = fake(2);
        let info = document_page_info(&doc).unwrap();
        assert_eq!(info.len(), 2);
        assert_eq!(info[1].page_num, 2);
        assert_eq!(info[1].height_pt, 540.0);
    }
}
