//! Per-job layout data exchanged between pipeline stages.
//!
//! Two coordinate frames coexist here:
//!
//! * **Point space** ([`TextRun`], [`ImageRegion`], [`DocumentPage`]): PDF
//!   points, origin at the top-left corner of the page. Produced by direct
//!   extraction.
//! * **Percent space** ([`VisionElement`], [`VisionLayout`]): 0–100 relative
//!   to the slide. Produced by the vision analyzer.
//!
//! Every value is created fresh for one job and dropped once the deck is
//! written; nothing here is shared between jobs.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Character count a page must exceed before direct extraction is trusted.
pub const SUFFICIENT_TEXT_CHARS: usize = 20;

// ── Rasters ──────────────────────────────────────────────────────────────

/// One rasterised source page.
#[derive(Debug, Clone)]
pub struct PageBitmap {
    /// 1-indexed page number in the source.
    pub page_num: usize,
    /// RGB bitmap, bounded to the configured maximum dimension.
    pub image: DynamicImage,
    /// Page width in points (96 dpi assumed for standalone images).
    pub width_pt: f32,
    /// Page height in points.
    pub height_pt: f32,
}

/// The bitmaps of every selected page, in source order.
#[derive(Debug, Clone, Default)]
pub struct PageRaster {
    pub pages: Vec<PageBitmap>,
}

impl PageRaster {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Bitmap for the page at `position` in this raster (0-based).
    pub fn get(&self, position: usize) -> Option<&PageBitmap> {
        self.pages.get(position)
    }
}

// ── Direct extraction ────────────────────────────────────────────────────

/// A run of text with uniform styling, in point space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Trimmed, never empty.
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Never negative.
    pub width: f32,
    /// Never negative.
    pub height: f32,
    pub font_size: f32,
    /// Raw font name as found in the document (may carry a subset prefix).
    pub font_family: String,
    /// `#rrggbb`
    pub color_hex: String,
    pub bold: bool,
    pub italic: bool,
}

/// An embedded picture and where the page places it, in point space.
#[derive(Debug, Clone)]
pub struct ImageRegion {
    pub bitmap: DynamicImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Direct-extraction output for one page.
#[derive(Debug, Clone)]
pub struct DocumentPage {
    /// 1-indexed page number in the source.
    pub page_num: usize,
    pub width_pt: f32,
    pub height_pt: f32,
    pub text_runs: Vec<TextRun>,
    pub image_regions: Vec<ImageRegion>,
    /// Approximate page colour; see [`crate::pipeline::extract`].
    pub background_color_hex: String,
}

impl DocumentPage {
    /// An empty page with the default white background.
    pub fn new(page_num: usize, width_pt: f32, height_pt: f32) -> Self {
        Self {
            page_num,
            width_pt,
            height_pt,
            text_runs: Vec::new(),
            image_regions: Vec::new(),
            background_color_hex: "#FFFFFF".to_string(),
        }
    }

    /// Sum of trimmed text-run lengths, in characters.
    pub fn text_char_count(&self) -> usize {
        self.text_runs
            .iter()
            .map(|r| r.text.trim().chars().count())
            .sum()
    }

    pub fn has_sufficient_text(&self) -> bool {
        self.text_char_count() > SUFFICIENT_TEXT_CHARS
    }
}

// ── Vision analysis ──────────────────────────────────────────────────────

/// Rectangle in percent-of-slide coordinates (0–100).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl TextAlign {
    /// Lenient parse; anything unrecognised is left-aligned.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "center" | "centre" | "middle" => TextAlign::Center,
            "right" => TextAlign::Right,
            _ => TextAlign::Left,
        }
    }
}

/// One element recognised by the vision model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VisionElement {
    Text {
        frame: PercentRect,
        content: String,
        font_size: f32,
        color_hex: String,
        bold: bool,
        italic: bool,
        alignment: TextAlign,
    },
    Shape {
        frame: PercentRect,
        fill_color_hex: Option<String>,
    },
    /// Cropped from the page's own raster at build time.
    Image { frame: PercentRect },
}

impl VisionElement {
    pub fn frame(&self) -> &PercentRect {
        match self {
            VisionElement::Text { frame, .. }
            | VisionElement::Shape { frame, .. }
            | VisionElement::Image { frame } => frame,
        }
    }
}

/// Vision output for one page.
///
/// Element order is paint order: background shapes first, then text, then
/// images.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionLayout {
    pub elements: Vec<VisionElement>,
    pub background_color_hex: String,
}

impl Default for VisionLayout {
    fn default() -> Self {
        Self {
            elements: Vec::new(),
            background_color_hex: "#FFFFFF".to_string(),
        }
    }
}

impl VisionLayout {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
