//! Result types returned by the conversion entry points.

use crate::error::TierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which extraction tier produced the deck.
///
/// Tiers are tried in declaration order; the first that yields usable data
/// wins for the whole job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Layout recognised by a vision model.
    VisionExtraction,
    /// Text runs and images read directly from the PDF.
    DirectExtraction,
    /// One full-bleed picture per page.
    RasterFallback,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::VisionExtraction => "vision_extraction",
            ExtractionMethod::DirectExtraction => "direct_extraction",
            ExtractionMethod::RasterFallback => "raster_fallback",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timing and volume figures for one job.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Pages converted, after page selection.
    pub total_pages: usize,
    /// Slides written.
    pub slide_count: usize,
    /// Shapes, text boxes and pictures placed across all slides.
    pub placed_elements: usize,
    /// Elements the vision model recognised (0 when the tier did not run).
    pub vision_elements: usize,
    pub total_duration_ms: u64,
    pub render_duration_ms: u64,
    pub extraction_duration_ms: u64,
    pub build_duration_ms: u64,
}

/// Outcome of a successful job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Short identifier used in every log line of the job.
    pub job_id: String,
    pub method_used: ExtractionMethod,
    pub page_count: usize,
    pub output_path: PathBuf,
    /// Why higher tiers were skipped, in the order they were abandoned.
    pub downgrades: Vec<TierError>,
    pub stats: ConversionStats,
}

/// Geometry of one source page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub page_num: usize,
    pub width_pt: f32,
    pub height_pt: f32,
}

/// What [`crate::convert::inspect`] reports about a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub is_native_document: bool,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}
