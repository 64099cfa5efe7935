//! # edgequake-pdf2pptx
//!
//! Convert PDF decks and standalone slide images into editable PowerPoint
//! presentations.
//!
//! ## Why this crate?
//!
//! Exporting a deck to PDF (or screenshotting it) flattens it: text becomes
//! glyphs, shapes become paths. Dropping page pictures into a `.pptx` gives a
//! presentation nobody can edit. This crate recovers per-element text,
//! shapes and imagery and rebuilds them as native PowerPoint objects,
//! degrading gracefully when the richer sources are unavailable.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF / images
//!  │
//!  ├─ 1. Input     resolve local files or download a URL
//!  ├─ 2. Render    one bounded bitmap per page via pdfium (spawn_blocking)
//!  ├─ 3. Extract   exactly one tier, in strict priority:
//!  │                 vision model → direct PDF text → full-page pictures
//!  ├─ 4. Build     re-project geometry into slide space (EMU)
//!  └─ 5. Write     OOXML package, atomically persisted
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf2pptx::{convert, ConversionConfig, SourceDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Vision provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let config = ConversionConfig::default();
//!     let source = SourceDescriptor::Document("deck.pdf".into());
//!     let output = convert(&source, "deck.pptx", &config).await?;
//!     eprintln!("{} slides via {}", output.page_count, output.method_used);
//!     for d in &output.downgrades {
//!         eprintln!("  skipped tier: {d}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2pptx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf2pptx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod deck;
pub mod error;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, PageSelection, DEFAULT_VISION_MODEL};
pub use convert::{convert, convert_sync, convert_to_file, inspect};
pub use deck::Deck;
pub use error::{Pdf2PptxError, TierError};
pub use model::{
    DocumentPage, ImageRegion, PageBitmap, PageRaster, PercentRect, TextAlign, TextRun,
    VisionElement, VisionLayout,
};
pub use output::{ConversionOutput, ConversionStats, ExtractionMethod, PageInfo, SourceInfo};
pub use pipeline::input::SourceDescriptor;
pub use pipeline::vision::{LlmVisionClient, VisionClient};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
