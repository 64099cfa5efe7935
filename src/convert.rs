//! Conversion entry points.
//!
//! A job is strictly sequential: resolve → rasterise → extract (one tier,
//! chosen by [`crate::pipeline::fallback`]) → build → write. pdfium work,
//! deck building and packaging run on the blocking pool, but each stage is
//! awaited before the next starts.

use crate::config::ConversionConfig;
use crate::deck::{build, pptx};
use crate::error::Pdf2PptxError;
use crate::model::PageRaster;
use crate::output::{ConversionOutput, ConversionStats, SourceInfo};
use crate::pipeline::extract::{extract_document, ExtractOptions};
use crate::pipeline::fallback::{self, DirectExtraction, ExtractionPayload};
use crate::pipeline::input::{self, ResolvedSource, SourceDescriptor};
use crate::pipeline::render;
use crate::pipeline::vision::{vision_tier, VisionAnalyzer};
use futures::FutureExt;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};

/// Convert a document or a list of page images into a `.pptx` at `dest`.
///
/// # Returns
/// `Ok(ConversionOutput)` whenever rasterisation succeeds: the raster tier
/// cannot fail, so a presentation is always produced from then on. Check
/// `output.downgrades` to see which tiers were abandoned and why.
///
/// # Errors
/// Fatal errors only (unreadable source, rasterisation, write failure),
/// wrapped in [`Pdf2PptxError::JobFailed`] with the job id. No file is left
/// at `dest` on failure.
///
/// # Example
/// ```rust,no_run
/// use edgequake_pdf2pptx::{convert, ConversionConfig, SourceDescriptor};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let source = SourceDescriptor::Document("deck.pdf".into());
/// let out = convert(&source, "deck.pptx", &ConversionConfig::default()).await?;
/// println!("{} slides via {}", out.page_count, out.method_used);
/// # Ok(())
/// # }
/// ```
pub async fn convert(
    source: &SourceDescriptor,
    dest: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    let job_id = new_job_id();
    let span = info_span!("job", id = %job_id);

    run_job(&job_id, source, dest.as_ref(), config)
        .instrument(span)
        .await
        .map_err(|e| {
            error!("Job {} failed: {}", job_id, e);
            Pdf2PptxError::JobFailed {
                job_id: job_id.clone(),
                source: Box::new(e),
            }
        })
}

/// Convert a single path or URL, creating the output directory if needed.
///
/// The input is classified like a CLI argument: a PDF path or URL becomes a
/// document job, a PNG/JPEG a one-page image job.
pub async fn convert_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Pdf2PptxError> {
    let source = SourceDescriptor::from_paths(&[input_str.as_ref()])?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Pdf2PptxError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    Ok(convert(&source, path, config).await?.stats)
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    source: &SourceDescriptor,
    dest: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2PptxError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(source, dest, config))
}

/// Page count and page sizes of a source, without converting it.
///
/// Does not require a vision credential.
pub async fn inspect(
    source: &SourceDescriptor,
    password: Option<&str>,
) -> Result<SourceInfo, Pdf2PptxError> {
    let resolved = input::resolve_source(source, 120).await?;
    let pages = render::inspect_pages(&resolved, password).await?;
    Ok(SourceInfo {
        is_native_document: source.is_native_document(),
        page_count: pages.len(),
        pages,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn run_job(
    job_id: &str,
    source: &SourceDescriptor,
    dest: &Path,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Pdf2PptxError> {
    let total_start = Instant::now();
    info!("Starting conversion → {}", dest.display());

    // ── Step 1: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_source(source, config.download_timeout_secs).await?;

    // ── Step 2: Rasterise (fatal on failure) ─────────────────────────────
    let render_start = Instant::now();
    let raster = render::rasterize(&resolved, config).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    info!(
        "Rendered {} pages in {}ms",
        raster.len(),
        render_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(raster.len());
    }

    // ── Step 3: Pick a tier ──────────────────────────────────────────────
    let (client, unavailable) = vision_tier(config);
    let analyzer = client.map(|client| VisionAnalyzer::new(client, config));
    if analyzer.is_none() && unavailable.is_none() {
        info!("No vision credential; skipping vision tier");
    }

    let direct: DirectExtraction<'_> = match &resolved {
        ResolvedSource::Document(doc) => {
            let indices = raster.pages.iter().map(|p| p.page_num - 1).collect();
            Some(
                extract_document(
                    doc.path().to_path_buf(),
                    config.password.clone(),
                    indices,
                    ExtractOptions::from(config),
                )
                .boxed(),
            )
        }
        ResolvedSource::Images(_) => None,
    };

    let extraction_start = Instant::now();
    let mut extraction = fallback::orchestrate(
        &raster,
        analyzer.as_ref(),
        direct,
        config.min_text_chars,
        config.progress_callback.as_ref(),
    )
    .await;
    let extraction_duration_ms = extraction_start.elapsed().as_millis() as u64;
    if let Some(err) = unavailable {
        extraction.downgrades.insert(0, err);
    }

    // ── Step 4: Build and write ──────────────────────────────────────────
    let method = extraction.method;
    let page_count = raster.len();
    let build_start = Instant::now();
    let title = deck_title(source);
    let dest_owned = dest.to_path_buf();
    let (slide_count, placed_elements) = tokio::task::spawn_blocking(move || {
        build_and_save(extraction.payload, &raster, &title, &dest_owned)
    })
    .await
    .map_err(|e| Pdf2PptxError::Internal(format!("Build task panicked: {}", e)))??;
    let build_duration_ms = build_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(slide_count, method);
    }

    let stats = ConversionStats {
        total_pages: page_count,
        slide_count,
        placed_elements,
        vision_elements: extraction.vision_elements,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
        render_duration_ms,
        extraction_duration_ms,
        build_duration_ms,
    };

    info!(
        "Conversion complete: {} slides via {}, {}ms total",
        slide_count, method, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        job_id: job_id.to_string(),
        method_used: method,
        page_count,
        output_path: dest.to_path_buf(),
        downgrades: extraction.downgrades,
        stats,
    })
}

/// Build the deck for the chosen tier and write it. Returns slide and shape counts.
fn build_and_save(
    payload: ExtractionPayload,
    raster: &PageRaster,
    title: &str,
    dest: &Path,
) -> Result<(usize, usize), Pdf2PptxError> {
    let deck = match payload {
        ExtractionPayload::Vision(layouts) => build::build_from_vision_layouts(&layouts, raster)?,
        ExtractionPayload::Direct(pages) => build::build_from_document_pages(&pages)?,
        ExtractionPayload::Raster => build::build_from_raster(raster)?,
    };
    pptx::save_deck(&deck, title, dest)?;
    Ok((deck.slide_count(), deck.element_count()))
}

/// Short id tagging every log line of a job.
fn new_job_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// File stem of the source, used as the presentation title.
fn deck_title(source: &SourceDescriptor) -> String {
    let stem = match source {
        SourceDescriptor::Document(input) => {
            let last = input.rsplit('/').next().unwrap_or(input);
            Path::new(last)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        }
        SourceDescriptor::Images(paths) => paths
            .first()
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned()),
    };
    stem.filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Presentation".to_string())
}
