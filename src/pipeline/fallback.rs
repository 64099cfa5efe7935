//! Tier selection: which extraction output the whole job is built from.
//!
//! Strict priority, decided once per job:
//!
//! ```text
//! credential? ──yes──▶ vision over all pages ──Σ elements > 0──▶ VisionExtraction
//!     │                        │ Σ = 0
//!     no ◀─────────────────────┘
//!     ▼
//! native document? ──yes──▶ direct extraction ──any page sufficient──▶ DirectExtraction
//!     │                              │ none
//!     no ◀───────────────────────────┘
//!     ▼
//! RasterFallback (always succeeds)
//! ```
//!
//! The gate is the **aggregate** element count: once any page produced vision
//! elements, every page is built from vision output, including pages whose
//! own layout is empty or whose call failed. No tier is retried and an
//! abandoned tier is never re-entered.

use crate::error::TierError;
use crate::model::{DocumentPage, PageRaster, VisionLayout};
use crate::output::ExtractionMethod;
use crate::pipeline::vision::VisionAnalyzer;
use crate::progress::ProgressCallback;
use futures::future::BoxFuture;
use tracing::{info, warn};

/// Everything the tier decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierInputs {
    pub credential_present: bool,
    pub total_vision_elements: usize,
    pub sufficient_text_any_page: bool,
    pub is_native_document: bool,
}

/// The tier table as a pure function.
pub fn select_method(inputs: &TierInputs) -> ExtractionMethod {
    if inputs.credential_present && inputs.total_vision_elements > 0 {
        ExtractionMethod::VisionExtraction
    } else if inputs.is_native_document && inputs.sufficient_text_any_page {
        ExtractionMethod::DirectExtraction
    } else {
        ExtractionMethod::RasterFallback
    }
}

/// Data for the selected build strategy.
#[derive(Debug)]
pub enum ExtractionPayload {
    /// One layout per raster page, in raster order.
    Vision(Vec<VisionLayout>),
    /// One page per raster page, in raster order.
    Direct(Vec<DocumentPage>),
    /// Only the raster is needed.
    Raster,
}

/// The job's decision record.
#[derive(Debug)]
pub struct ExtractionResult {
    pub method: ExtractionMethod,
    pub payload: ExtractionPayload,
    /// Why higher tiers were abandoned, in order.
    pub downgrades: Vec<TierError>,
    /// Elements the vision tier recognised (0 if it did not run).
    pub vision_elements: usize,
}

/// Direct extraction, not yet started. `None` for image sources.
pub type DirectExtraction<'a> =
    Option<BoxFuture<'a, Result<Vec<DocumentPage>, crate::error::Pdf2PptxError>>>;

/// Run the cascade.
///
/// `direct` is only polled when the vision tier is absent or came back empty.
/// Every tier failure is absorbed here and recorded as a downgrade.
pub async fn orchestrate(
    raster: &PageRaster,
    analyzer: Option<&VisionAnalyzer>,
    direct: DirectExtraction<'_>,
    min_text_chars: usize,
    progress: Option<&ProgressCallback>,
) -> ExtractionResult {
    let mut downgrades = Vec::new();
    let is_native_document = direct.is_some();
    let mut vision_elements = 0;

    // ── Tier 1: vision ──
    if let Some(analyzer) = analyzer {
        let batch = analyzer.analyze_batch(raster).await;
        vision_elements = batch.total_elements();
        downgrades.extend(batch.failures);

        let inputs = TierInputs {
            credential_present: true,
            total_vision_elements: vision_elements,
            sufficient_text_any_page: false,
            is_native_document,
        };
        if select_method(&inputs) == ExtractionMethod::VisionExtraction {
            return finish(
                ExtractionMethod::VisionExtraction,
                ExtractionPayload::Vision(batch.layouts),
                downgrades,
                vision_elements,
                progress,
            );
        }

        let err = TierError::NoVisionElements {
            pages: raster.len(),
        };
        warn!("{}", err);
        downgrades.push(err);
    }

    // ── Tier 2: direct ──
    match direct {
        Some(fut) => match fut.await {
            Ok(pages) => {
                let sufficient = pages.iter().any(|p| p.text_char_count() > min_text_chars);
                let inputs = TierInputs {
                    credential_present: analyzer.is_some(),
                    total_vision_elements: vision_elements,
                    sufficient_text_any_page: sufficient,
                    is_native_document,
                };
                if select_method(&inputs) == ExtractionMethod::DirectExtraction {
                    return finish(
                        ExtractionMethod::DirectExtraction,
                        ExtractionPayload::Direct(pages),
                        downgrades,
                        vision_elements,
                        progress,
                    );
                }
                let err = TierError::InsufficientExtraction {
                    best_page_chars: pages
                        .iter()
                        .map(DocumentPage::text_char_count)
                        .max()
                        .unwrap_or(0),
                    threshold: min_text_chars,
                };
                warn!("{}", err);
                downgrades.push(err);
            }
            Err(e) => {
                let err = TierError::DirectExtractionFailed {
                    detail: e.to_string(),
                };
                warn!("{}", err);
                downgrades.push(err);
            }
        },
        None => downgrades.push(TierError::NotADocument),
    }

    // ── Tier 3: raster ──
    finish(
        ExtractionMethod::RasterFallback,
        ExtractionPayload::Raster,
        downgrades,
        vision_elements,
        progress,
    )
}

fn finish(
    method: ExtractionMethod,
    payload: ExtractionPayload,
    downgrades: Vec<TierError>,
    vision_elements: usize,
    progress: Option<&ProgressCallback>,
) -> ExtractionResult {
    info!(
        "Extraction method: {} ({} downgrades)",
        method,
        downgrades.len()
    );
    if let Some(cb) = progress {
        cb.on_method_selected(method);
    }
    ExtractionResult {
        method,
        payload,
        downgrades,
        vision_elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_inputs() -> Vec<TierInputs> {
        let mut out = Vec::new();
        for credential_present in [false, true] {
            for total_vision_elements in [0, 1, 7] {
                for sufficient_text_any_page in [false, true] {
                    for is_native_document in [false, true] {
                        out.push(TierInputs {
                            credential_present,
                            total_vision_elements,
                            sufficient_text_any_page,
                            is_native_document,
                        });
                    }
                }
            }
        }
        out
    }

    #[test]
    fn vision_wins_whenever_it_found_anything() {
        for inputs in all_inputs() {
            if inputs.credential_present && inputs.total_vision_elements > 0 {
                assert_eq!(select_method(&inputs), ExtractionMethod::VisionExtraction);
            }
        }
    }

    #[test]
    fn vision_never_selected_without_credential() {
        for inputs in all_inputs().into_iter().filter(|i| !i.credential_present) {
            assert_ne!(select_method(&inputs), ExtractionMethod::VisionExtraction);
        }
    }

    #[test]
    fn direct_requires_a_document_with_text() {
        for inputs in all_inputs() {
            if select_method(&inputs) == ExtractionMethod::DirectExtraction {
                assert!(inputs.is_native_document);
                assert!(inputs.sufficient_text_any_page);
            }
        }
    }

    #[test]
    fn raster_is_the_terminal_tier() {
        let inputs = TierInputs {
            credential_present: true,
            total_vision_elements: 0,
            sufficient_text_any_page: false,
            is_native_document: true,
        };
        assert_eq!(select_method(&inputs), ExtractionMethod::RasterFallback);
    }

    #[test]
    fn image_sources_never_use_direct() {
        let inputs = TierInputs {
            credential_present: false,
            total_vision_elements: 0,
            sufficient_text_any_page: true,
            is_native_document: false,
        };
        assert_eq!(select_method(&inputs), ExtractionMethod::RasterFallback);
    }

    #[test]
    fn no_tiers_means_raster_and_not_a_document() {
        let raster = PageRaster::default();
        let result = tokio_test::block_on(orchestrate(&raster, None, None, 20, None));
        assert_eq!(result.method, ExtractionMethod::RasterFallback);
        assert!(matches!(result.payload, ExtractionPayload::Raster));
        assert_eq!(result.downgrades, vec![TierError::NotADocument]);
    }

    #[test]
    fn failed_direct_extraction_is_a_downgrade() {
        let raster = PageRaster::default();
        let direct: DirectExtraction<'_> = Some(Box::pin(async {
            Err(crate::error::Pdf2PptxError::Internal("boom".into()))
        }));
        let result = tokio_test::block_on(orchestrate(&raster, None, direct, 20, None));
        assert_eq!(result.method, ExtractionMethod::RasterFallback);
        assert!(matches!(
            result.downgrades[0],
            TierError::DirectExtractionFailed { .. }
        ));
    }
}
