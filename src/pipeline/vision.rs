//! Vision layout analysis: one model call per page bitmap.
//!
//! [`VisionClient`] is the seam to the multimodal model. The production
//! implementation, [`LlmVisionClient`], adapts any `edgequake_llm` provider;
//! tests use scripted clients. The credential is resolved once per job by
//! [`vision_tier`] and handed to [`VisionAnalyzer::new`]; the analyzer
//! never reads the environment itself.
//!
//! Calls are sequential, one attempt each, no retry. A page whose call fails
//! gets an empty layout and a [`TierError::VisionCall`]; the rest of the
//! batch carries on.

use crate::config::{ConversionConfig, DEFAULT_VISION_MODEL};
use crate::error::{Pdf2PptxError, TierError};
use crate::model::{PageBitmap, PageRaster, VisionLayout};
use crate::pipeline::encode::encode_page;
use crate::pipeline::reply::parse_layout_reply;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_EXTRACTION_INSTRUCTION;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Something that can look at a slide image and answer in text.
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Send `instruction` together with `image`; return the raw reply text.
    async fn describe(&self, instruction: &str, image: ImageData)
        -> Result<String, Pdf2PptxError>;
}

// ── edgequake-llm adapter ────────────────────────────────────────────────

/// [`VisionClient`] over an `edgequake_llm` provider.
pub struct LlmVisionClient {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmVisionClient {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }

    fn options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        }
    }
}

#[async_trait]
impl VisionClient for LlmVisionClient {
    async fn describe(
        &self,
        instruction: &str,
        image: ImageData,
    ) -> Result<String, Pdf2PptxError> {
        // One user turn: the instruction and the page image together.
        let messages = vec![ChatMessage::user_with_images(instruction, vec![image])];
        let options = self.options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| Pdf2PptxError::LlmApiError {
                message: e.to_string(),
            })?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Pdf2PptxError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Pdf2PptxError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the vision credential for a job, from most to least specific.
///
/// 1. `config.vision_client`, used as-is.
/// 2. `config.provider_name` (+ `config.model`). A named provider that cannot
///    be created is a configuration error.
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set.
/// 4. `ProviderFactory::from_env()` auto-detection.
///
/// `Ok(None)` means "no credential": `use_vision` is off, or steps 3–4 found
/// nothing usable. The vision tier is then skipped.
pub fn resolve_vision_client(
    config: &ConversionConfig,
) -> Result<Option<Arc<dyn VisionClient>>, Pdf2PptxError> {
    if !config.use_vision {
        return Ok(None);
    }

    if let Some(ref client) = config.vision_client {
        return Ok(Some(Arc::clone(client)));
    }

    let wrap = |provider: Arc<dyn LLMProvider>| -> Arc<dyn VisionClient> {
        Arc::new(LlmVisionClient::new(
            provider,
            config.temperature,
            config.max_tokens,
        ))
    };

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_VISION_MODEL);
        return create_vision_provider(name, model).map(|p| Some(wrap(p)));
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            match create_vision_provider(&prov, &model) {
                Ok(p) => return Ok(Some(wrap(p))),
                Err(e) => warn!("Ignoring EDGEQUAKE_LLM_PROVIDER: {}", e),
            }
        }
    }

    match ProviderFactory::from_env() {
        Ok((llm, _embedding)) if llm.name() != "mock" => {
            info!("Vision provider auto-detected: {}", llm.name());
            Ok(Some(wrap(llm)))
        }
        Ok(_) => {
            debug!("No vision credential in environment");
            Ok(None)
        }
        Err(e) => {
            debug!("No vision credential in environment: {}", e);
            Ok(None)
        }
    }
}

/// Resolve the credential for the vision tier of a running job.
///
/// A provider that cannot be created skips the tier with a
/// [`TierError::VisionUnavailable`] instead of failing the job.
pub fn vision_tier(
    config: &ConversionConfig,
) -> (Option<Arc<dyn VisionClient>>, Option<TierError>) {
    absorb_unavailable(resolve_vision_client(config))
}

fn absorb_unavailable(
    resolved: Result<Option<Arc<dyn VisionClient>>, Pdf2PptxError>,
) -> (Option<Arc<dyn VisionClient>>, Option<TierError>) {
    match resolved {
        Ok(client) => (client, None),
        Err(e) => {
            let err = TierError::VisionUnavailable {
                detail: e.to_string(),
            };
            warn!("{}", err);
            (None, Some(err))
        }
    }
}

// ── Analyzer ─────────────────────────────────────────────────────────────

/// Layouts for every page of a raster, plus the pages that failed.
#[derive(Debug, Default)]
pub struct VisionBatch {
    /// One layout per raster page, in raster order.
    pub layouts: Vec<VisionLayout>,
    pub failures: Vec<TierError>,
}

impl VisionBatch {
    pub fn total_elements(&self) -> usize {
        self.layouts.iter().map(|l| l.elements.len()).sum()
    }
}

/// Turns page bitmaps into [`VisionLayout`]s through a [`VisionClient`].
pub struct VisionAnalyzer {
    client: Arc<dyn VisionClient>,
    instruction: String,
    max_pixels: u32,
    progress: Option<ProgressCallback>,
}

impl VisionAnalyzer {
    pub fn new(client: Arc<dyn VisionClient>, config: &ConversionConfig) -> Self {
        Self {
            client,
            instruction: config
                .instruction
                .clone()
                .unwrap_or_else(|| DEFAULT_EXTRACTION_INSTRUCTION.to_string()),
            max_pixels: config.max_vision_pixels,
            progress: config.progress_callback.clone(),
        }
    }

    /// Analyse one page.
    ///
    /// `Err` only when the image could not be encoded or the call itself
    /// failed. An unusable reply is an empty layout, not an error.
    pub async fn analyze_page(&self, page: &PageBitmap) -> Result<VisionLayout, Pdf2PptxError> {
        let image = encode_page(&page.image, self.max_pixels).map_err(|e| {
            Pdf2PptxError::PictureEncodeFailed {
                slide: page.page_num,
                detail: e.to_string(),
            }
        })?;

        let start = Instant::now();
        let reply = self.client.describe(&self.instruction, image).await?;
        let layout = parse_layout_reply(&reply);

        debug!(
            "Page {}: {} elements from {} reply chars in {:?}",
            page.page_num,
            layout.elements.len(),
            reply.len(),
            start.elapsed()
        );
        Ok(layout)
    }

    /// Analyse every page in order. Never fails as a whole.
    pub async fn analyze_batch(&self, raster: &PageRaster) -> VisionBatch {
        let total = raster.len();
        let mut batch = VisionBatch::default();

        for page in &raster.pages {
            if let Some(ref cb) = self.progress {
                cb.on_page_start(page.page_num, total);
            }

            match self.analyze_page(page).await {
                Ok(layout) => {
                    if let Some(ref cb) = self.progress {
                        cb.on_page_complete(page.page_num, total, layout.elements.len());
                    }
                    batch.layouts.push(layout);
                }
                Err(e) => {
                    warn!("Page {}: vision call failed: {}", page.page_num, e);
                    if let Some(ref cb) = self.progress {
                        cb.on_page_error(page.page_num, total, &e.to_string());
                    }
                    batch.failures.push(TierError::VisionCall {
                        page: page.page_num,
                        detail: e.to_string(),
                    });
                    batch.layouts.push(VisionLayout::default());
                }
            }
        }

        info!(
            "Vision analysis: {} elements over {} pages ({} failed)",
            batch.total_elements(),
            total,
            batch.failures.len()
        );
        batch
    }
}
