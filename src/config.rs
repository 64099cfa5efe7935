//! Configuration types for PDF-to-PPTX conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The vision credential is part of the
//! config (an explicit client or a provider name), never read implicitly by
//! the analyzer, so tests can run the whole pipeline with a scripted client.

use crate::error::Pdf2PptxError;
use crate::pipeline::vision::VisionClient;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for one PDF/image-to-PPTX job.
///
/// # Example
/// ```rust
/// use edgequake_pdf2pptx::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .use_vision(false)
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 150);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering DPI for PDF pages. Range: 72–400. Default: 200.
    pub dpi: u32,

    /// Maximum width or height of a page bitmap in pixels. Default: 2000.
    ///
    /// Applied to rendered PDF pages and to standalone page images alike.
    pub max_rendered_pixels: u32,

    /// Longest side of the bitmap sent to the vision model. Default: 1920.
    pub max_vision_pixels: u32,

    /// Longest side of embedded images kept by direct extraction. Default: 1200.
    pub max_embedded_image_pixels: u32,

    /// Embedded images considered per page by direct extraction. Default: 5.
    pub max_images_per_page: usize,

    /// A page must carry more than this many characters for direct extraction
    /// to be trusted. Default: 20.
    pub min_text_chars: usize,

    /// Try the vision tier when a credential is available. Default: true.
    pub use_vision: bool,

    /// Pre-constructed vision client. Takes precedence over `provider_name`.
    pub vision_client: Option<Arc<dyn VisionClient>>,

    /// LLM provider name (e.g. "openai", "gemini", "anthropic").
    pub provider_name: Option<String>,

    /// LLM model identifier. If None, uses [`DEFAULT_VISION_MODEL`].
    pub model: Option<String>,

    /// Sampling temperature for the vision call. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens the model may generate per page. Default: 8192.
    ///
    /// A dense slide can list dozens of elements; the JSON reply is long.
    pub max_tokens: usize,

    /// Custom extraction instruction. If None, uses the built-in one.
    pub instruction: Option<String>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Page selection. Default: all pages.
    pub pages: PageSelection,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Receives per-page and per-job events.
    pub progress_callback: Option<ProgressCallback>,
}

/// Model used when a provider is named without a model.
pub const DEFAULT_VISION_MODEL: &str = "gpt-4.1-mini";

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 2000,
            max_vision_pixels: 1920,
            max_embedded_image_pixels: 1200,
            max_images_per_page: 5,
            min_text_chars: crate::model::SUFFICIENT_TEXT_CHARS,
            use_vision: true,
            vision_client: None,
            provider_name: None,
            model: None,
            temperature: 0.1,
            max_tokens: 8192,
            instruction: None,
            password: None,
            pages: PageSelection::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("max_vision_pixels", &self.max_vision_pixels)
            .field("max_embedded_image_pixels", &self.max_embedded_image_pixels)
            .field("max_images_per_page", &self.max_images_per_page)
            .field("min_text_chars", &self.min_text_chars)
            .field("use_vision", &self.use_vision)
            .field(
                "vision_client",
                &self.vision_client.as_ref().map(|_| "<dyn VisionClient>"),
            )
            .field("provider_name", &self.provider_name)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("pages", &self.pages)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn max_vision_pixels(mut self, px: u32) -> Self {
        self.config.max_vision_pixels = px.max(100);
        self
    }

    pub fn max_embedded_image_pixels(mut self, px: u32) -> Self {
        self.config.max_embedded_image_pixels = px.max(16);
        self
    }

    pub fn max_images_per_page(mut self, n: usize) -> Self {
        self.config.max_images_per_page = n;
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn use_vision(mut self, v: bool) -> Self {
        self.config.use_vision = v;
        self
    }

    pub fn vision_client(mut self, client: Arc<dyn VisionClient>) -> Self {
        self.config.vision_client = Some(client);
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn instruction(mut self, prompt: impl Into<String>) -> Self {
        self.config.instruction = Some(prompt.into());
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2PptxError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(Pdf2PptxError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.max_tokens == 0 {
            return Err(Pdf2PptxError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the source to convert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum PageSelection {
    /// Convert all pages (default).
    #[default]
    All,
    /// Convert a single page (1-indexed).
    Single(usize),
    /// Convert a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Convert specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}
