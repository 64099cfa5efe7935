//! Error types for the edgequake-pdf2pptx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2PptxError`]: **Fatal**: the job cannot produce a presentation
//!   (source cannot be decoded, destination cannot be written, a builder was
//!   handed nothing to build). Returned as `Err(Pdf2PptxError)` from the
//!   top-level `convert*` functions.
//!
//! * [`TierError`]: **Non-fatal**: an extraction tier failed or produced too
//!   little to trust. The fallback orchestrator absorbs these and downgrades
//!   to the next tier; they are recorded in
//!   [`crate::output::ConversionOutput::downgrades`] for observability and are
//!   never returned as `Err`.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2pptx library.
#[derive(Debug, Error)]
pub enum Pdf2PptxError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The inputs do not form a single document or a list of page images.
    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// A page image has an extension other than png/jpg/jpeg.
    #[error("Unsupported image file '{path}': expected .png, .jpg or .jpeg")]
    UnsupportedImage { path: PathBuf },

    // ── Rasterization errors (fatal: no tier can run without bitmaps) ────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterization failed for page {page}: {detail}")]
    RasterizationFailed { page: usize, detail: String },

    /// A standalone page image could not be decoded.
    #[error("Failed to decode image '{path}': {detail}")]
    ImageDecodeFailed { path: PathBuf, detail: String },

    // ── Build errors ──────────────────────────────────────────────────────
    /// A deck builder was handed an empty input sequence.
    ///
    /// This is a contract violation upstream: the orchestrator selected a
    /// tier that has no data.
    #[error("Deck builder '{strategy}' received no pages")]
    BuildInput { strategy: &'static str },

    /// A bitmap could not be encoded for embedding in the presentation.
    #[error("Failed to encode picture for slide {slide}: {detail}")]
    PictureEncodeFailed { slide: usize, detail: String },

    /// The presentation package could not be assembled.
    #[error("Failed to assemble presentation package: {0}")]
    PackageFailed(String),

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider could not be instantiated.
    #[error("Vision provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The vision model call failed.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output presentation file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install pdfium into a system library directory.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Job wrapper ───────────────────────────────────────────────────────
    /// A fatal error, tagged with the job it aborted.
    #[error("Job {job_id} failed: {source}")]
    JobFailed {
        job_id: String,
        #[source]
        source: Box<Pdf2PptxError>,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2PptxError {
    /// True for errors raised while decoding the source into bitmaps.
    pub fn is_rasterization(&self) -> bool {
        match self {
            Pdf2PptxError::JobFailed { source, .. } => source.is_rasterization(),
            Pdf2PptxError::CorruptPdf { .. }
            | Pdf2PptxError::PasswordRequired { .. }
            | Pdf2PptxError::WrongPassword { .. }
            | Pdf2PptxError::RasterizationFailed { .. }
            | Pdf2PptxError::ImageDecodeFailed { .. }
            | Pdf2PptxError::PdfiumBindingFailed(_) => true,
            _ => false,
        }
    }
}

/// A non-fatal failure of one extraction tier.
///
/// Each value explains why the orchestrator moved down one tier.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum TierError {
    /// The vision model call failed for one page; that page got an empty layout.
    #[error("Page {page}: vision call failed: {detail}")]
    VisionCall { page: usize, detail: String },

    /// The configured vision provider could not be created; no page was sent.
    #[error("Vision provider unavailable: {detail}")]
    VisionUnavailable { detail: String },

    /// The vision tier ran but recognised no elements on any page.
    #[error("Vision analysis found no elements across {pages} pages")]
    NoVisionElements { pages: usize },

    /// Direct extraction yielded too little text on every page.
    #[error("Direct extraction found at most {best_page_chars} characters on a page (need more than {threshold})")]
    InsufficientExtraction {
        best_page_chars: usize,
        threshold: usize,
    },

    /// Direct extraction could not run at all.
    #[error("Direct extraction failed: {detail}")]
    DirectExtractionFailed { detail: String },

    /// Direct extraction does not apply to standalone images.
    #[error("Source is not a native document; direct extraction skipped")]
    NotADocument,
}
