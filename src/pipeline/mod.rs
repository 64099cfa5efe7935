//! Pipeline stages for PDF/image-to-PPTX conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and pdfium or the model can be swapped out behind
//! their traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ ┬─ vision (encode → model → reply) ─┬─▶ fallback ──▶ deck
//! (path/URL) (bitmaps)  └─ extract (runs, images, colour) ──┘   (one tier)
//! ```
//!
//! 1. [`input`]   : canonicalise paths or download a URL
//! 2. [`document`]: the decoded-document trait and its pdfium adapter
//! 3. [`render`]  : one bounded bitmap per selected page; `spawn_blocking`
//! 4. [`extract`] : direct text/image extraction for native documents
//! 5. [`encode`]  : PNG + base64 for the vision request
//! 6. [`vision`]  : the model call, one page at a time
//! 7. [`reply`]   : tolerant parsing of the model's JSON
//! 8. [`fallback`]: pick the tier whose output the deck is built from

pub mod document;
pub mod encode;
pub mod extract;
pub mod fallback;
pub mod input;
pub mod render;
pub mod reply;
pub mod vision;
