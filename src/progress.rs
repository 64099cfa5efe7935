//! Progress-callback trait for per-job conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as the pipeline rasterises, analyses and builds each page.
//!
//! Callers can forward events to a channel, a job record or a terminal
//! progress bar without the library knowing how the host communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdf2pptx::{ConversionProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     analysed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, elements: usize) {
//!         self.analysed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{}: {} elements", page_num, total_pages, elements);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     analysed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::output::ExtractionMethod;
use std::sync::Arc;

/// Called by the conversion pipeline as a job advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events for one job arrive sequentially, but several
/// jobs may share one callback, hence `Send + Sync`.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the source has been rasterised.
    ///
    /// # Arguments
    /// * `total_pages`: number of pages the job will produce slides for
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before the vision request is sent for a page.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when the vision model answered for a page.
    ///
    /// # Arguments
    /// * `elements`: elements parsed from the reply (may be 0)
    fn on_page_complete(&self, page_num: usize, total_pages: usize, elements: usize) {
        let _ = (page_num, total_pages, elements);
    }

    /// Called when the vision call for a page failed.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once the orchestrator has settled on a tier.
    fn on_method_selected(&self, method: ExtractionMethod) {
        let _ = method;
    }

    /// Called after the presentation has been written.
    fn on_conversion_complete(&self, slide_count: usize, method: ExtractionMethod) {
        let _ = (slide_count, method);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        method: Mutex<Option<ExtractionMethod>>,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_page_start(&self, _page_num: usize, _total_pages: usize) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_complete(&self, _page_num: usize, _total_pages: usize, _elements: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_page_error(&self, _page_num: usize, _total_pages: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_method_selected(&self, method: ExtractionMethod) {
            *self.method.lock().unwrap() = Some(method);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(5);
        cb.on_page_start(1, 5);
        cb.on_page_complete(1, 5, 12);
        cb.on_page_error(2, 5, "some error");
        cb.on_method_selected(ExtractionMethod::RasterFallback);
        cb.on_conversion_complete(5, ExtractionMethod::RasterFallback);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_page_start(1, 2);
        tracker.on_page_complete(1, 2, 7);
        tracker.on_page_start(2, 2);
        tracker.on_page_error(2, 2, "HTTP 503");
        tracker.on_method_selected(ExtractionMethod::VisionExtraction);

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
        assert_eq!(
            *tracker.method.lock().unwrap(),
            Some(ExtractionMethod::VisionExtraction)
        );
    }
}
