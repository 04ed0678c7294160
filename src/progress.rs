//! Progress-callback trait for conversion events.
//!
//! A docling run over a 300-page rulebook takes minutes, during which the
//! library has nothing to return. Inject an [`Arc<dyn ConvertProgressCallback>`]
//! via [`crate::config::ConvertRequestBuilder::progress_callback`] to hear
//! about the run as it happens: the CLI drives a terminal spinner from it,
//! tests record the events.
//!
//! # Example
//!
//! ```rust
//! use gg_pdf::{ConvertProgressCallback, ConvertRequest};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! struct Logger;
//!
//! impl ConvertProgressCallback for Logger {
//!     fn on_file_written(&self, path: &Path) {
//!         eprintln!("wrote {}", path.display());
//!     }
//! }
//!
//! let request = ConvertRequest::builder("core.pdf")
//!     .progress_callback(Arc::new(Logger))
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the convert stage as it moves through its steps.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait ConvertProgressCallback: Send + Sync {
    /// Called right before the external converter is started.
    ///
    /// # Arguments
    /// * `input`: the PDF being converted
    fn on_conversion_start(&self, input: &Path) {
        let _ = input;
    }

    /// Called when the converter has returned, successfully or not.
    ///
    /// # Arguments
    /// * `succeeded`: false when the converter reported a failure
    fn on_conversion_complete(&self, succeeded: bool) {
        let _ = succeeded;
    }

    /// Called after each output file has been written.
    fn on_file_written(&self, path: &Path) {
        let _ = path;
    }
}

/// Shared, thread-safe progress callback.
pub type ProgressCallback = Arc<dyn ConvertProgressCallback>;

/// A callback that ignores every event.
pub struct NoopProgressCallback;

impl ConvertProgressCallback for NoopProgressCallback {}
