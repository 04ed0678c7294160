//! # gg-pdf
//!
//! Turn RPG rulebook PDFs into markdown and structured JSON, then cut them
//! into pieces a person (or a model) can actually work with.
//!
//! PDF parsing, OCR and table recognition are docling's job; this crate
//! drives docling and then fixes up what comes out:
//!
//! ```text
//! rulebook.pdf
//!  │
//!  ├─ convert         docling → heading normalization → .md + .json
//!  ├─ split-md        .md → one file per chapter
//!  ├─ extract-tables  .json → plain row/column grids
//!  └─ bookmarks       PDF outline tree, index-style entries flagged
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gg_pdf::{convert, ConvertRequest, DoclingConverter, HeadingStrategy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = ConvertRequest::builder("core-rules.pdf")
//!         .output_dir("out")
//!         .heading_strategy(HeadingStrategy::Numbering)
//!         .build()?;
//!     let output = convert(&request, &DoclingConverter::default()).await?;
//!     println!("{}", output.done_line());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `gg-pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## Runtime requirements
//!
//! `convert` needs a Python interpreter with `docling` installed
//! (`python3` by default, see [`DoclingConverter::with_python`]).
//! `bookmarks` needs a pdfium shared library, found through
//! `PDFIUM_LIB_PATH` or the system library path. `split-md` and
//! `extract-tables` need neither.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    BookmarksRequest, ConvertRequest, ConvertRequestBuilder, ExtractRequest, HeadingStrategy,
    PageRange, SplitRequest,
};
pub use convert::{bookmarks, convert, convert_sync};
pub use error::{ErrorKind, GgPdfError};
pub use extract::extract_tables;
pub use output::{BookmarksOutput, ChapterFile, ConvertOutput, ExtractOutput, SplitOutput};
pub use pipeline::docling::{
    ConversionStatus, ConvertOptions, ConvertedDocument, DoclingConverter, DocumentConverter,
};
pub use pipeline::headings::{normalize_headings, scan_headings, HeadingRecord};
pub use pipeline::outline::{drop_redundant_bookmarks, format_toc_tree, TocEntry};
pub use pipeline::summary::DocumentSummary;
pub use pipeline::tables::{simplify_tables, SimplifiedTable};
pub use progress::{ConvertProgressCallback, NoopProgressCallback, ProgressCallback};
pub use split::split_markdown_file;
