//! Request types for the three pipeline stages and the outline inspector.
//!
//! Every stage takes one validated request struct. [`ConvertRequest`] has
//! enough knobs to warrant a builder ([`ConvertRequestBuilder`]); the other
//! requests are small enough to construct with [`SplitRequest::new`] and
//! friends and adjust with chained setters.
//!
//! Validation that needs no file system access (strategy names, page ranges,
//! level bounds) happens here, so bad arguments are rejected with
//! [`ErrorKind::InvalidArgument`](crate::error::ErrorKind) before any I/O.

use crate::error::GgPdfError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Deepest heading level markdown can express.
pub const MAX_MARKDOWN_LEVEL: u8 = 6;

// ── Heading strategy ─────────────────────────────────────────────────────

/// How the heading normalizer re-levels markdown headings after conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStrategy {
    /// Compress non-contiguous levels into `1..k`; contiguous runs starting
    /// at 1 or 2 pass through. (default)
    #[default]
    Auto,
    /// Demote headings deeper than the configured maximum, then compress.
    Filtered,
    /// Derive the level from a leading `2.1`-style number in the heading text.
    Numbering,
    /// Leave headings untouched.
    None,
}

impl HeadingStrategy {
    pub const ALL: [HeadingStrategy; 4] = [
        HeadingStrategy::Auto,
        HeadingStrategy::Filtered,
        HeadingStrategy::Numbering,
        HeadingStrategy::None,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HeadingStrategy::Auto => "auto",
            HeadingStrategy::Filtered => "filtered",
            HeadingStrategy::Numbering => "numbering",
            HeadingStrategy::None => "none",
        }
    }
}

impl fmt::Display for HeadingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HeadingStrategy {
    type Err = GgPdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        HeadingStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == wanted)
            .ok_or_else(|| {
                GgPdfError::InvalidArgument(format!(
                    "unknown heading strategy '{s}' (expected one of: auto, filtered, numbering, none)"
                ))
            })
    }
}

// ── Page range ───────────────────────────────────────────────────────────

/// Which pages of the PDF the converter should process (1-indexed, inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageRange {
    /// Convert every page (default).
    #[default]
    All,
    /// Convert a single page.
    Single(usize),
    /// Convert a contiguous range of pages.
    Range(usize, usize),
}

impl PageRange {
    /// Inclusive `(first, last)` bounds, or `None` for [`PageRange::All`].
    pub fn bounds(&self) -> Option<(usize, usize)> {
        match *self {
            PageRange::All => None,
            PageRange::Single(p) => Some((p, p)),
            PageRange::Range(start, end) => Some((start, end)),
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageRange::All => f.write_str("all"),
            PageRange::Single(p) => write!(f, "{p}"),
            PageRange::Range(start, end) => write!(f, "{start}-{end}"),
        }
    }
}

impl FromStr for PageRange {
    type Err = GgPdfError;

    /// Parse `all`, `5` or `10-50`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        if s == "all" || s.is_empty() {
            return Ok(PageRange::All);
        }

        let parse_page = |raw: &str, what: &str| -> Result<usize, GgPdfError> {
            let page: usize = raw.trim().parse().map_err(|_| {
                GgPdfError::InvalidArgument(format!("invalid {what} '{}' in --pages", raw.trim()))
            })?;
            if page < 1 {
                return Err(GgPdfError::InvalidArgument(format!(
                    "pages are 1-indexed, minimum is 1 (got {page})"
                )));
            }
            Ok(page)
        };

        if let Some((start, end)) = s.split_once('-') {
            let start = parse_page(start, "start page")?;
            let end = parse_page(end, "end page")?;
            if start > end {
                return Err(GgPdfError::InvalidArgument(format!(
                    "invalid page range '{start}-{end}': start must be <= end"
                )));
            }
            return Ok(PageRange::Range(start, end));
        }

        Ok(PageRange::Single(parse_page(&s, "page number")?))
    }
}

// ── Convert ──────────────────────────────────────────────────────────────

/// A validated request to convert one PDF into `<stem>.md` and `<stem>.json`.
///
/// Built via [`ConvertRequest::builder`].
///
/// ```rust
/// use gg_pdf::{ConvertRequest, HeadingStrategy, PageRange};
///
/// let request = ConvertRequest::builder("core-rules.pdf")
///     .output_dir("out")
///     .pages(PageRange::Range(10, 50))
///     .heading_strategy(HeadingStrategy::Numbering)
///     .build()
///     .unwrap();
/// assert_eq!(request.markdown_path(), std::path::Path::new("out/core-rules.md"));
/// ```
#[derive(Clone)]
pub struct ConvertRequest {
    /// PDF to convert.
    pub input: PathBuf,

    /// Directory receiving `<stem>.md` and `<stem>.json`. Created if missing.
    pub output_dir: PathBuf,

    /// Ask the converter to OCR pages. Default: false.
    ///
    /// Scanned rulebooks need it; born-digital ones convert several times
    /// faster without it. When it is off and pages come back without text,
    /// the dispatcher suggests turning it on.
    pub ocr: bool,

    /// Pages to convert. Default: all.
    pub pages: PageRange,

    /// Overwrite existing outputs. Default: false.
    pub force: bool,

    /// Heading normalization applied to the markdown output. Default: auto.
    pub heading_strategy: HeadingStrategy,

    /// Deepest heading level kept by [`HeadingStrategy::Filtered`]. Default: 3.
    pub max_heading_level: u8,

    /// Kill the converter after this many seconds. Default: no limit.
    pub timeout_secs: Option<u64>,

    /// Optional observer for stage events.
    pub progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for ConvertRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvertRequest")
            .field("input", &self.input)
            .field("output_dir", &self.output_dir)
            .field("ocr", &self.ocr)
            .field("pages", &self.pages)
            .field("force", &self.force)
            .field("heading_strategy", &self.heading_strategy)
            .field("max_heading_level", &self.max_heading_level)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConvertProgressCallback>"),
            )
            .finish()
    }
}

impl ConvertRequest {
    /// Create a new builder for the given input PDF.
    pub fn builder(input: impl Into<PathBuf>) -> ConvertRequestBuilder {
        ConvertRequestBuilder {
            request: ConvertRequest {
                input: input.into(),
                output_dir: PathBuf::from("."),
                ocr: false,
                pages: PageRange::default(),
                force: false,
                heading_strategy: HeadingStrategy::default(),
                max_heading_level: 3,
                timeout_secs: None,
                progress_callback: None,
            },
        }
    }

    /// File stem shared by both outputs (`core-rules` for `core-rules.pdf`).
    pub fn stem(&self) -> String {
        file_stem(&self.input)
    }

    pub fn markdown_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.md", self.stem()))
    }

    pub fn json_path(&self) -> PathBuf {
        self.output_dir.join(format!("{}.json", self.stem()))
    }
}

/// Builder for [`ConvertRequest`].
#[derive(Debug)]
pub struct ConvertRequestBuilder {
    request: ConvertRequest,
}

impl ConvertRequestBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.request.output_dir = dir.into();
        self
    }

    pub fn ocr(mut self, v: bool) -> Self {
        self.request.ocr = v;
        self
    }

    pub fn pages(mut self, pages: PageRange) -> Self {
        self.request.pages = pages;
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.request.force = v;
        self
    }

    pub fn heading_strategy(mut self, strategy: HeadingStrategy) -> Self {
        self.request.heading_strategy = strategy;
        self
    }

    pub fn max_heading_level(mut self, level: u8) -> Self {
        self.request.max_heading_level = level;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.request.timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.request.progress_callback = Some(cb);
        self
    }

    /// Build the request, validating constraints that need no I/O.
    pub fn build(self) -> Result<ConvertRequest, GgPdfError> {
        let r = &self.request;
        if r.input.as_os_str().is_empty() {
            return Err(GgPdfError::InvalidArgument("input path is empty".into()));
        }
        if r.max_heading_level < 1 || r.max_heading_level > MAX_MARKDOWN_LEVEL {
            return Err(GgPdfError::InvalidArgument(format!(
                "max heading level must be 1–{MAX_MARKDOWN_LEVEL}, got {}",
                r.max_heading_level
            )));
        }
        if let PageRange::Range(start, end) = r.pages {
            if start < 1 || start > end {
                return Err(GgPdfError::InvalidArgument(format!(
                    "invalid page range '{start}-{end}'"
                )));
            }
        }
        if r.pages == PageRange::Single(0) {
            return Err(GgPdfError::InvalidArgument(
                "pages are 1-indexed, minimum is 1 (got 0)".into(),
            ));
        }
        if r.timeout_secs == Some(0) {
            return Err(GgPdfError::InvalidArgument(
                "timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.request)
    }
}

// ── Split ────────────────────────────────────────────────────────────────

/// A request to split one markdown file into per-chapter files.
#[derive(Debug, Clone)]
pub struct SplitRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    /// Split on this heading level instead of the shallowest level present.
    pub level: Option<u8>,
    pub force: bool,
    /// Drop `![..](image://..)` placeholder lines from written chapters.
    pub strip_image_placeholders: bool,
}

impl SplitRequest {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            level: None,
            force: false,
            strip_image_placeholders: false,
        }
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }

    pub fn force(mut self, v: bool) -> Self {
        self.force = v;
        self
    }

    pub fn strip_image_placeholders(mut self, v: bool) -> Self {
        self.strip_image_placeholders = v;
        self
    }

    pub fn validate(&self) -> Result<(), GgPdfError> {
        if let Some(level) = self.level {
            if level < 1 || level > MAX_MARKDOWN_LEVEL {
                return Err(GgPdfError::InvalidArgument(format!(
                    "split level must be 1–{MAX_MARKDOWN_LEVEL}, got {level}"
                )));
            }
        }
        Ok(())
    }
}

// ── Extract ──────────────────────────────────────────────────────────────

/// A request to reduce a document-model JSON file to its tables.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub force: bool,
}

impl ExtractRequest {
    pub fn new(input: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_dir: output_dir.into(),
            force: false,
        }
    }

    pub fn force(mut self, v: bool) -> Self {
        self.force = v;
        self
    }

    /// `<dir>/<stem>.tables.json`
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}.tables.json", file_stem(&self.input)))
    }
}

// ── Bookmarks ────────────────────────────────────────────────────────────

/// A request to print the outline of a PDF.
#[derive(Debug, Clone)]
pub struct BookmarksRequest {
    pub input: PathBuf,
}

impl BookmarksRequest {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}
