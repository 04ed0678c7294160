//! Error types for the gg-pdf library.
//!
//! Every stage returns [`GgPdfError`]. Each variant belongs to exactly one
//! [`ErrorKind`], which is what the CLI prints in front of the message and
//! what callers match on when they only care about the category of failure:
//!
//! * [`ErrorKind::InvalidArgument`] — bad flag or value, caught before I/O
//! * [`ErrorKind::InputNotFound`] — the input file does not exist
//! * [`ErrorKind::OutputExists`] — an output is present and `force` is off
//! * [`ErrorKind::MalformedInput`] — JSON/markdown with an unexpected shape
//! * [`ErrorKind::ConversionFailed`] — the external converter or pdfium failed
//! * [`ErrorKind::Io`] — reading inputs or writing outputs failed
//!
//! Nothing is retried; a failed stage reports and stops.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`GgPdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidArgument,
    InputNotFound,
    OutputExists,
    MalformedInput,
    ConversionFailed,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::InputNotFound => "InputNotFound",
            ErrorKind::OutputExists => "OutputExists",
            ErrorKind::MalformedInput => "MalformedInput",
            ErrorKind::ConversionFailed => "ConversionFailed",
            ErrorKind::Io => "Io",
        };
        f.write_str(name)
    }
}

/// All errors returned by the gg-pdf library.
#[derive(Debug, Error)]
pub enum GgPdfError {
    // ── Argument errors ───────────────────────────────────────────────────
    /// A flag or value failed validation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The file exists but does not start with the `%PDF` signature.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path (or is not a regular file).
    #[error("{} not found or is not a file.", path.display())]
    InputNotFound { path: PathBuf },

    /// Input could not be parsed into the expected shape.
    #[error("Malformed input '{}': {detail}", path.display())]
    MalformedInput { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// One or more outputs already exist and overwriting was not requested.
    #[error("{} already exists. Use --force to overwrite.", display_paths(paths))]
    OutputExists { paths: Vec<PathBuf> },

    // ── Converter errors ──────────────────────────────────────────────────
    /// The external document converter reported a failure.
    #[error("Conversion of '{}' failed: {}", path.display(), messages.join("; "))]
    ConversionFailed { path: PathBuf, messages: Vec<String> },

    /// The converter bridge could not be started at all.
    #[error("Document converter is unavailable: {reason}\n{hint}")]
    ConverterUnavailable { reason: String, hint: String },

    /// The converter ran longer than the configured timeout.
    #[error("Conversion of '{}' timed out after {secs}s", path.display())]
    ConversionTimeout { path: PathBuf, secs: u64 },

    /// pdfium could not open the document.
    #[error("PDF '{}' could not be opened: {detail}", path.display())]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read an input file.
    #[error("Failed to read '{}': {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write an output file or directory.
    #[error("Failed to write '{}': {source}", path.display())]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GgPdfError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GgPdfError::InvalidArgument(_) | GgPdfError::NotAPdf { .. } => {
                ErrorKind::InvalidArgument
            }
            GgPdfError::InputNotFound { .. } => ErrorKind::InputNotFound,
            GgPdfError::MalformedInput { .. } => ErrorKind::MalformedInput,
            GgPdfError::OutputExists { .. } => ErrorKind::OutputExists,
            GgPdfError::ConversionFailed { .. }
            | GgPdfError::ConverterUnavailable { .. }
            | GgPdfError::ConversionTimeout { .. }
            | GgPdfError::CorruptPdf { .. }
            | GgPdfError::PdfiumBindingFailed(_) => ErrorKind::ConversionFailed,
            GgPdfError::ReadFailed { .. }
            | GgPdfError::OutputWriteFailed { .. }
            | GgPdfError::Internal(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        GgPdfError::MalformedInput {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
