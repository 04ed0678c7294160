//! What each stage returns once its files are on disk.
//!
//! The library never prints. Every result type carries the data plus the
//! exact human-facing lines (`done_line`, warnings, advisories) so the CLI
//! and any other front end report the same thing.

use crate::pipeline::docling::ConversionStatus;
use crate::pipeline::outline::{format_toc_tree, redundant_bookmarks, TocEntry, NO_BOOKMARKS_ADVICE};
use crate::pipeline::summary::DocumentSummary;
use serde::Serialize;
use std::path::{Path, PathBuf};

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ── convert ──────────────────────────────────────────────────────────────────

/// Result of a successful `convert`.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertOutput {
    pub markdown_path: PathBuf,
    pub json_path: PathBuf,
    /// `Success` or `PartialSuccess`; failures are returned as errors.
    pub status: ConversionStatus,
    /// Messages the converter attached, mostly relevant for partial success.
    pub messages: Vec<String>,
    pub summary: DocumentSummary,
    /// Whether OCR was requested; suppresses the OCR advisory.
    pub ocr: bool,
}

impl ConvertOutput {
    /// `Done: 3 pages, 1 tables -> core.md, core.json`
    pub fn done_line(&self) -> String {
        format!(
            "Done: {} pages, {} tables -> {}, {}",
            self.summary.page_count,
            self.summary.table_count,
            file_name(&self.markdown_path),
            file_name(&self.json_path)
        )
    }

    pub fn is_partial(&self) -> bool {
        self.status == ConversionStatus::PartialSuccess
    }

    /// Suggest `--ocr` when it was off and some pages came back without text.
    pub fn ocr_advisory(&self) -> Option<String> {
        if self.ocr {
            return None;
        }
        self.summary.ocr_advisory()
    }
}

// ── split-md ─────────────────────────────────────────────────────────────────

/// One written chapter file.
#[derive(Debug, Clone, Serialize)]
pub struct ChapterFile {
    pub path: PathBuf,
    /// Heading that opened the chapter; `None` for the preamble.
    pub heading: Option<String>,
    pub bytes: usize,
}

/// Result of a successful `split-md`.
#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub files: Vec<ChapterFile>,
    /// Non-fatal notes such as truncated file names.
    pub warnings: Vec<String>,
}

impl SplitOutput {
    /// `Split core.md into 12 files in out/`
    pub fn done_line(&self) -> String {
        let mut dir = self.output_dir.display().to_string();
        if !dir.ends_with(std::path::MAIN_SEPARATOR) {
            dir.push(std::path::MAIN_SEPARATOR);
        }
        format!(
            "Split {} into {} files in {}",
            file_name(&self.input),
            self.files.len(),
            dir
        )
    }

    /// File names in write order, one per line, indented.
    pub fn file_listing(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("  {}", file_name(&f.path)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── extract-tables ───────────────────────────────────────────────────────────

/// Result of a successful `extract-tables`.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractOutput {
    pub output_path: PathBuf,
    pub table_count: usize,
}

impl ExtractOutput {
    /// `Done: 4 tables -> core.tables.json`
    pub fn done_line(&self) -> String {
        format!(
            "Done: {} tables -> {}",
            self.table_count,
            file_name(&self.output_path)
        )
    }
}

// ── bookmarks ────────────────────────────────────────────────────────────────

/// The outline of a PDF.
#[derive(Debug, Clone, Serialize)]
pub struct BookmarksOutput {
    pub entries: Vec<TocEntry>,
}

impl BookmarksOutput {
    pub fn redundant_count(&self) -> usize {
        redundant_bookmarks(&self.entries).len()
    }

    /// The annotated tree, or the "no bookmarks" advice.
    pub fn render(&self) -> String {
        format_toc_tree(&self.entries).unwrap_or_else(|| NO_BOOKMARKS_ADVICE.to_string())
    }
}
