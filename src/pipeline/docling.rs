//! The external document converter and its docling implementation.
//!
//! PDF parsing, OCR and table-structure recognition all happen inside
//! docling, a Python library. [`DoclingConverter`] runs a small bridge script
//! (embedded in the binary) with the configured interpreter:
//!
//! ```text
//! gg-pdf ──spawn──▶ python3 -c <bridge> '{"input": ..., "pages": [1, 50], ...}'
//!                      │
//!                      ├─ writes  <tmp>/document.md, <tmp>/document.json
//!                      └─ prints  {"status": "success", "errors": []}
//! ```
//!
//! The stage code only talks to the [`DocumentConverter`] trait, so tests
//! substitute an in-memory converter and never need Python.
//!
//! Bridge exit codes: `0` converted (possibly partially), `3` docling
//! reported a failure, `4` docling is not importable.

use crate::config::PageRange;
use crate::error::GgPdfError;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, info, warn};

const BRIDGE_SCRIPT: &str = include_str!("docling_bridge.py");

const EXIT_FAILURE: i32 = 3;
const EXIT_UNAVAILABLE: i32 = 4;

const INSTALL_HINT: &str =
    "Install docling into the interpreter's environment (pip install docling), \
or point GG_PDF_PYTHON / --python at an interpreter that has it.";

/// Outcome reported by the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStatus {
    Success,
    /// Some pages or elements failed; the outputs are usable but incomplete.
    PartialSuccess,
    Failure,
}

/// Options forwarded to the converter.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub ocr: bool,
    pub pages: PageRange,
    /// Kill the converter when it runs longer than this.
    pub timeout: Option<Duration>,
}

/// What a converter hands back: both renderings plus its own verdict.
#[derive(Debug, Clone)]
pub struct ConvertedDocument {
    pub markdown: String,
    pub json: String,
    pub status: ConversionStatus,
    /// Error messages the converter attached to the result.
    pub messages: Vec<String>,
}

impl ConvertedDocument {
    pub fn failed(messages: Vec<String>) -> Self {
        Self {
            markdown: String::new(),
            json: String::new(),
            status: ConversionStatus::Failure,
            messages,
        }
    }
}

/// Turns a PDF into markdown and document-model JSON.
///
/// A converter returns `Ok` with [`ConversionStatus::Failure`] when the
/// engine ran and rejected the document; `Err` is reserved for cases where
/// it could not run at all (missing interpreter, timeout, I/O).
pub trait DocumentConverter: Send + Sync {
    fn convert(
        &self,
        input: &Path,
        options: &ConvertOptions,
    ) -> impl Future<Output = Result<ConvertedDocument, GgPdfError>> + Send;
}

// ── docling bridge ───────────────────────────────────────────────────────────

/// Runs docling through the configured Python interpreter.
#[derive(Debug, Clone)]
pub struct DoclingConverter {
    python: OsString,
}

impl Default for DoclingConverter {
    fn default() -> Self {
        Self {
            python: OsString::from("python3"),
        }
    }
}

#[derive(Serialize)]
struct BridgeArgs<'a> {
    input: &'a Path,
    markdown_out: PathBuf,
    json_out: PathBuf,
    ocr: bool,
    pages: Option<(usize, usize)>,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum BridgeStatus {
    Success,
    PartialSuccess,
    Failure,
    Unavailable,
}

#[derive(Debug, Deserialize, PartialEq)]
struct BridgeReport {
    status: BridgeStatus,
    #[serde(default)]
    errors: Vec<String>,
}

impl DoclingConverter {
    /// Use `python` (a name on `PATH` or an absolute path) as the interpreter.
    pub fn with_python(python: impl Into<OsString>) -> Self {
        Self {
            python: python.into(),
        }
    }

    async fn run(&self, input: &Path, options: &ConvertOptions) -> Result<ConvertedDocument, GgPdfError> {
        let workdir = tempfile::TempDir::new()
            .map_err(|e| GgPdfError::Internal(format!("Failed to create temp dir: {e}")))?;
        let args = BridgeArgs {
            input,
            markdown_out: workdir.path().join("document.md"),
            json_out: workdir.path().join("document.json"),
            ocr: options.ocr,
            pages: options.pages.bounds(),
        };
        let encoded = serde_json::to_string(&args)
            .map_err(|e| GgPdfError::Internal(format!("Failed to encode bridge args: {e}")))?;

        info!(
            "Starting docling via {} (ocr={}, pages={})",
            self.python.to_string_lossy(),
            options.ocr,
            options.pages
        );

        let child = tokio::process::Command::new(&self.python)
            .arg("-c")
            .arg(BRIDGE_SCRIPT)
            .arg(&encoded)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| GgPdfError::ConverterUnavailable {
                reason: format!("could not start '{}': {e}", self.python.to_string_lossy()),
                hint: INSTALL_HINT.to_string(),
            })?;

        let waited = match options.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| GgPdfError::ConversionTimeout {
                    path: input.to_path_buf(),
                    secs: limit.as_secs(),
                })?,
            None => child.wait_with_output().await,
        };
        let output = waited
            .map_err(|e| GgPdfError::Internal(format!("Failed to wait for converter: {e}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let report = interpret(input, output.status.code(), &stdout, &stderr)?;

        let status = match report.status {
            BridgeStatus::Failure => return Ok(ConvertedDocument::failed(report.errors)),
            BridgeStatus::PartialSuccess => ConversionStatus::PartialSuccess,
            _ => ConversionStatus::Success,
        };

        let markdown = read_bridge_output(&args.markdown_out).await?;
        let json = read_bridge_output(&args.json_out).await?;
        debug!(
            "docling produced {} bytes of markdown, {} bytes of JSON",
            markdown.len(),
            json.len()
        );

        Ok(ConvertedDocument {
            markdown,
            json,
            status,
            messages: report.errors,
        })
    }
}

impl DocumentConverter for DoclingConverter {
    async fn convert(
        &self,
        input: &Path,
        options: &ConvertOptions,
    ) -> Result<ConvertedDocument, GgPdfError> {
        self.run(input, options).await
    }
}

/// Map the bridge's exit code and status line to a report.
///
/// The status line is the last non-empty stdout line; anything docling
/// prints before it is ignored.
fn interpret(
    input: &Path,
    code: Option<i32>,
    stdout: &str,
    stderr: &str,
) -> Result<BridgeReport, GgPdfError> {
    let report = stdout
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(|line| serde_json::from_str::<BridgeReport>(line.trim()).ok());

    match (code, report) {
        (Some(EXIT_UNAVAILABLE), report) | (_, report @ Some(BridgeReport { status: BridgeStatus::Unavailable, .. })) => {
            let reason = report
                .map(|r| r.errors.join("; "))
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| "docling is not installed".to_string());
            Err(GgPdfError::ConverterUnavailable {
                reason,
                hint: INSTALL_HINT.to_string(),
            })
        }
        (Some(0), Some(report)) | (Some(EXIT_FAILURE), Some(report)) => Ok(report),
        (code, report) => {
            let mut messages = report.map(|r| r.errors).unwrap_or_default();
            messages.extend(stderr_tail(stderr, 5));
            if messages.is_empty() {
                messages.push(match code {
                    Some(code) => format!("converter exited with status {code}"),
                    None => "converter was terminated by a signal".to_string(),
                });
            }
            warn!("docling bridge ended unexpectedly (exit code {:?})", code);
            Err(GgPdfError::ConversionFailed {
                path: input.to_path_buf(),
                messages,
            })
        }
    }
}

fn stderr_tail(stderr: &str, max_lines: usize) -> Vec<String> {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(max_lines)..]
        .iter()
        .map(|l| l.trim().to_string())
        .collect()
}

async fn read_bridge_output(path: &Path) -> Result<String, GgPdfError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GgPdfError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })
}
