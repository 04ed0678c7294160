//! PDF-facing entry points: `convert` and `bookmarks`.
//!
//! [`convert`] is the only long-running stage. Everything that can fail
//! cheaply (missing input, wrong signature, existing outputs) is checked
//! before the converter starts, and the overwrite guard runs a second time
//! after it returns, since a multi-minute docling run leaves plenty of time
//! for another process to write the same files.

use crate::config::{BookmarksRequest, ConvertRequest};
use crate::error::GgPdfError;
use crate::output::{BookmarksOutput, ConvertOutput};
use crate::pipeline::docling::{ConversionStatus, ConvertOptions, DocumentConverter};
use crate::pipeline::headings::normalize_headings;
use crate::pipeline::summary::DocumentSummary;
use crate::pipeline::{input, outline};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Convert one PDF into `<stem>.md` and `<stem>.json` in the output directory.
///
/// # Errors
/// - `InputNotFound` / `NotAPdf` for a bad input path
/// - `OutputExists` when either output exists and `force` is off; checked
///   before and after conversion
/// - `ConversionFailed` (and friends) when the converter fails or reports
///   a failure status
/// - `OutputWriteFailed` when the output directory or a file cannot be written
pub async fn convert<C: DocumentConverter>(
    request: &ConvertRequest,
    converter: &C,
) -> Result<ConvertOutput, GgPdfError> {
    let started = Instant::now();
    info!("Starting conversion: {}", request.input.display());

    // ── Step 1: Validate input and outputs ───────────────────────────────
    let pdf_path = input::resolve_pdf(&request.input)?;
    let outputs = [request.markdown_path(), request.json_path()];
    input::guard_outputs(&outputs, request.force)?;
    input::create_output_dir(&request.output_dir).await?;

    // ── Step 2: Run the converter ────────────────────────────────────────
    let options = ConvertOptions {
        ocr: request.ocr,
        pages: request.pages,
        timeout: request.timeout_secs.map(Duration::from_secs),
    };
    if let Some(ref cb) = request.progress_callback {
        cb.on_conversion_start(&pdf_path);
    }
    let converted = converter.convert(&pdf_path, &options).await;
    let succeeded = matches!(
        &converted,
        Ok(doc) if doc.status != ConversionStatus::Failure
    );
    if let Some(ref cb) = request.progress_callback {
        cb.on_conversion_complete(succeeded);
    }
    let document = converted?;

    if document.status == ConversionStatus::Failure {
        let mut messages = document.messages;
        if messages.is_empty() {
            messages.push("converter reported a failure without details".to_string());
        }
        return Err(GgPdfError::ConversionFailed {
            path: pdf_path,
            messages,
        });
    }
    if document.status == ConversionStatus::PartialSuccess {
        info!(
            "Conversion partially succeeded with {} message(s)",
            document.messages.len()
        );
    }

    let model: serde_json::Value = serde_json::from_str(&document.json).map_err(|e| {
        GgPdfError::ConversionFailed {
            path: pdf_path.clone(),
            messages: vec![format!("converter produced invalid JSON: {e}")],
        }
    })?;
    let summary = DocumentSummary::from_document(&model);
    debug!(
        "Document has {} pages, {} tables, {} without text",
        summary.page_count,
        summary.table_count,
        summary.empty_pages.len()
    );

    // ── Step 3: Re-check, normalize, write ───────────────────────────────
    input::guard_outputs(&outputs, request.force)?;

    let markdown = normalize_headings(
        &document.markdown,
        request.heading_strategy,
        request.max_heading_level,
    );
    let [markdown_path, json_path] = outputs;
    input::write_output(&markdown_path, &markdown).await?;
    if let Some(ref cb) = request.progress_callback {
        cb.on_file_written(&markdown_path);
    }
    input::write_output(&json_path, &document.json).await?;
    if let Some(ref cb) = request.progress_callback {
        cb.on_file_written(&json_path);
    }

    info!(
        "Conversion complete: {} pages, {} tables in {}ms",
        summary.page_count,
        summary.table_count,
        started.elapsed().as_millis()
    );

    Ok(ConvertOutput {
        markdown_path,
        json_path,
        status: document.status,
        messages: document.messages,
        summary,
        ocr: request.ocr,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a current-thread tokio runtime internally; do not call it from
/// inside another runtime.
pub fn convert_sync<C: DocumentConverter>(
    request: &ConvertRequest,
    converter: &C,
) -> Result<ConvertOutput, GgPdfError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| GgPdfError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(request, converter))
}

/// Read the outline of a PDF. Needs pdfium, not docling.
pub async fn bookmarks(request: &BookmarksRequest) -> Result<BookmarksOutput, GgPdfError> {
    let pdf_path = input::resolve_pdf(&request.input)?;
    let entries = outline::read_bookmarks(&pdf_path).await?;
    Ok(BookmarksOutput { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeadingStrategy;
    use crate::error::ErrorKind;
    use crate::pipeline::docling::ConvertedDocument;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct StubConverter {
        document: ConvertedDocument,
        calls: AtomicUsize,
    }

    impl StubConverter {
        fn new(status: ConversionStatus, markdown: &str) -> Self {
            Self {
                document: ConvertedDocument {
                    markdown: markdown.to_string(),
                    json: r#"{"pages": {"1": {}, "2": {}}, "texts": [{"prov": [{"page_no": 1}]}], "tables": []}"#
                        .to_string(),
                    status,
                    messages: vec!["page 2: layout model failed".to_string()],
                },
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DocumentConverter for StubConverter {
        async fn convert(
            &self,
            _input: &Path,
            _options: &ConvertOptions,
        ) -> Result<ConvertedDocument, GgPdfError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    fn pdf_in(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("core.pdf");
        std::fs::write(&path, b"%PDF-1.7\n%stub\n").unwrap();
        path
    }

    #[tokio::test]
    async fn writes_normalized_markdown_and_raw_json() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path().join("out"))
            .build()
            .unwrap();
        let converter = StubConverter::new(ConversionStatus::Success, "## A\n\n#### B\n");

        let out = convert(&request, &converter).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&out.markdown_path).unwrap(),
            "# A\n\n## B\n"
        );
        assert_eq!(
            std::fs::read_to_string(&out.json_path).unwrap(),
            converter.document.json
        );
        assert_eq!(out.summary.page_count, 2);
        assert_eq!(out.summary.empty_pages, vec![2]);
        assert!(out.ocr_advisory().is_some());
    }

    #[tokio::test]
    async fn failure_status_becomes_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path())
            .build()
            .unwrap();
        let converter = StubConverter::new(ConversionStatus::Failure, "");

        let err = convert(&request, &converter).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert!(err.to_string().contains("layout model failed"));
        assert!(!request.markdown_path().exists());
    }

    #[tokio::test]
    async fn partial_success_still_writes() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path())
            .heading_strategy(HeadingStrategy::None)
            .build()
            .unwrap();
        let converter = StubConverter::new(ConversionStatus::PartialSuccess, "#### Deep\n");

        let out = convert(&request, &converter).await.unwrap();
        assert!(out.is_partial());
        assert_eq!(out.messages.len(), 1);
        assert_eq!(
            std::fs::read_to_string(&out.markdown_path).unwrap(),
            "#### Deep\n"
        );
    }

    #[tokio::test]
    async fn existing_output_stops_before_converter_runs() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path())
            .build()
            .unwrap();
        std::fs::write(request.json_path(), "{}").unwrap();
        let converter = StubConverter::new(ConversionStatus::Success, "# A\n");

        let err = convert(&request, &converter).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputExists);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn invalid_converter_json_is_conversion_failed() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path())
            .build()
            .unwrap();
        let mut converter = StubConverter::new(ConversionStatus::Success, "# A\n");
        converter.document.json = "not json".to_string();

        let err = convert(&request, &converter).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConversionFailed);
        assert!(err.to_string().contains("invalid JSON"));
    }

    #[test]
    fn sync_wrapper_runs_outside_a_runtime() {
        let dir = TempDir::new().unwrap();
        let request = ConvertRequest::builder(pdf_in(&dir))
            .output_dir(dir.path())
            .build()
            .unwrap();
        let converter = StubConverter::new(ConversionStatus::Success, "# A\n");
        let out = convert_sync(&request, &converter).unwrap();
        assert!(out.markdown_path.exists());
    }
}
