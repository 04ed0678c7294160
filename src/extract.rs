//! `extract-tables`: reduce a document-model JSON file to its tables.

use crate::config::ExtractRequest;
use crate::error::GgPdfError;
use crate::output::ExtractOutput;
use crate::pipeline::{input, tables};
use tracing::info;

/// Write `<stem>.tables.json` holding every table of the input document.
///
/// # Errors
/// - `InputNotFound` when the input is missing
/// - `OutputExists` when the target exists and `force` is off
/// - `MalformedInput` when the input is not a docling document
pub async fn extract_tables(request: &ExtractRequest) -> Result<ExtractOutput, GgPdfError> {
    input::require_file(&request.input)?;
    let output_path = request.output_path();
    input::guard_outputs(std::slice::from_ref(&output_path), request.force)?;

    let text = input::read_text(&request.input).await?;
    let simplified = tables::simplify_tables_str(&text, &request.input)?;
    info!(
        "Found {} tables in {}",
        simplified.len(),
        request.input.display()
    );

    let mut encoded = serde_json::to_string_pretty(&simplified)
        .map_err(|e| GgPdfError::Internal(format!("Failed to encode tables: {e}")))?;
    encoded.push('\n');

    input::create_output_dir(&request.output_dir).await?;
    input::write_output(&output_path, encoded).await?;

    Ok(ExtractOutput {
        output_path,
        table_count: simplified.len(),
    })
}
