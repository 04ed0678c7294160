//! Table simplification: reduce a docling document to plain table grids.
//!
//! docling's JSON carries every table as a list of cells with row/column
//! offsets, spans, header flags and bounding boxes. Downstream consumers
//! (spreadsheets, lookup scripts, LLM prompts) want a rectangle of strings.
//! [`simplify_tables`] places each cell on a grid, repeats the text of
//! spanning cells into every position they cover and drops everything else,
//! so all rows of a table have the same width.

use crate::error::GgPdfError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::Range;
use std::path::Path;
use tracing::{debug, warn};

/// One table reduced to its cell text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplifiedTable {
    /// Position of the table in the source document's `tables` array.
    pub index: usize,
    /// Rows of cell text; every row has the same length.
    pub rows: Vec<Vec<String>>,
}

impl SimplifiedTable {
    pub fn num_cols(&self) -> usize {
        self.rows.first().map(Vec::len).unwrap_or(0)
    }
}

// ── docling document model (only the parts we read) ──────────────────────────

#[derive(Debug, Deserialize)]
struct DoclingTable {
    data: TableData,
}

#[derive(Debug, Deserialize)]
struct TableData {
    #[serde(default)]
    num_rows: usize,
    #[serde(default)]
    num_cols: usize,
    #[serde(default)]
    table_cells: Vec<TableCell>,
    #[serde(default)]
    grid: Vec<Vec<GridCell>>,
}

#[derive(Debug, Deserialize)]
struct TableCell {
    text: String,
    start_row_offset_idx: usize,
    end_row_offset_idx: usize,
    start_col_offset_idx: usize,
    end_col_offset_idx: usize,
    #[serde(default = "one")]
    row_span: usize,
    #[serde(default = "one")]
    col_span: usize,
}

#[derive(Debug, Deserialize)]
struct GridCell {
    #[serde(default)]
    text: String,
}

fn one() -> usize {
    1
}

/// Largest row or column index a table may reach.
const MAX_TABLE_EXTENT: usize = 10_000;
/// Largest grid a single table may expand to.
const MAX_TABLE_CELLS: usize = 1_000_000;

/// Row and column ranges a cell covers on the grid.
struct Placement {
    rows: Range<usize>,
    cols: Range<usize>,
}

impl TableCell {
    /// Exclusive ends fall back to the span when the offsets are inconsistent.
    /// `None` when an end overflows or lands past [`MAX_TABLE_EXTENT`].
    fn placement(&self) -> Option<Placement> {
        let row_end = self
            .start_row_offset_idx
            .checked_add(self.row_span.max(1))?
            .max(self.end_row_offset_idx);
        let col_end = self
            .start_col_offset_idx
            .checked_add(self.col_span.max(1))?
            .max(self.end_col_offset_idx);
        if row_end > MAX_TABLE_EXTENT || col_end > MAX_TABLE_EXTENT {
            return None;
        }
        Some(Placement {
            rows: self.start_row_offset_idx..row_end,
            cols: self.start_col_offset_idx..col_end,
        })
    }
}

/// Extract every table of a docling document, in document order.
///
/// `source` is only used to name the file in error messages.
///
/// # Errors
/// [`GgPdfError::MalformedInput`] naming the first structural expectation the
/// document violates: a non-object root, a missing or non-array `tables`
/// collection, or a table whose fields do not match the model.
pub fn simplify_tables(document: &Value, source: &Path) -> Result<Vec<SimplifiedTable>, GgPdfError> {
    let root = document
        .as_object()
        .ok_or_else(|| GgPdfError::malformed(source, "document root is not a JSON object"))?;
    let tables = root
        .get("tables")
        .ok_or_else(|| GgPdfError::malformed(source, "missing `tables` collection"))?
        .as_array()
        .ok_or_else(|| GgPdfError::malformed(source, "`tables` is not an array"))?;

    let mut simplified = Vec::with_capacity(tables.len());
    for (index, raw) in tables.iter().enumerate() {
        let table = DoclingTable::deserialize(raw)
            .map_err(|e| GgPdfError::malformed(source, format!("table #{index}: {e}")))?;
        let rows = table_rows(&table.data)
            .map_err(|detail| GgPdfError::malformed(source, format!("table #{index}: {detail}")))?;
        debug!(
            "Table #{}: {} rows x {} cols",
            index,
            rows.len(),
            rows.first().map(Vec::len).unwrap_or(0)
        );
        simplified.push(SimplifiedTable { index, rows });
    }

    Ok(simplified)
}

/// Parse `text` as JSON and extract its tables.
pub fn simplify_tables_str(text: &str, source: &Path) -> Result<Vec<SimplifiedTable>, GgPdfError> {
    let document: Value = serde_json::from_str(text)
        .map_err(|e| GgPdfError::malformed(source, format!("not valid JSON: {e}")))?;
    simplify_tables(&document, source)
}

fn table_rows(data: &TableData) -> Result<Vec<Vec<String>>, String> {
    if data.table_cells.is_empty() {
        return Ok(grid_rows(&data.grid));
    }
    if data.num_rows > MAX_TABLE_EXTENT || data.num_cols > MAX_TABLE_EXTENT {
        return Err(format!(
            "declared size {}x{} out of range",
            data.num_rows, data.num_cols
        ));
    }

    let placements = data
        .table_cells
        .iter()
        .enumerate()
        .map(|(k, cell)| {
            cell.placement()
                .ok_or_else(|| format!("cell #{k} offsets out of range"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let height = placements
        .iter()
        .map(|p| p.rows.end)
        .max()
        .unwrap_or(0)
        .max(data.num_rows);
    let width = placements
        .iter()
        .map(|p| p.cols.end)
        .max()
        .unwrap_or(0)
        .max(data.num_cols);
    if height.saturating_mul(width) > MAX_TABLE_CELLS {
        return Err(format!("{height}x{width} grid exceeds {MAX_TABLE_CELLS} cells"));
    }

    let mut grid: Vec<Vec<Option<&str>>> = vec![vec![None; width]; height];
    for (cell, placement) in data.table_cells.iter().zip(&placements) {
        for row in &mut grid[placement.rows.clone()] {
            for slot in &mut row[placement.cols.clone()] {
                match slot {
                    Some(existing) if *existing != cell.text => {
                        warn!("Overlapping table cells; keeping '{}'", existing);
                    }
                    Some(_) => {}
                    None => *slot = Some(cell.text.as_str()),
                }
            }
        }
    }

    Ok(grid
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|slot| slot.unwrap_or_default().to_string())
                .collect()
        })
        .collect())
}

/// docling's pre-expanded grid: only needs padding to a uniform width.
fn grid_rows(grid: &[Vec<GridCell>]) -> Vec<Vec<String>> {
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    grid.iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(|c| c.text.clone()).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect()
}
