//! Page and table counts read back from a converted document.
//!
//! Used for the one-line `Done:` summary and for the OCR advisory, so it is
//! deliberately lenient: missing or oddly shaped fields count as zero rather
//! than failing a conversion that already succeeded.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;

/// What the convert stage reports about a finished document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub page_count: usize,
    pub table_count: usize,
    /// Page numbers (1-based, ascending) on which no text item was found.
    pub empty_pages: Vec<usize>,
}

impl DocumentSummary {
    /// Summarise a docling document.
    ///
    /// `pages` is an object keyed by page number; a text item belongs to
    /// every page listed in its `prov[].page_no`.
    pub fn from_document(document: &Value) -> Self {
        let pages: BTreeSet<usize> = match document.get("pages") {
            Some(Value::Object(map)) => map.keys().filter_map(|k| k.parse().ok()).collect(),
            Some(Value::Array(items)) => (1..=items.len()).collect(),
            _ => BTreeSet::new(),
        };

        let with_text: BTreeSet<usize> = document
            .get("texts")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|item| item.get("prov").and_then(Value::as_array))
            .flatten()
            .filter_map(|prov| prov.get("page_no").and_then(Value::as_u64))
            .map(|p| p as usize)
            .collect();

        let table_count = document
            .get("tables")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0);

        DocumentSummary {
            page_count: pages.len(),
            table_count,
            empty_pages: pages.difference(&with_text).copied().collect(),
        }
    }

    /// `Note: ...` line suggesting `--ocr`, when pages came back empty.
    pub fn ocr_advisory(&self) -> Option<String> {
        if self.empty_pages.is_empty() {
            return None;
        }
        Some(format!(
            "Note: {} page(s) had no extractable text. Consider re-running with --ocr.",
            self.empty_pages.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_pages_tables_and_empty_pages() {
        let doc = json!({
            "pages": {"1": {"page_no": 1}, "2": {"page_no": 2}, "3": {"page_no": 3}},
            "texts": [
                {"text": "Title", "prov": [{"page_no": 1}]},
                {"text": "Body", "prov": [{"page_no": 3}]}
            ],
            "tables": [{"data": {}}]
        });
        let summary = DocumentSummary::from_document(&doc);
        assert_eq!(summary.page_count, 3);
        assert_eq!(summary.table_count, 1);
        assert_eq!(summary.empty_pages, vec![2]);
        assert_eq!(
            summary.ocr_advisory().as_deref(),
            Some("Note: 1 page(s) had no extractable text. Consider re-running with --ocr.")
        );
    }

    #[test]
    fn no_advisory_when_every_page_has_text() {
        let doc = json!({
            "pages": {"1": {}},
            "texts": [{"prov": [{"page_no": 1}]}],
            "tables": []
        });
        let summary = DocumentSummary::from_document(&doc);
        assert!(summary.empty_pages.is_empty());
        assert!(summary.ocr_advisory().is_none());
    }

    #[test]
    fn missing_fields_count_as_zero() {
        let summary = DocumentSummary::from_document(&json!({}));
        assert_eq!(summary, DocumentSummary::default());
    }

    #[test]
    fn page_range_conversion_keeps_original_numbers() {
        let doc = json!({
            "pages": {"10": {}, "11": {}},
            "texts": [{"prov": [{"page_no": 10}]}]
        });
        let summary = DocumentSummary::from_document(&doc);
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.empty_pages, vec![11]);
    }
}
