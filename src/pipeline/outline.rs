//! PDF outline (bookmark) inspection.
//!
//! Publishers pad rulebook outlines with index-style entries ("Sword, Long
//! p.140") that sit at the top level next to the real parts and chapters.
//! [`drop_redundant_bookmarks`] finds them, and [`format_toc_tree`] prints the
//! whole outline with those entries annotated, which helps choose a
//! `--heading-strategy` before spending minutes on a conversion.
//!
//! Reading the outline uses pdfium, which is blocking, so [`read_bookmarks`]
//! moves the work onto tokio's blocking pool.

use crate::error::GgPdfError;
use pdfium_render::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One outline entry, in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TocEntry {
    /// Nesting depth, 1 for top-level entries.
    pub level: usize,
    pub title: String,
    /// 1-based destination page; 0 when the entry has no resolvable target.
    pub page: usize,
}

impl TocEntry {
    pub fn new(level: usize, title: impl Into<String>, page: usize) -> Self {
        Self {
            level,
            title: title.into(),
            page,
        }
    }
}

/// Indices of the entries in `toc` that look like index entries rather than
/// document structure.
///
/// A leaf (an entry not directly followed by a deeper one) is redundant when
/// its page falls inside the span of a non-leaf sibling under the same
/// parent. A sibling's span is `[start, next non-leaf sibling)` or
/// `[start, deepest descendant page)`, whichever catches it. In addition,
/// when the top level mixes leaves with non-leaves, every top-level leaf is
/// redundant.
pub fn redundant_bookmarks(toc: &[TocEntry]) -> HashSet<usize> {
    let n = toc.len();
    let mut redundant = HashSet::new();
    if n == 0 {
        return redundant;
    }

    let is_leaf: Vec<bool> = (0..n)
        .map(|i| toc.get(i + 1).is_none_or(|next| next.level <= toc[i].level))
        .collect();

    let mut parent: Vec<Option<usize>> = vec![None; n];
    let mut stack: Vec<usize> = Vec::new();
    for (i, entry) in toc.iter().enumerate() {
        while stack.last().is_some_and(|&top| toc[top].level >= entry.level) {
            stack.pop();
        }
        parent[i] = stack.last().copied();
        stack.push(i);
    }

    let bounded_end: Vec<Option<usize>> = (0..n)
        .map(|i| {
            if is_leaf[i] {
                return None;
            }
            (i + 1..n)
                .find(|&j| parent[j] == parent[i] && toc[j].level == toc[i].level && !is_leaf[j])
                .map(|j| toc[j].page)
        })
        .collect();

    // Children always follow their parent, so one reverse pass propagates
    // the deepest page all the way up.
    let mut max_desc_page: Vec<usize> = toc.iter().map(|e| e.page).collect();
    for i in (0..n).rev() {
        if let Some(p) = parent[i] {
            max_desc_page[p] = max_desc_page[p].max(max_desc_page[i]);
        }
    }

    for i in (0..n).filter(|&i| is_leaf[i]) {
        let page = toc[i].page;
        let inside_sibling = (0..n)
            .filter(|&j| j != i && !is_leaf[j] && parent[j] == parent[i])
            .any(|j| {
                let start = toc[j].page;
                let in_bounded = bounded_end[j].is_some_and(|end| start <= page && page < end);
                in_bounded || (start <= page && page < max_desc_page[j])
            });
        if inside_sibling {
            redundant.insert(i);
        }
    }

    let root_has_non_leaf = (0..n).any(|i| parent[i].is_none() && !is_leaf[i]);
    if root_has_non_leaf {
        redundant.extend((0..n).filter(|&i| parent[i].is_none() && is_leaf[i]));
    }

    redundant
}

/// `toc` without its redundant entries, order preserved.
pub fn drop_redundant_bookmarks(toc: &[TocEntry]) -> Vec<TocEntry> {
    let redundant = redundant_bookmarks(toc);
    toc.iter()
        .enumerate()
        .filter(|(i, _)| !redundant.contains(i))
        .map(|(_, e)| e.clone())
        .collect()
}

const LINE_WIDTH: usize = 60;
const MIN_LEADER: usize = 2;
const REDUNDANT_NOTE: &str = "  [redundant, dropped by default]";

/// Render `toc` as an indented tree with dot leaders and a closing
/// `N levels, M entries` line. Returns `None` for an empty outline.
///
/// ```text
/// L1  Part I ................................................ p.1
///   L2  Chapter 1 ........................................... p.2
/// L1  Index Entry ........................................... p.5  [redundant, dropped by default]
///
/// 2 levels, 3 entries
/// ```
pub fn format_toc_tree(toc: &[TocEntry]) -> Option<String> {
    if toc.is_empty() {
        return None;
    }

    let redundant = redundant_bookmarks(toc);
    let mut lines = Vec::with_capacity(toc.len() + 2);
    for (i, entry) in toc.iter().enumerate() {
        let indent = "  ".repeat(entry.level.saturating_sub(1));
        let prefix = format!("{indent}L{}  {} ", entry.level, entry.title);
        let suffix = format!(" p.{}", entry.page);
        let used = prefix.chars().count() + suffix.chars().count();
        let dots = ".".repeat(LINE_WIDTH.saturating_sub(used).max(MIN_LEADER));
        let mut line = format!("{prefix}{dots}{suffix}");
        if redundant.contains(&i) {
            line.push_str(REDUNDANT_NOTE);
        }
        lines.push(line);
    }

    let max_level = toc.iter().map(|e| e.level).max().unwrap_or(0);
    lines.push(String::new());
    lines.push(format!("{max_level} levels, {} entries", toc.len()));
    Some(lines.join("\n"))
}

/// Printed instead of a tree when the PDF has no outline.
pub const NO_BOOKMARKS_ADVICE: &str = "No bookmarks found in this PDF.\n\
Consider using --heading-strategy numbering or none with gg-pdf convert.";

// ── pdfium ───────────────────────────────────────────────────────────────────

/// Read the outline of the PDF at `path`, depth-first.
pub async fn read_bookmarks(path: &Path) -> Result<Vec<TocEntry>, GgPdfError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_bookmarks_blocking(&path))
        .await
        .map_err(|e| GgPdfError::Internal(format!("Outline task panicked: {e}")))?
}

fn read_bookmarks_blocking(path: &Path) -> Result<Vec<TocEntry>, GgPdfError> {
    let pdfium = bind_pdfium()?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| GgPdfError::CorruptPdf {
            path: path.to_path_buf(),
            detail: format!("{e:?}"),
        })?;

    let mut toc = Vec::new();
    let mut next = document.bookmarks().root();
    while let Some(bookmark) = next {
        collect(&bookmark, 1, &mut toc);
        next = bookmark.next_sibling();
    }

    info!("Read {} bookmarks from {}", toc.len(), path.display());
    Ok(toc)
}

fn collect(bookmark: &PdfBookmark<'_>, level: usize, out: &mut Vec<TocEntry>) {
    let title = bookmark.title().unwrap_or_default();
    let page = bookmark
        .destination()
        .and_then(|dest| dest.page_index().ok())
        .and_then(|index| usize::try_from(index).ok())
        .map(|index| index + 1)
        .unwrap_or(0);
    out.push(TocEntry { level, title, page });

    let mut child = bookmark.first_child();
    while let Some(c) = child {
        collect(&c, level + 1, out);
        child = c.next_sibling();
    }
}

/// Bind to `$PDFIUM_LIB_PATH` when set, else the system pdfium.
fn bind_pdfium() -> Result<Pdfium, GgPdfError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(lib) => {
            let mut lib = PathBuf::from(lib);
            if lib.is_dir() {
                lib = Pdfium::pdfium_platform_library_name_at_path(&lib);
            }
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(&lib)
        }
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| GgPdfError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toc(entries: &[(usize, &str, usize)]) -> Vec<TocEntry> {
        entries
            .iter()
            .map(|&(level, title, page)| TocEntry::new(level, title, page))
            .collect()
    }

    fn titles(entries: &[TocEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.title.as_str()).collect()
    }

    fn rulebook() -> Vec<TocEntry> {
        toc(&[
            (1, "Part I: Core Rules", 1),
            (2, "Chapter 1: Introduction", 2),
            (2, "Chapter 2: Characters", 10),
            (1, "Part II: Advanced Rules", 50),
            (2, "Chapter 3: Combat", 51),
            (1, "Part III: Appendices", 80),
            (2, "Appendix A: Tables", 81),
            (1, "Ball, Lightning", 5),
            (1, "Rogue", 12),
            (1, "Sword, Long", 55),
        ])
    }

    #[test]
    fn structural_entries_are_kept() {
        let kept = drop_redundant_bookmarks(&rulebook());
        let kept = titles(&kept);
        for title in [
            "Part I: Core Rules",
            "Chapter 1: Introduction",
            "Chapter 2: Characters",
            "Part II: Advanced Rules",
            "Chapter 3: Combat",
            "Part III: Appendices",
            "Appendix A: Tables",
        ] {
            assert!(kept.contains(&title), "missing {title}");
        }
    }

    #[test]
    fn index_entries_inside_part_spans_are_dropped() {
        let kept = drop_redundant_bookmarks(&rulebook());
        let kept = titles(&kept);
        assert!(!kept.contains(&"Ball, Lightning"));
        assert!(!kept.contains(&"Rogue"));
        assert!(!kept.contains(&"Sword, Long"));
        assert_eq!(kept.len(), 7);
    }

    #[test]
    fn empty_outline() {
        assert!(drop_redundant_bookmarks(&[]).is_empty());
        assert!(format_toc_tree(&[]).is_none());
    }

    #[test]
    fn all_leaf_roots_are_kept() {
        let flat = toc(&[(1, "Introduction", 1), (1, "Getting Started", 5), (1, "Appendix", 20)]);
        assert_eq!(drop_redundant_bookmarks(&flat).len(), 3);
    }

    #[test]
    fn deep_leaves_without_structural_siblings_are_kept() {
        let deep = toc(&[
            (1, "Part I", 1),
            (2, "Chapter 1", 2),
            (3, "Section 1.1", 3),
            (4, "Detail A", 4),
            (4, "Detail B", 5),
        ]);
        assert_eq!(drop_redundant_bookmarks(&deep).len(), 5);
    }

    #[test]
    fn childless_chapter_after_sibling_span_is_kept() {
        let entries = toc(&[
            (1, "Part I", 1),
            (2, "Chapter 1", 2),
            (3, "Section 1.1", 3),
            (2, "Chapter 2: Quick Start", 10),
        ]);
        let kept = drop_redundant_bookmarks(&entries);
        assert!(titles(&kept).contains(&"Chapter 2: Quick Start"));
    }

    #[test]
    fn root_leaves_dropped_next_to_structural_roots() {
        let entries = toc(&[
            (1, "Part I: Core Rules", 1),
            (2, "Chapter 1", 2),
            (1, "Part II: Advanced", 50),
            (2, "Chapter 2", 51),
            (1, "Alchemy", 1),
            (1, "Beasts", 1),
            (1, "Curses", 1),
        ]);
        let kept = drop_redundant_bookmarks(&entries);
        assert_eq!(
            titles(&kept),
            vec!["Part I: Core Rules", "Chapter 1", "Part II: Advanced", "Chapter 2"]
        );
    }

    #[test]
    fn leaf_inside_sibling_content_span_is_dropped() {
        let entries = toc(&[
            (1, "Part I", 1),
            (2, "Chapter 1", 2),
            (3, "Section 1.1", 3),
            (3, "Section 1.2", 8),
            (2, "Index: Sword", 4),
            (2, "Chapter 2", 10),
        ]);
        let kept = drop_redundant_bookmarks(&entries);
        let kept = titles(&kept);
        assert!(!kept.contains(&"Index: Sword"));
        assert!(kept.contains(&"Chapter 1"));
        assert!(kept.contains(&"Chapter 2"));
    }

    #[test]
    fn tree_indents_and_counts() {
        let entries = toc(&[
            (1, "Part I", 1),
            (2, "Chapter 1", 2),
            (3, "Section A", 3),
        ]);
        let tree = format_toc_tree(&entries).unwrap();
        let lines: Vec<&str> = tree.lines().collect();
        assert!(lines[0].starts_with("L1  Part I "));
        assert!(lines[1].starts_with("  L2  Chapter 1 "));
        assert!(lines[2].starts_with("    L3  Section A "));
        assert!(lines[2].ends_with(" p.3"));
        assert_eq!(lines[3], "");
        assert_eq!(lines[4], "3 levels, 3 entries");
    }

    #[test]
    fn tree_pads_to_sixty_columns() {
        let tree = format_toc_tree(&toc(&[(1, "Intro", 1)])).unwrap();
        let first = tree.lines().next().unwrap();
        assert_eq!(first.chars().count(), LINE_WIDTH);
        assert!(first.contains(".."));
        assert!(tree.ends_with("1 levels, 1 entries"));
    }

    #[test]
    fn long_titles_keep_minimum_leader() {
        let long = "A".repeat(80);
        let tree = format_toc_tree(&toc(&[(1, &long, 123)])).unwrap();
        assert!(tree.lines().next().unwrap().ends_with(" .. p.123"));
    }

    #[test]
    fn tree_annotates_redundant_entries() {
        let entries = toc(&[
            (1, "Part I", 1),
            (2, "Chapter 1", 2),
            (2, "Chapter 2", 10),
            (1, "Part II", 50),
            (2, "Chapter 3", 51),
            (1, "Index Entry", 5),
        ]);
        let tree = format_toc_tree(&entries).unwrap();
        for line in tree.lines() {
            if line.contains("Index Entry") {
                assert!(line.ends_with(REDUNDANT_NOTE));
            }
            if line.contains("Part I ") || line.contains("Part II") {
                assert!(!line.contains("redundant"));
            }
        }
        assert!(tree.ends_with("2 levels, 6 entries"));
    }
}
