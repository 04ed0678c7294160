//! Heading scanning and heading-hierarchy normalization.
//!
//! docling tags every section header it finds with the same markdown level,
//! and rulebooks number their sections inconsistently, so the heading levels
//! in converted markdown rarely describe the real outline. This module
//! re-levels heading lines according to a [`HeadingStrategy`] while leaving
//! every other byte of the document alone: heading text, body content, blank
//! lines and line endings all survive untouched. Only the leading `#` run of
//! a heading line is rewritten (or removed, when the `filtered` strategy
//! demotes a heading to body text).
//!
//! Lines inside fenced code blocks are never treated as headings.

use crate::config::{HeadingStrategy, MAX_MARKDOWN_LEVEL};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use tracing::debug;

/// One ATX heading found in a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingRecord {
    /// Nominal level: the length of the leading `#` run (1–6).
    pub level: u8,
    /// Heading text with the marker and surrounding whitespace removed.
    pub text: String,
    /// Zero-based line number of the heading.
    pub line_index: usize,
    /// Byte offset of the first character of the heading line.
    pub byte_offset: usize,
}

static RE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})[ \t]+(\S.*?)[ \t]*$").unwrap());

/// `2.1 Combat`, `3. Magic`, `1.2.3 Spells` (components of 1–3 digits, so a
/// leading year like `2024` is not mistaken for section numbering).
static RE_NUMBERING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}(?:\.\d{1,3})*)\.?(?:\s|$)").unwrap());

/// Scan `markdown` once and return its headings in document order.
pub fn scan_headings(markdown: &str) -> Vec<HeadingRecord> {
    let mut records = Vec::new();
    let mut fence: Option<(char, usize)> = None;
    let mut offset = 0usize;

    for (line_index, line) in markdown.split_inclusive('\n').enumerate() {
        let (content, _) = split_line_ending(line);

        if let Some(open) = fence {
            if closes_fence(content, open) {
                fence = None;
            }
        } else if let Some(marker) = fence_marker(content) {
            fence = Some(marker);
        } else if let Some(caps) = RE_HEADING.captures(content) {
            records.push(HeadingRecord {
                level: caps[1].len() as u8,
                text: caps[2].to_string(),
                line_index,
                byte_offset: offset,
            });
        }

        offset += line.len();
    }

    records
}

/// Rewrite heading levels in `markdown` according to `strategy`.
///
/// `max_level` is only consulted by [`HeadingStrategy::Filtered`].
pub fn normalize_headings(markdown: &str, strategy: HeadingStrategy, max_level: u8) -> String {
    let records = scan_headings(markdown);

    if records.is_empty() {
        return markdown.to_string();
    }
    // A lone top-level heading is already a consistent hierarchy.
    if records.len() == 1 && records[0].level == 1 {
        return markdown.to_string();
    }

    let targets: Vec<Option<u8>> = match strategy {
        HeadingStrategy::None => return markdown.to_string(),
        HeadingStrategy::Auto => match auto_levels(&records) {
            Some(levels) => levels.into_iter().map(Some).collect(),
            None => return markdown.to_string(),
        },
        HeadingStrategy::Numbering => records
            .iter()
            .map(|r| Some(numbering_level(&r.text).unwrap_or(r.level)))
            .collect(),
        HeadingStrategy::Filtered => filtered_levels(&records, max_level),
    };

    let changed = records
        .iter()
        .zip(&targets)
        .filter(|(r, t)| **t != Some(r.level))
        .count();
    debug!(
        "Heading strategy '{}': {} of {} headings re-levelled",
        strategy,
        changed,
        records.len()
    );

    rewrite(markdown, &records, &targets)
}

/// Level implied by a leading section number, if the text has one.
pub fn numbering_level(text: &str) -> Option<u8> {
    let caps = RE_NUMBERING.captures(text.trim_start())?;
    let components = caps[1].split('.').count();
    Some((components as u8).clamp(1, MAX_MARKDOWN_LEVEL))
}

// ── Strategies ───────────────────────────────────────────────────────────────

/// `None` when the levels already form a contiguous run starting at 1 or 2.
fn auto_levels(records: &[HeadingRecord]) -> Option<Vec<u8>> {
    let distinct: BTreeSet<u8> = records.iter().map(|r| r.level).collect();
    if is_contiguous(&distinct) && distinct.first().is_some_and(|&min| min <= 2) {
        return None;
    }
    let ranks = rank_table(&distinct);
    Some(records.iter().map(|r| ranks[r.level as usize]).collect())
}

fn filtered_levels(records: &[HeadingRecord], max_level: u8) -> Vec<Option<u8>> {
    let kept: BTreeSet<u8> = records
        .iter()
        .map(|r| r.level)
        .filter(|&level| level <= max_level)
        .collect();
    let ranks = rank_table(&kept);
    records
        .iter()
        .map(|r| (r.level <= max_level).then(|| ranks[r.level as usize]))
        .collect()
}

fn is_contiguous(levels: &BTreeSet<u8>) -> bool {
    levels
        .iter()
        .zip(levels.iter().skip(1))
        .all(|(a, b)| b - a == 1)
}

/// Map each present level to its 1-based rank among the present levels.
fn rank_table(levels: &BTreeSet<u8>) -> [u8; MAX_MARKDOWN_LEVEL as usize + 1] {
    let mut table = [0u8; MAX_MARKDOWN_LEVEL as usize + 1];
    for (rank, &level) in levels.iter().enumerate() {
        table[level as usize] = rank as u8 + 1;
    }
    table
}

// ── Rewriting ────────────────────────────────────────────────────────────────

fn rewrite(markdown: &str, records: &[HeadingRecord], targets: &[Option<u8>]) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut pending = records.iter().zip(targets).peekable();

    for (line_index, line) in markdown.split_inclusive('\n').enumerate() {
        match pending.peek() {
            Some((record, target)) if record.line_index == line_index => {
                let rest = &line[record.level as usize..];
                match target {
                    Some(level) => {
                        out.extend(std::iter::repeat_n('#', *level as usize));
                        out.push_str(rest);
                    }
                    None => out.push_str(rest.trim_start_matches([' ', '\t'])),
                }
                pending.next();
            }
            _ => out.push_str(line),
        }
    }

    out
}

// ── Line helpers ─────────────────────────────────────────────────────────────

pub(crate) fn split_line_ending(line: &str) -> (&str, &str) {
    let content = line.trim_end_matches(['\n', '\r']);
    (content, &line[content.len()..])
}

/// Opening code fence: up to three spaces, then three or more backticks or tildes.
fn fence_marker(content: &str) -> Option<(char, usize)> {
    let indent = content.len() - content.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let trimmed = &content[indent..];
    let ch = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let run = trimmed.chars().take_while(|c| *c == ch).count();
    (run >= 3).then_some((ch, run))
}

fn closes_fence(content: &str, (ch, len): (char, usize)) -> bool {
    match fence_marker(content) {
        Some((c, run)) => c == ch && run >= len && content.trim().chars().all(|x| x == ch),
        None => false,
    }
}
