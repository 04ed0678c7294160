//! Chapter splitting: cut one markdown document into per-chapter segments.
//!
//! The chapter level is the shallowest heading level present (or an explicit
//! override). Every heading at that level starts a new segment that runs up
//! to the next one; anything before the first chapter heading is front
//! matter. Segments are exact slices of the input, so writing them out in
//! order and concatenating the files gives back the original document.

use crate::pipeline::headings::scan_headings;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Longest slug used in a chapter file name, before the ordinal prefix.
pub const MAX_SLUG_LEN: usize = 80;

/// Slug used for the segment holding content before the first chapter.
pub const FRONT_MATTER_SLUG: &str = "preamble";

/// One contiguous piece of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// 0 for front matter, 1.. for chapters in document order.
    pub ordinal: usize,
    /// Chapter heading text; `None` for front matter.
    pub heading: Option<String>,
    /// The exact bytes of the segment.
    pub body: &'a str,
}

impl Segment<'_> {
    pub fn is_front_matter(&self) -> bool {
        self.heading.is_none()
    }
}

/// Split `markdown` on headings of `level` (default: the shallowest level present).
///
/// Returns the segments in document order. The front-matter segment is only
/// present when there is non-whitespace content before the first chapter;
/// whitespace-only front matter is folded into the first chapter. A document
/// with no chapter headings yields one front-matter segment holding
/// everything.
pub fn split_chapters(markdown: &str, level: Option<u8>) -> Vec<Segment<'_>> {
    let headings = scan_headings(markdown);
    let Some(chapter_level) = level.or_else(|| headings.iter().map(|h| h.level).min()) else {
        return vec![Segment {
            ordinal: 0,
            heading: None,
            body: markdown,
        }];
    };

    let chapters: Vec<_> = headings
        .into_iter()
        .filter(|h| h.level == chapter_level)
        .collect();
    if chapters.is_empty() {
        return vec![Segment {
            ordinal: 0,
            heading: None,
            body: markdown,
        }];
    }

    let mut segments = Vec::with_capacity(chapters.len() + 1);
    let front = &markdown[..chapters[0].byte_offset];
    let first_start = if front.trim().is_empty() {
        0
    } else {
        segments.push(Segment {
            ordinal: 0,
            heading: None,
            body: front,
        });
        chapters[0].byte_offset
    };

    for (i, chapter) in chapters.iter().enumerate() {
        let start = if i == 0 { first_start } else { chapter.byte_offset };
        let end = chapters
            .get(i + 1)
            .map(|next| next.byte_offset)
            .unwrap_or(markdown.len());
        segments.push(Segment {
            ordinal: i + 1,
            heading: Some(chapter.text.clone()),
            body: &markdown[start..end],
        });
    }

    segments
}

/// Width of the zero-padded ordinal prefix for `chapter_count` chapters.
pub fn ordinal_width(chapter_count: usize) -> usize {
    chapter_count.to_string().len().max(2)
}

// ── Slugs ────────────────────────────────────────────────────────────────────

static RE_CHAPTER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(chapter|part|section|appendix)\s+[\dA-Za-z]+[:\-.\s]\s*").unwrap()
});

static RE_NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Convert heading text into a filename-safe slug.
///
/// `Chapter 3 - Combat` becomes `combat`; `Hello, World! (2024)` becomes
/// `hello-world-2024`. Slugs longer than `max_len` are cut back to the last
/// hyphen boundary. Pass `None` to disable truncation.
pub fn slugify(text: &str, max_len: Option<usize>) -> String {
    let text = RE_CHAPTER_PREFIX.replace(text.trim(), "");
    let lower = text.to_lowercase();
    let slug = RE_NON_SLUG.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "untitled" } else { slug };

    match max_len {
        Some(max) if slug.len() > max => {
            let cut = &slug[..max];
            let cut = match cut.rfind('-') {
                Some(pos) if pos > 0 => &cut[..pos],
                _ => cut,
            };
            cut.trim_end_matches('-').to_string()
        }
        _ => slug.to_string(),
    }
}

// ── Image placeholders ───────────────────────────────────────────────────────

static RE_IMAGE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^!\[[^\]]*\]\(image://[^)]*\)[ \t]*\r?$").unwrap());

static RE_EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?:\r?\n){3,}").unwrap());

/// Remove docling `![..](image://..)` placeholder lines and collapse the
/// blank lines they leave behind. Real image links are kept.
pub fn strip_image_placeholders(text: &str) -> String {
    let without = RE_IMAGE_PLACEHOLDER.replace_all(text, "");
    RE_EXCESS_NEWLINES
        .replace_all(&without, |caps: &Captures<'_>| {
            if caps[0].starts_with('\r') {
                "\r\n\r\n"
            } else {
                "\n\n"
            }
        })
        .into_owned()
}
