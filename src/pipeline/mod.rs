//! Building blocks behind the four commands.
//!
//! Each submodule does one job and is testable on its own; the stage entry
//! points in [`crate::convert`], [`crate::split`] and [`crate::extract`]
//! only sequence them and handle files.
//!
//! ## Data Flow
//!
//! ```text
//! convert:         input ──▶ docling ──▶ headings ──▶ files   (+ summary)
//! split-md:        input ──▶ split ──▶ files
//! extract-tables:  input ──▶ tables ──▶ file
//! bookmarks:       input ──▶ outline ──▶ stdout
//! ```
//!
//! 1. [`input`]    input checks, the overwrite guard and file writes
//! 2. [`docling`]  the [`docling::DocumentConverter`] seam and the
//!    child-process bridge to docling
//! 3. [`headings`] heading scanning and level normalization
//! 4. [`split`]    chapter segmentation and file-name slugs
//! 5. [`tables`]   docling tables reduced to uniform string grids
//! 6. [`summary`]  page/table counts for the summary line and OCR hint
//! 7. [`outline`]  PDF bookmarks via pdfium; runs in `spawn_blocking`

pub mod docling;
pub mod headings;
pub mod input;
pub mod outline;
pub mod split;
pub mod summary;
pub mod tables;
