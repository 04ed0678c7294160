//! File-system edges of every stage: input checks, overwrite guard, writes.
//!
//! All checks that can fail cheaply run before the expensive work. A missing
//! input or an existing output is reported before docling is even started,
//! and the overwrite guard reports every collision at once rather than the
//! first one it trips over.

use crate::error::GgPdfError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Fail with `InputNotFound` unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<(), GgPdfError> {
    if !path.is_file() {
        return Err(GgPdfError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Validate a PDF input: it must exist and start with the `%PDF` signature.
///
/// The signature check turns "docling choked on a text file" into an
/// argument error the user can act on.
pub fn resolve_pdf(path: &Path) -> Result<PathBuf, GgPdfError> {
    require_file(path)?;

    let mut file = std::fs::File::open(path).map_err(|e| GgPdfError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        match file.read(&mut magic[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) => {
                return Err(GgPdfError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        }
    }
    if &magic != b"%PDF" {
        return Err(GgPdfError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path.to_path_buf())
}

/// Fail with `OutputExists` listing every path in `outputs` that exists,
/// unless `force` is set.
pub fn guard_outputs(outputs: &[PathBuf], force: bool) -> Result<(), GgPdfError> {
    if force {
        return Ok(());
    }
    let existing: Vec<PathBuf> = outputs.iter().filter(|p| p.exists()).cloned().collect();
    if existing.is_empty() {
        Ok(())
    } else {
        Err(GgPdfError::OutputExists { paths: existing })
    }
}

/// Create `dir` and any missing parents.
pub async fn create_output_dir(dir: &Path) -> Result<(), GgPdfError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| GgPdfError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })
}

/// Read a UTF-8 text input.
pub async fn read_text(path: &Path) -> Result<String, GgPdfError> {
    require_file(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| GgPdfError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    String::from_utf8(bytes).map_err(|e| GgPdfError::malformed(path, format!("not valid UTF-8: {e}")))
}

/// Write `contents` to `path`, replacing any existing file.
pub async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<(), GgPdfError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| GgPdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    debug!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn missing_input_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let err = resolve_pdf(&dir.path().join("nope.pdf")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
        assert!(err.to_string().contains("not found or is not a file"));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let err = resolve_pdf(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"hello world").unwrap();
        match resolve_pdf(&path).unwrap_err() {
            GgPdfError::NotAPdf { magic, .. } => assert_eq!(&magic, b"hell"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.pdf");
        std::fs::write(&path, b"%P").unwrap();
        assert_eq!(resolve_pdf(&path).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn pdf_signature_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("book.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert_eq!(resolve_pdf(&path).unwrap(), path);
    }

    #[test]
    fn guard_lists_all_collisions() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("book.md");
        let json = dir.path().join("book.json");
        std::fs::write(&md, "x").unwrap();
        std::fs::write(&json, "{}").unwrap();

        let outputs = vec![md.clone(), json.clone()];
        match guard_outputs(&outputs, false).unwrap_err() {
            GgPdfError::OutputExists { paths } => assert_eq!(paths, outputs),
            other => panic!("unexpected error: {other}"),
        }
        assert!(guard_outputs(&outputs, true).is_ok());
    }

    #[test]
    fn guard_passes_when_nothing_exists() {
        let dir = TempDir::new().unwrap();
        assert!(guard_outputs(&[dir.path().join("a.md")], false).is_ok());
    }

    #[tokio::test]
    async fn read_text_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = read_text(&path).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[tokio::test]
    async fn write_output_creates_file_in_new_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        create_output_dir(&nested).await.unwrap();
        let path = nested.join("out.md");
        write_output(&path, "# Hi\n").await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "# Hi\n");
    }
}
