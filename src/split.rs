//! `split-md`: write one markdown file per chapter.

use crate::config::SplitRequest;
use crate::error::GgPdfError;
use crate::output::{ChapterFile, SplitOutput};
use crate::pipeline::input;
use crate::pipeline::split::{
    ordinal_width, slugify, split_chapters, strip_image_placeholders, Segment, FRONT_MATTER_SLUG,
    MAX_SLUG_LEN,
};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{info, warn};

const HEADING_PREVIEW_CHARS: usize = 40;

/// Split the markdown file named by `request` into `NN-<slug>.md` files.
///
/// Every target path is checked before the first write, so an
/// `OutputExists` error lists all collisions and leaves the directory
/// untouched.
pub async fn split_markdown_file(request: &SplitRequest) -> Result<SplitOutput, GgPdfError> {
    request.validate()?;
    let markdown = input::read_text(&request.input).await?;
    info!("Splitting {}", request.input.display());

    let segments = split_chapters(&markdown, request.level);
    let chapter_count = segments.iter().filter(|s| !s.is_front_matter()).count();
    let width = ordinal_width(chapter_count);

    let mut warnings = Vec::new();
    let planned: Vec<(PathBuf, &Segment<'_>)> = segments
        .iter()
        .map(|segment| {
            let name = file_name(segment, width, &mut warnings);
            (request.output_dir.join(name), segment)
        })
        .collect();

    let paths: Vec<PathBuf> = planned.iter().map(|(p, _)| p.clone()).collect();
    input::guard_outputs(&paths, request.force)?;
    input::create_output_dir(&request.output_dir).await?;

    let mut files = Vec::with_capacity(planned.len());
    for (path, segment) in planned {
        let body: Cow<'_, str> = if request.strip_image_placeholders {
            Cow::Owned(strip_image_placeholders(segment.body))
        } else {
            Cow::Borrowed(segment.body)
        };
        input::write_output(&path, body.as_bytes()).await?;
        files.push(ChapterFile {
            path,
            heading: segment.heading.clone(),
            bytes: body.len(),
        });
    }

    info!(
        "Wrote {} files ({} chapters) to {}",
        files.len(),
        chapter_count,
        request.output_dir.display()
    );

    Ok(SplitOutput {
        input: request.input.clone(),
        output_dir: request.output_dir.clone(),
        files,
        warnings,
    })
}

fn file_name(segment: &Segment<'_>, width: usize, warnings: &mut Vec<String>) -> String {
    let Some(heading) = segment.heading.as_deref() else {
        return format!("{:0width$}-{FRONT_MATTER_SLUG}.md", 0);
    };

    let slug = slugify(heading, Some(MAX_SLUG_LEN));
    if slugify(heading, None).len() > MAX_SLUG_LEN {
        let note = format!(
            "chapter {}: file name truncated for heading '{}'",
            segment.ordinal,
            preview(heading)
        );
        warn!("{}", note);
        warnings.push(note);
    }
    format!("{:0width$}-{slug}.md", segment.ordinal)
}

fn preview(heading: &str) -> String {
    let mut chars = heading.chars();
    let head: String = chars.by_ref().take(HEADING_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn names(out: &SplitOutput) -> Vec<String> {
        out.files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[tokio::test]
    async fn writes_preamble_and_numbered_chapters() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("core.md");
        let text = "Cover\n\n# Chapter 1: Core Rules\nrules\n# Combat\nfight\n# Combat\nagain\n";
        std::fs::write(&md, text).unwrap();

        let out = split_markdown_file(&SplitRequest::new(&md, dir.path().join("ch")))
            .await
            .unwrap();
        assert_eq!(
            names(&out),
            vec!["00-preamble.md", "01-core-rules.md", "02-combat.md", "03-combat.md"]
        );
        let joined: String = out
            .files
            .iter()
            .map(|f| std::fs::read_to_string(&f.path).unwrap())
            .collect();
        assert_eq!(joined, text);
        assert!(out.warnings.is_empty());
    }

    #[tokio::test]
    async fn collisions_are_reported_before_writing() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("core.md");
        std::fs::write(&md, "# A\na\n# B\nb\n").unwrap();
        let out_dir = dir.path().join("ch");
        std::fs::create_dir(&out_dir).unwrap();
        std::fs::write(out_dir.join("02-b.md"), "old").unwrap();

        let err = split_markdown_file(&SplitRequest::new(&md, &out_dir))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutputExists);
        assert!(!out_dir.join("01-a.md").exists());

        split_markdown_file(&SplitRequest::new(&md, &out_dir).force(true))
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(out_dir.join("02-b.md")).unwrap(), "# B\nb\n");
    }

    #[tokio::test]
    async fn long_heading_is_truncated_with_warning() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("long.md");
        let heading = vec!["Encounter"; 15].join(" ");
        std::fs::write(&md, format!("# {heading}\ntext\n")).unwrap();

        let out = split_markdown_file(&SplitRequest::new(&md, dir.path()))
            .await
            .unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(out.warnings[0].starts_with("chapter 1:"));
        assert!(out.warnings[0].contains("..."));
        let name = &names(&out)[0];
        assert!(name.len() <= "01-".len() + MAX_SLUG_LEN + ".md".len());
    }

    #[tokio::test]
    async fn strip_images_only_when_asked() {
        let dir = TempDir::new().unwrap();
        let md = dir.path().join("img.md");
        std::fs::write(&md, "# A\n\n![fig](image://1)\n\ntext\n").unwrap();

        let kept = split_markdown_file(&SplitRequest::new(&md, dir.path().join("keep")))
            .await
            .unwrap();
        assert!(std::fs::read_to_string(&kept.files[0].path)
            .unwrap()
            .contains("image://"));

        let stripped = split_markdown_file(
            &SplitRequest::new(&md, dir.path().join("strip")).strip_image_placeholders(true),
        )
        .await
        .unwrap();
        assert_eq!(
            std::fs::read_to_string(&stripped.files[0].path).unwrap(),
            "# A\n\ntext\n"
        );
    }

    #[tokio::test]
    async fn missing_input_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let err = split_markdown_file(&SplitRequest::new(dir.path().join("x.md"), dir.path()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputNotFound);
    }

    #[test]
    fn preview_shortens_long_headings() {
        assert_eq!(preview("Short"), "Short");
        let long = "x".repeat(50);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(40)));
    }
}
