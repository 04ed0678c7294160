//! CLI binary for gg-pdf.
//!
//! A thin shim over the library crate: maps subcommands and flags to the
//! request types, runs one stage, prints its summary, and turns errors into
//! `error[<Kind>]: <message>` plus exit code 1. Argument errors are clap's
//! and exit with 2.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use gg_pdf::{
    bookmarks, convert, extract_tables, split_markdown_file, BookmarksRequest,
    ConvertProgressCallback, ConvertRequest, DoclingConverter, ExtractRequest, GgPdfError,
    HeadingStrategy, PageRange, ProgressCallback, SplitRequest,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner shown while docling works. docling gives no per-page progress
/// over the bridge, so elapsed time is all there is to show.
struct CliProgressCallback {
    bar: ProgressBar,
    started: std::sync::Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        Arc::new(Self {
            bar,
            started: std::sync::Mutex::new(None),
        })
    }
}

impl ConvertProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, input: &Path) {
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        self.bar.set_prefix("Converting");
        self.bar.set_message(
            input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        self.bar.enable_steady_tick(Duration::from_millis(80));
        if let Ok(mut started) = self.started.lock() {
            *started = Some(Instant::now());
        }
    }

    fn on_conversion_complete(&self, succeeded: bool) {
        self.bar.finish_and_clear();
        let elapsed = self
            .started
            .lock()
            .ok()
            .and_then(|s| *s)
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        if succeeded {
            eprintln!("{} docling finished  {}", green("✔"), dim(&format!("{elapsed:.1}s")));
        } else {
            eprintln!("{} docling failed  {}", red("✘"), dim(&format!("{elapsed:.1}s")));
        }
    }

    fn on_file_written(&self, path: &Path) {
        eprintln!("  {} Wrote {}", green("✓"), path.display());
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a rulebook; writes out/core.md and out/core.json
  gg-pdf convert core.pdf -o out

  # Scanned book, first 50 pages only, headings from section numbers
  gg-pdf convert scan.pdf -o out --ocr --pages 1-50 --heading-strategy numbering

  # One file per chapter
  gg-pdf split-md out/core.md -o out/chapters

  # Plain row/column tables from the document JSON
  gg-pdf extract-tables out/core.json -o out

  # Look at the PDF outline before choosing a heading strategy
  gg-pdf bookmarks core.pdf

HEADING STRATEGIES:
  auto       compress gaps in heading levels (default)
  filtered   drop headings deeper than --max-heading-level, then compress
  numbering  level from leading section numbers ("2.1 Combat" -> level 2)
  none       leave headings as docling produced them

ENVIRONMENT VARIABLES:
  GG_PDF_OUTPUT_DIR        Default for -o/--output-dir
  GG_PDF_HEADING_STRATEGY  Default for --heading-strategy
  GG_PDF_PYTHON            Python interpreter with docling installed (default: python3)
  GG_PDF_TIMEOUT           Default for --timeout (seconds)
  PDFIUM_LIB_PATH          pdfium shared library used by `bookmarks`
  RUST_LOG                 Overrides -v/-q log filtering
"#;

/// Convert RPG rulebook PDFs to markdown and JSON.
#[derive(Parser, Debug)]
#[command(
    name = "gg-pdf",
    version,
    about = "Convert RPG rulebook PDFs to markdown and JSON",
    long_about = "Convert RPG rulebook PDFs to markdown and structured JSON with docling, \
normalize the heading hierarchy, split books into chapters and pull out their tables.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "GG_PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "GG_PDF_QUIET", conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert a PDF into <stem>.md and <stem>.json.
    Convert(ConvertArgs),
    /// Split a markdown file into one file per chapter.
    SplitMd(SplitArgs),
    /// Extract tables from a converted document's JSON.
    ExtractTables(ExtractArgs),
    /// Print the PDF's bookmark tree, flagging index-style entries.
    Bookmarks(BookmarksArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// PDF file to convert.
    input: PathBuf,

    /// Directory for the outputs (created if missing).
    #[arg(short, long = "output-dir", env = "GG_PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Run OCR on page images (slower; needed for scanned books).
    #[arg(long)]
    ocr: bool,

    /// Pages to convert: all, 5, or 10-50 (1-based, inclusive).
    #[arg(long, default_value = "all", value_parser = parse_pages)]
    pages: PageRange,

    /// Overwrite existing outputs.
    #[arg(long)]
    force: bool,

    /// How to re-level markdown headings after conversion.
    #[arg(long, env = "GG_PDF_HEADING_STRATEGY", default_value = "auto", value_parser = parse_strategy)]
    heading_strategy: HeadingStrategy,

    /// Deepest heading kept by the `filtered` strategy (1–6).
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=6))]
    max_heading_level: u8,

    /// Kill docling after this many seconds.
    #[arg(long, env = "GG_PDF_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Python interpreter that has docling installed.
    #[arg(long, env = "GG_PDF_PYTHON", default_value = "python3")]
    python: String,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Markdown file to split.
    input: PathBuf,

    /// Directory for the chapter files (created if missing).
    #[arg(short, long = "output-dir", env = "GG_PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Split on this heading level instead of the shallowest one present.
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=6))]
    level: Option<u8>,

    /// Overwrite existing chapter files.
    #[arg(long)]
    force: bool,

    /// Drop docling image placeholders (![..](image://..)) from the chapters.
    #[arg(long)]
    strip_images: bool,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Document JSON written by `convert`.
    input: PathBuf,

    /// Directory for <stem>.tables.json (created if missing).
    #[arg(short, long = "output-dir", env = "GG_PDF_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Overwrite an existing output.
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
struct BookmarksArgs {
    /// PDF file to inspect.
    input: PathBuf,

    /// Print the entries as JSON instead of a tree.
    #[arg(long)]
    json: bool,
}

fn parse_pages(s: &str) -> Result<PageRange, GgPdfError> {
    s.parse()
}

fn parse_strategy(s: &str) -> Result<HeadingStrategy, GgPdfError> {
    s.parse()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print `error[<Kind>]: <message>` for library errors, `error: ...` otherwise.
fn report(err: &anyhow::Error) {
    match err.chain().find_map(|e| e.downcast_ref::<GgPdfError>()) {
        Some(gg) => eprintln!("{}: {gg}", red(&format!("error[{}]", gg.kind()))),
        None => eprintln!("{}: {err:#}", red("error")),
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Convert(args) => run_convert(args, cli.quiet).await,
        Command::SplitMd(args) => run_split(args, cli.quiet).await,
        Command::ExtractTables(args) => run_extract(args, cli.quiet).await,
        Command::Bookmarks(args) => run_bookmarks(args, cli.quiet).await,
    }
}

async fn run_convert(args: &ConvertArgs, quiet: bool) -> Result<()> {
    let mut builder = ConvertRequest::builder(&args.input)
        .output_dir(&args.output_dir)
        .ocr(args.ocr)
        .pages(args.pages)
        .force(args.force)
        .heading_strategy(args.heading_strategy)
        .max_heading_level(args.max_heading_level);
    if let Some(secs) = args.timeout {
        builder = builder.timeout_secs(secs);
    }
    if !quiet && !args.no_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        builder = builder.progress_callback(cb);
    }
    let request = builder.build()?;

    let converter = DoclingConverter::with_python(&args.python);
    let output = convert(&request, &converter).await?;

    if quiet {
        return Ok(());
    }
    if output.is_partial() {
        eprintln!(
            "{} conversion partially succeeded. Some content may be missing.",
            yellow("Warning:")
        );
        for message in &output.messages {
            eprintln!("  {message}");
        }
    }
    println!("{}", output.done_line());
    if let Some(note) = output.ocr_advisory() {
        println!("{note}");
    }
    Ok(())
}

async fn run_split(args: &SplitArgs, quiet: bool) -> Result<()> {
    let mut request = SplitRequest::new(&args.input, &args.output_dir)
        .force(args.force)
        .strip_image_placeholders(args.strip_images);
    if let Some(level) = args.level {
        request = request.level(level);
    }

    let output = split_markdown_file(&request).await?;

    if quiet {
        return Ok(());
    }
    for warning in &output.warnings {
        eprintln!("{} {warning}", yellow("Warning:"));
    }
    println!("{}", bold(&output.done_line()));
    println!("{}", output.file_listing());
    Ok(())
}

async fn run_extract(args: &ExtractArgs, quiet: bool) -> Result<()> {
    let request = ExtractRequest::new(&args.input, &args.output_dir).force(args.force);
    let output = extract_tables(&request).await?;
    if !quiet {
        println!("{}", output.done_line());
    }
    Ok(())
}

async fn run_bookmarks(args: &BookmarksArgs, quiet: bool) -> Result<()> {
    let output = bookmarks(&BookmarksRequest::new(&args.input)).await?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let json =
            serde_json::to_string_pretty(&output.entries).context("Failed to serialise bookmarks")?;
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    } else {
        writeln!(handle, "{}", output.render()).context("Failed to write to stdout")?;
    }
    let redundant = output.redundant_count();
    if !quiet && redundant > 0 {
        eprintln!(
            "{} of {} entries look like index entries and would be dropped.",
            redundant,
            output.entries.len()
        );
    }
    Ok(())
}
