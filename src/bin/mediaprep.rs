//! CLI binary for mediaprep.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ProcessingConfig`, runs one upload, and prints the flat JSON report.

use anyhow::{Context, Result};
use clap::Parser;
use mediaprep::{ProcessingConfig, ProcessingOutcome, UploadPayload, UploadProcessor};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Prepare a PDF whose base64 payload sits in a file
  mediaprep --media-type pdf --input payload.b64 --filename report.pdf

  # Base64 given inline
  mediaprep --media-type image --input "$(base64 photo.png)" --filename photo.png

  # Audio in any container the decoder understands (wav, mp3, m4a, ogg, ...)
  mediaprep --media-type voice --input memo.b64 --filename memo.m4a -o ./uploads

  # Plain text: no decode, no transform, straight to the text trees
  mediaprep --media-type text --input "meeting notes" --filename notes.txt

  # MIME aliases work
  mediaprep --media-type image/png --input payload.b64 --filename scan.png

RESULT:
  One flat JSON report on stdout. `success` and `filename` are always
  present; the other fields appear per media family:
    pdf    text_content + backend/frontend text and pdf paths
    image  backend/frontend original and processed paths
    audio  backend/frontend original and processed paths
    text   text_content + backend/frontend text paths
  A failure report carries `error` instead and the exit status is 1.

ENVIRONMENT VARIABLES:
  MEDIAPREP_OUTPUT_DIR   Storage root (same as --output-dir)
  MEDIAPREP_VERBOSE      Enable debug logs (same as -v)
  MEDIAPREP_QUIET        Errors only (same as -q)
  RUST_LOG               Fine-grained tracing filter; overrides -v/-q
"#;

/// Prepare uploaded media for multimodal model input.
#[derive(Parser, Debug)]
#[command(
    name = "mediaprep",
    version,
    about = "Prepare PDF, image, and audio uploads for multimodal model input",
    long_about = "Decode a base64 upload, apply the per-family preparation pass (PDF text \
extraction, image enhancement, audio resampling to 16 kHz mono WAV), and persist the original \
and prepared artifacts into mirrored backend/frontend trees. Prints a flat JSON report to \
stdout.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Media type: pdf, image, audio, or text (MIME aliases accepted).
    #[arg(long)]
    media_type: String,

    /// Base64 payload, or the path to a file containing it. For
    /// --media-type text, the plain text itself.
    #[arg(long)]
    input: String,

    /// Original filename; its stem seeds the artifact names.
    #[arg(long)]
    filename: String,

    /// Storage root for the backend/frontend trees.
    #[arg(
        short = 'o',
        long,
        env = "MEDIAPREP_OUTPUT_DIR",
        default_value = "uploads"
    )]
    output_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MEDIAPREP_VERBOSE")]
    verbose: bool,

    /// Suppress logs and the summary line; the JSON report still prints.
    #[arg(short, long, env = "MEDIAPREP_QUIET")]
    quiet: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build the processor ──────────────────────────────────────────────
    let config = ProcessingConfig::builder()
        .upload_root(&cli.output_dir)
        .build()
        .context("Invalid configuration")?;
    let processor = UploadProcessor::new(&config).context("Failed to open the artifact store")?;

    // ── Run one upload ───────────────────────────────────────────────────
    // `text` is a CLI-level kind, not a MediaType: it skips decode and
    // transform entirely.
    let media_tag = cli.media_type.trim().to_ascii_lowercase();
    let outcome = if media_tag == "text" || media_tag == "text/plain" {
        let text = resolve_input(&cli.input, false)?;
        processor.store_text(&text, &cli.filename)
    } else {
        let content = resolve_input(&cli.input, true)?;
        match UploadPayload::from_tag(content, &media_tag, &cli.filename) {
            Ok(payload) => processor.process(&payload),
            // Unknown tags still produce a structured failure report.
            Err(error) => ProcessingOutcome::Failure {
                filename: cli.filename.clone(),
                error,
            },
        }
    };

    // ── Report ───────────────────────────────────────────────────────────
    let report = outcome.report();
    let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
    println!("{json}");

    if !cli.quiet {
        match &outcome {
            ProcessingOutcome::Success { .. } => eprintln!(
                "{} {}  →  {}",
                green("✔"),
                bold(&cli.filename),
                dim(&cli.output_dir.display().to_string()),
            ),
            ProcessingOutcome::Failure { error, .. } => eprintln!(
                "{} {}  {}",
                red("✘"),
                bold(&cli.filename),
                red(&error.to_string()),
            ),
        }
    }

    Ok(if outcome.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Treat `--input` as a file path when one exists, otherwise as the literal
/// value. File contents are trimmed for base64 payloads, which routinely end
/// with a newline when produced by `base64 > payload.b64`.
fn resolve_input(input: &str, trim: bool) -> Result<String> {
    let path = Path::new(input);
    if path.is_file() {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input from {}", path.display()))?;
        Ok(if trim {
            contents.trim().to_owned()
        } else {
            contents
        })
    } else {
        Ok(input.to_owned())
    }
}
