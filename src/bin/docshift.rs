//! Command line front end: converts one document into the requested formats.

use anyhow::{Context, Result};
use clap::Parser;
use docshift::{ConversionRequest, Converter, ConverterConfig, Format, ScratchSpace, SourceArtifact, TargetOutcome};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Convert documents between PDF, DOCX, PPTX and plain text.
#[derive(Parser, Debug)]
#[command(name = "docshift", version, arg_required_else_help = true)]
struct Cli {
    /// Document to convert (.pdf, .docx, .pptx or .txt).
    input: PathBuf,

    /// Comma separated target formats, e.g. `pdf,docx`.
    #[arg(long = "to", required = true, value_delimiter = ',', value_parser = parse_format)]
    targets: Vec<Format>,

    /// Directory for relocated images and produced documents.
    #[arg(long, env = "DOCSHIFT_SCRATCH_DIR", default_value = "uploads")]
    scratch_dir: PathBuf,

    /// Write into a fresh per-run sub-directory of the scratch directory.
    #[arg(long)]
    isolated: bool,

    /// Remove previous files from the scratch directory before converting.
    #[arg(long)]
    purge: bool,

    /// Display width of pictures placed into DOCX output, in inches.
    #[arg(long, env = "DOCSHIFT_IMAGE_WIDTH", default_value_t = 5.0)]
    image_width: f32,

    /// Parse slides in parallel when reading PPTX.
    #[arg(long)]
    parallel_slides: bool,

    /// Log debug output.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_format(value: &str) -> std::result::Result<Format, String> {
    value.parse::<Format>().map_err(|e| e.to_string())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let source = SourceArtifact::from_path(&cli.input).with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let scratch = if cli.isolated {
        ScratchSpace::isolated_persistent(&cli.scratch_dir)
    } else {
        ScratchSpace::shared(&cli.scratch_dir)
    }
    .with_context(|| format!("Failed to prepare scratch directory {}", cli.scratch_dir.display()))?;

    if cli.purge {
        scratch.purge().context("Failed to purge scratch directory")?;
    }

    let config = ConverterConfig::builder()
        .image_width_inches(cli.image_width)
        .parallel_slides(cli.parallel_slides)
        .build();
    let request = ConversionRequest::new(source, cli.targets);
    let report = Converter::new(config)
        .convert(&request, &scratch)
        .context("Conversion failed")?;

    for target in &report.targets {
        match &target.outcome {
            TargetOutcome::Converted(artifact) => {
                println!("{}: {}", target.target, scratch.artifact_path(&artifact.filename).display())
            }
            TargetOutcome::Skipped(reason) => println!("{}: skipped ({:?})", target.target, reason),
            TargetOutcome::Failed(error) => eprintln!("{}: failed: {}", target.target, error),
        }
    }

    Ok(if report.has_failures() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
