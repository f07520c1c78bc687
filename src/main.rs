use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};

use pinkdot_remover_rs::dot_locations::{CenterAlignment, DefectDatabase, ParserOptions};
use pinkdot_remover_rs::image_pipeline::{
    collect_input_files, BatchRunner, CancellationFlag, CorrectionMode, FileOutcome, PinkDotPipeline,
    RemovalConfig, TiffCompression,
};
use pinkdot_remover_rs::logger;

use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompressionArg {
    None,
    Lzw,
    DeflateFast,
    DeflateBest,
    DeflateBalanced,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::DeflateFast => TiffCompression::DeflateFast,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
            CompressionArg::DeflateBalanced => TiffCompression::DeflateBalanced,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlignmentArg {
    /// Centers snap to multiples of 2
    Pair,
    /// Centers snap to multiples of 4
    Quad,
}

impl From<AlignmentArg> for CenterAlignment {
    fn from(arg: AlignmentArg) -> Self {
        match arg {
            AlignmentArg::Pair => CenterAlignment::Pair,
            AlignmentArg::Quad => CenterAlignment::Quad,
        }
    }
}

/// Removes focus pixel dots from RAW video frames
#[derive(Debug, Parser)]
#[command(name = "pinkdot_remover", version, about)]
struct Cli {
    /// RAW files or directories containing them (.dng, .raw)
    #[arg(required_unless_present = "list_cameras")]
    inputs: Vec<PathBuf>,

    /// Directory holding the dot definition files
    #[arg(long, default_value = "dotData")]
    dot_data: PathBuf,

    /// Use this camera model instead of the one stored in the files
    #[arg(short, long)]
    camera: Option<String>,

    /// Set the dots to zero instead of interpolating them.
    /// The TIFF output carries no CFA or DNG metadata, so a RAW processor
    /// cannot repair these zeros later.
    #[arg(long)]
    mark_bad: bool,

    /// Compression of the written TIFF files
    #[arg(long, value_enum, default_value = "none")]
    compression: CompressionArg,

    /// Write results here instead of next to the inputs
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Worker threads, 0 uses all cores
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Grid that frame centers are aligned to
    #[arg(long, value_enum, default_value = "quad")]
    center_alignment: AlignmentArg,

    /// Print the loaded dot sets and exit
    #[arg(long)]
    list_cameras: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    info!("Starting pinkdot_remover...");
    debug!("CLI arguments: {:?}", cli);

    let options = ParserOptions {
        center_alignment: cli.center_alignment.into(),
    };
    let (database, load_report) = DefectDatabase::open(&cli.dot_data, options)
        .with_context(|| format!("Failed to load dot data from {}", cli.dot_data.display()))?;

    if load_report.has_issues() {
        warn!("{} problems found in the dot data:", load_report.issues.len());
        for issue in &load_report.issues {
            warn!("  {}", issue);
        }
    }
    if database.is_empty() {
        bail!("No dot sets found in {}", cli.dot_data.display());
    }

    if cli.list_cameras {
        println!("{}", database.summary());
        return Ok(());
    }
    debug!("{}", database.summary());

    let camera_override = match &cli.camera {
        Some(name) => match database.match_camera_model(name) {
            Some(model) => Some(model.to_string()),
            None => bail!(
                "Unknown camera '{}', known models: {}",
                name,
                database.camera_models().join(", ")
            ),
        },
        None => None,
    };

    let files = collect_input_files(&cli.inputs);
    if files.is_empty() {
        bail!("No .dng or .raw files found in the given inputs");
    }

    let config = RemovalConfig::builder()
        .mode(if cli.mark_bad {
            CorrectionMode::MarkBad
        } else {
            CorrectionMode::Interpolate
        })
        .camera_override(camera_override)
        .compression(cli.compression.into())
        .output_dir(cli.output_dir.clone())
        .build();

    let pipeline = PinkDotPipeline::new(Arc::new(database), config);

    info!("Mode: {:?}", pipeline.config().mode);
    info!("Compression: {:?}", pipeline.config().compression);

    let report = BatchRunner::new(&pipeline)
        .jobs(cli.jobs)
        .run(&files, &CancellationFlag::new())?;

    for result in &report.results {
        match &result.outcome {
            FileOutcome::Converted(frame) => debug!(
                "{}: {} dots corrected",
                result.input.display(),
                frame.stats.corrected
            ),
            FileOutcome::Failed(e) => error!("{}: {}", result.input.display(), e),
            FileOutcome::Skipped => warn!("{}: skipped", result.input.display()),
        }
    }

    info!(
        "Done: {} converted, {} failed, {} skipped",
        report.succeeded(),
        report.failed(),
        report.skipped()
    );

    if !report.is_success() {
        std::process::exit(1);
    }

    Ok(())
}
