//! Cocoslice: class-filtered COCO subsets as YOLO datasets.
//!
//! Cocoslice pulls the images of a COCO split that contain any of a set of
//! target classes, writes YOLO label files with a dense class numbering,
//! and reports label statistics across annotation sources.
//!
//! # Modules
//!
//! - [`ir`]: Typed records read from an annotation source, and box conversion
//! - [`store`]: Query interface over a loaded annotation source
//! - [`classes`]: Dense class numbering for the selected categories
//! - [`fetch`]: Image retrieval over HTTP or from a local directory
//! - [`extract`]: The extraction pipeline
//! - [`stats`]: Label counting and cross-source statistics
//! - [`manifest`]: `classes.txt` and `dataset.yaml`
//! - [`error`]: Error types for cocoslice operations

pub mod classes;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod ir;
pub mod manifest;
pub mod split;
pub mod stats;
pub mod store;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::CocosliceError;

use classes::DEFAULT_TARGET_CLASSES;
use extract::{ExtractOptions, OutputLayout};
use fetch::{FetchOptions, HttpFetcher, ImageFetcher, LocalDirFetcher};
use split::Split;
use stats::StatsOptions;
use store::DatasetStore;

const ANNOTATIONS_ARCHIVE_URL: &str =
    "http://images.cocodataset.org/annotations/annotations_trainval2017.zip";

/// The cocoslice CLI application.
#[derive(Parser)]
#[command(name = "cocoslice")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Only log warnings and errors; hide the progress bar.
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Extract the images and labels of the target classes from a COCO split.
    Extract(ExtractArgs),
    /// Report label statistics for one or more annotation sources.
    Stats(StatsArgs),
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the extract subcommand.
#[derive(clap::Args)]
struct ExtractArgs {
    /// Dataset split to extract.
    #[arg(long, value_enum, default_value_t = Split::Val2017)]
    split: Split,

    /// Output directory for the filtered dataset.
    #[arg(long, default_value = "./coco_filtered")]
    output: PathBuf,

    /// Classes to keep.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_TARGET_CLASSES.map(String::from))]
    classes: Vec<String>,

    /// COCO annotation file [default: <output>/annotations/instances_<split>.json].
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Copy images from this local directory instead of downloading them.
    #[arg(long)]
    image_source: Option<PathBuf>,

    /// Number of images processed concurrently.
    #[arg(long, env = "COCOSLICE_WORKERS", default_value_t = 1)]
    workers: usize,

    /// Extra download attempts for transient failures.
    #[arg(long, env = "COCOSLICE_RETRIES", default_value_t = 2)]
    retries: u32,

    /// Per-request download timeout in seconds.
    #[arg(long, env = "COCOSLICE_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    /// Output format for the summary.
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Arguments for the stats subcommand.
#[derive(clap::Args)]
struct StatsArgs {
    /// COCO annotation files or extracted dataset roots.
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Labels reported individually.
    #[arg(long, num_args = 1.., default_values_t = DEFAULT_TARGET_CLASSES.map(String::from))]
    classes: Vec<String>,

    /// Also write the report to this file.
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// Output format for the report.
    #[arg(long = "output-format", value_enum, default_value_t = OutputFormat::Text)]
    output_format: OutputFormat,
}

/// Run the cocoslice CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), CocosliceError> {
    let cli = Cli::parse();

    let level = if cli.quiet { "warn" } else { "info" };
    // A logger may already be installed when embedded; keep it.
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();

    match cli.command {
        Commands::Extract(args) => run_extract(args, cli.quiet),
        Commands::Stats(args) => run_stats(args),
    }
}

/// Execute the extract subcommand.
fn run_extract(args: ExtractArgs, quiet: bool) -> Result<(), CocosliceError> {
    let layout = OutputLayout::new(&args.output, args.split);
    let annotations = args
        .annotations
        .clone()
        .unwrap_or_else(|| layout.annotations_path());

    if !annotations.is_file() {
        if args.annotations.is_none() {
            if let Some(dir) = annotations.parent() {
                fs::create_dir_all(dir).map_err(|source| CocosliceError::OutputNotWritable {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }
        eprintln!("COCO {} annotations not found.", args.split);
        eprintln!("Please download annotations manually from: {ANNOTATIONS_ARCHIVE_URL}");
        eprintln!(
            "Extract and place {} at {}",
            args.split.instances_file_name(),
            annotations.display()
        );
        return Err(CocosliceError::AnnotationsNotFound { path: annotations });
    }

    let store = DatasetStore::open_coco(&annotations)?;

    let fetcher: Box<dyn ImageFetcher> = match &args.image_source {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(CocosliceError::InvalidOption(format!(
                    "image source {} is not a directory",
                    dir.display()
                )));
            }
            log::info!("Copying images from {}", dir.display());
            Box::new(LocalDirFetcher::new(dir))
        }
        None => Box::new(HttpFetcher::new(FetchOptions {
            retries: args.retries,
            timeout_secs: args.timeout_secs,
            ..FetchOptions::default()
        })),
    };

    let options = ExtractOptions {
        workers: args.workers,
        show_progress: !quiet && std::io::stderr().is_terminal(),
    };

    let report = extract::extract(&store, fetcher.as_ref(), &args.classes, &layout, &options)?;

    match args.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{report}"),
    }

    if report.failed_count > 0 {
        log::warn!(
            "{} image(s) could not be retrieved; rerun to retry them",
            report.failed_count
        );
    }

    Ok(())
}

/// Execute the stats subcommand.
fn run_stats(args: StatsArgs) -> Result<(), CocosliceError> {
    let opts = StatsOptions {
        targets: args.classes,
    };
    let report = stats::build_report(&args.sources, &opts)?;

    let rendered = match args.output_format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => report.to_string(),
    };
    println!("{rendered}");

    if let Some(path) = &args.report_file {
        fs::write(path, format!("{rendered}\n"))?;
        log::info!("Report saved to {}", path.display());
    }

    Ok(())
}
