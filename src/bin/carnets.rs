//! # Carnets CLI - merge and classify songbooks
//!
//! ## Usage
//! ```bash
//! # Merge every songbook in ./carnets into ./carnets/all.json
//! carnets merge
//!
//! # Merge another directory, reading English-style records
//! carnets merge hymnals --title-field title --output catalog.json
//!
//! # Sort the catalog into liturgical seasons, writing ./chants_par_temps.json
//! carnets classify carnets/all.json
//! ```
//!
//! Exit status is 0 on success, 2 when the songbook directory is missing,
//! and 1 for any other failure.

use anyhow::Context;
use carnets::utils::format_bytes;
use carnets::{
    CarnetError, Classifier, ClassifierConfig, Persister, PipelineBuilder, PipelineConfig,
    PersistOutcome, RunReport,
};
use clap::{Parser, Subcommand};
use colored::*;
use humantime::format_duration;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status when the songbook directory does not exist
const EXIT_MISSING_INPUT: i32 = 2;
/// Exit status for every other failure
const EXIT_FAILURE: i32 = 1;

/// Default classifier output, written to the working directory and never
/// beside the input
const DEFAULT_CLASSIFY_OUTPUT: &str = "chants_par_temps.json";

/// Carnets CLI - one canonical catalog from many songbooks
#[derive(Parser)]
#[command(name = "carnets")]
#[command(version)]
#[command(about = "Merge songbook files into one deduplicated catalog")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all songbooks of a directory into the catalog
    Merge {
        /// Songbook directory
        #[arg(default_value = "carnets")]
        dir: PathBuf,

        /// Catalog file name inside the directory
        #[arg(short, long)]
        output: Option<String>,

        /// Field holding the song title
        #[arg(long)]
        title_field: Option<String>,

        /// Field recording the source songbook
        #[arg(long)]
        source_field: Option<String>,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        /// Aggregate and report without writing the catalog
        #[arg(long)]
        dry_run: bool,
    },

    /// Sort a song list into keyword categories
    Classify {
        /// Catalog or song list to classify
        input: PathBuf,

        /// Output file (defaults to chants_par_temps.json in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON keyword table replacing the built-in one
        #[arg(short, long)]
        keywords: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        let missing_input = e
            .downcast_ref::<CarnetError>()
            .map(CarnetError::is_missing_input)
            .unwrap_or(false);
        let message = e
            .downcast_ref::<CarnetError>()
            .map(CarnetError::user_message)
            .unwrap_or_else(|| format!("{:#}", e));

        eprintln!("{}: {}", "Error".red().bold(), message);
        std::process::exit(if missing_input { EXIT_MISSING_INPUT } else { EXIT_FAILURE });
    }
}

/// Main command runner
fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Merge { dir, output, title_field, source_field, config, json, dry_run } => {
            let mut settings = match config {
                Some(path) => PipelineConfig::from_file(&path)
                    .with_context(|| format!("loading configuration {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(output) = output {
                settings.output_file_name = output;
            }
            if let Some(field) = title_field {
                settings.title_field = field;
            }
            if let Some(field) = source_field {
                settings.source_field = field;
            }
            cmd_merge(dir, settings, json, dry_run)
        }
        Commands::Classify { input, output, keywords } => cmd_classify(input, output, keywords),
    }
}

/// Merge a songbook directory
///
/// Sources are read in name order; the first song seen for each title wins.
/// The catalog is always rewritten atomically, and the report says whether
/// its content changed.
fn cmd_merge(dir: PathBuf, config: PipelineConfig, json: bool, dry_run: bool) -> anyhow::Result<()> {
    let pipeline = PipelineBuilder::from_config(config).build(dir)?;

    if dry_run {
        let (discovery, aggregation) = pipeline.load()?;
        println!("{}", "Dry run, nothing written".blue().bold());
        println!("  Songbooks: {}", discovery.sources.len().to_string().cyan());
        println!("  Songs: {}", aggregation.stats.accepted.to_string().cyan());
        println!("  Duplicates: {}", aggregation.stats.duplicates.to_string().yellow());
        print_skipped(&discovery.skipped);
        return Ok(());
    }

    let report = pipeline.run()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Render a run report for the operator
fn print_report(report: &RunReport) {
    let name = report
        .target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match report.outcome() {
        PersistOutcome::Written => println!(
            "{} Updated {} ({} songs)",
            "✓".green().bold(),
            name.yellow().bold(),
            report.records_total().to_string().cyan()
        ),
        PersistOutcome::Unchanged => println!(
            "{} No changes in {}",
            "=".dimmed(),
            name.yellow()
        ),
    }

    println!("  Songbooks: {}", report.sources_seen().to_string().cyan());
    println!("  Songs: {}", report.records_total().to_string().cyan());
    if report.stats.duplicates > 0 {
        println!("  Duplicates dropped: {}", report.stats.duplicates.to_string().yellow());
    }
    if report.stats.invalid > 0 {
        println!("  Invalid entries dropped: {}", report.stats.invalid.to_string().yellow());
    }
    println!("  Size: {}", format_bytes(report.persist.bytes_written).cyan());
    println!(
        "  Time: {}",
        format_duration(Duration::from_millis(report.duration_ms)).to_string().cyan()
    );
    print_skipped(&report.skipped);
}

fn print_skipped(skipped: &[carnets::SkippedSource]) {
    if skipped.is_empty() {
        return;
    }
    println!("\n{}", "Skipped songbooks:".yellow().bold());
    for source in skipped {
        println!("  - {}: {}", source.path.display(), source.reason.yellow());
    }
}

/// Classify a song list into keyword categories
fn cmd_classify(
    input: PathBuf,
    output: Option<PathBuf>,
    keywords: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = match keywords {
        Some(path) => ClassifierConfig::from_file(&path)
            .with_context(|| format!("loading keyword table {}", path.display()))?,
        None => ClassifierConfig::default(),
    };
    let classifier = Classifier::new(config)?;

    let songs = carnets::classify::load_song_list(&input)?;
    let classification = classifier.classify(&songs);

    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_CLASSIFY_OUTPUT));
    Persister::new(&output).persist(&classification.to_document())?;

    println!(
        "{} Classified {} songs into {}",
        "✓".green().bold(),
        classification.total().to_string().cyan(),
        output.display().to_string().yellow()
    );
    for (name, count) in classification.counts() {
        let label = match classifier.config().color_of(name) {
            Some(color) => name.color(Color::from(color)).bold(),
            None => name.bold(),
        };
        println!("  {}: {}", label, count);
    }
    if classification.ignored > 0 {
        println!("  {} {}", "Ignored non-record entries:".dimmed(), classification.ignored);
    }
    Ok(())
}
