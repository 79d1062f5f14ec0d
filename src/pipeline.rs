//! Merge pipeline
//!
//! [`Pipeline`] wires the stages together for one songbook directory:
//!
//! ```text
//! SourceLoader::discover -> Aggregator::aggregate -> Persister::persist -> RunReport
//! ```
//!
//! Each run recomputes the catalog from scratch. The run is single-threaded
//! and blocking; two pipelines pointed at the same directory at the same
//! time are not coordinated.
//!
//! ```rust,no_run
//! use carnets::PipelineBuilder;
//!
//! # fn main() -> carnets::Result<()> {
//! let pipeline = PipelineBuilder::new()
//!     .title_field("titre")
//!     .output_file_name("all.json")
//!     .build("./carnets")?;
//!
//! let report = pipeline.run()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

use crate::aggregate::Aggregator;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::loader::SourceLoader;
use crate::persist::Persister;
use crate::report::RunReport;
use crate::types::{Aggregation, Discovery};

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// One songbook directory and the settings to merge it
#[derive(Debug, Clone)]
pub struct Pipeline {
    dir: PathBuf,
    config: PipelineConfig,
    loader: SourceLoader,
    aggregator: Aggregator,
    persister: Persister,
}

impl Pipeline {
    /// Pipeline with default settings for `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        PipelineBuilder::new().build(dir)
    }

    /// Pipeline with explicit settings
    pub fn with_config(dir: impl Into<PathBuf>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let dir = dir.into();
        let target = dir.join(&config.output_file_name);

        Ok(Self {
            loader: SourceLoader::new(&dir, &config),
            aggregator: Aggregator::new(&config),
            persister: Persister::new(target).with_indent(config.indent),
            dir,
            config,
        })
    }

    /// Songbook directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the canonical catalog
    pub fn target(&self) -> &Path {
        self.persister.target()
    }

    /// Active settings
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load sources without aggregating
    pub fn discover(&self) -> Result<Discovery> {
        self.loader.discover()
    }

    /// Load sources and aggregate them, keeping both results
    pub fn load(&self) -> Result<(Discovery, Aggregation)> {
        let discovery = self.discover()?;
        let aggregation = self.aggregator.aggregate(&discovery.sources);
        Ok((discovery, aggregation))
    }

    /// Load and aggregate without writing anything
    pub fn preview(&self) -> Result<Aggregation> {
        self.load().map(|(_, aggregation)| aggregation)
    }

    /// Run the whole merge and persist the result
    ///
    /// # Errors
    ///
    /// - [`CarnetError::MissingInputDirectory`](crate::CarnetError::MissingInputDirectory)
    ///   if the songbook directory does not exist
    /// - [`CarnetError::Persist`](crate::CarnetError::Persist) if the catalog
    ///   could not be replaced; the previous catalog stays intact
    pub fn run(&self) -> Result<RunReport> {
        let start = Instant::now();
        info!("Merging songbooks in {:?}", self.dir);

        let (discovery, aggregation) = self.load()?;
        if discovery.sources.is_empty() {
            warn!("No source songbooks found in {:?}", self.dir);
        }
        debug!(
            "Aggregated {} records ({} duplicates, {} invalid)",
            aggregation.stats.accepted, aggregation.stats.duplicates, aggregation.stats.invalid
        );

        let persist = self.persister.persist(&aggregation.records)?;

        let report = RunReport {
            target: self.target().to_path_buf(),
            sources: discovery.sources.iter().map(|s| s.id.clone()).collect(),
            skipped: discovery.skipped,
            stats: aggregation.stats,
            persist,
            finished_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!("{}", report.summary());
        Ok(report)
    }
}

/// Builder pattern for pipeline configuration
///
/// # Default Values
///
/// - `output_file_name`: `all.json`
/// - `source_extension`: `json`
/// - `title_field`: `titre`
/// - `source_field`: `source_collection`
/// - `indent`: 2
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration
    pub fn from_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Set the aggregate output file name
    pub fn output_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.output_file_name = name.into();
        self
    }

    /// Set the source file extension (without the dot)
    pub fn source_extension(mut self, extension: impl Into<String>) -> Self {
        self.config.source_extension = extension.into();
        self
    }

    /// Set the title field name
    pub fn title_field(mut self, field: impl Into<String>) -> Self {
        self.config.title_field = field.into();
        self
    }

    /// Set the source attribution field name
    pub fn source_field(mut self, field: impl Into<String>) -> Self {
        self.config.source_field = field.into();
        self
    }

    /// Set the output indentation width
    pub fn indent(mut self, indent: usize) -> Self {
        self.config.indent = indent;
        self
    }

    /// Validate settings and bind them to a songbook directory
    pub fn build(self, dir: impl Into<PathBuf>) -> Result<Pipeline> {
        Pipeline::with_config(dir, self.config)
    }
}
