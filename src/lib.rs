//! # Carnets - one catalog from many songbooks
//!
//! Merges a directory of songbook files into a single canonical catalog,
//! deduplicated by title and sorted deterministically, and rewrites the
//! catalog only through an atomic temp-file-then-rename.
//!
//! ## Overview
//!
//! A songbook directory holds JSON files, each an array of song records:
//!
//! ```text
//! carnets/
//!   frejus.json      [{"titre": "Ave Maria", ...}, ...]
//!   paroisse.json    [{"titre": "AVE MARIA", ...}, ...]
//!   all.json         <- the canonical catalog, rebuilt on every run
//! ```
//!
//! Each run:
//! - loads every source file except the catalog itself, sorted by name
//! - keeps the first record for each normalized title (accents, case and
//!   spacing folded), tagging it with the songbook it came from
//! - sorts the result by normalized title
//! - writes it atomically and reports whether the content changed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use carnets::{Pipeline, PersistOutcome};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let report = Pipeline::new("./carnets")?.run()?;
//! match report.outcome() {
//!     PersistOutcome::Written => println!("{}", report.summary()),
//!     PersistOutcome::Unchanged => println!("catalog already up to date"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Classification
//!
//! The [`classify`] module sorts any song list into keyword buckets (by
//! default, liturgical seasons). It only reads the catalog format and does
//! not depend on the merge pipeline.
//!
//! ## Error Handling
//!
//! All operations return `Result<T, CarnetError>`. A missing songbook
//! directory aborts the run; unreadable or non-array source files are
//! skipped and listed in the report; records without a title are silently
//! dropped and counted.
//!
//! ## Module Organization
//!
//! - [`normalize`]: title comparison keys
//! - [`loader`]: songbook discovery and parsing
//! - [`aggregate`]: deduplication and ordering
//! - [`persist`]: atomic, content-aware writes
//! - [`report`]: run summaries
//! - [`pipeline`]: the stages wired together
//! - [`classify`]: keyword classification
//! - [`config`], [`types`], [`error`]: shared settings, data types and errors
//! - [`utils`]: hashing and formatting helpers

// Public API modules
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod persist;
pub mod pipeline;
pub mod report;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use aggregate::Aggregator;
pub use classify::{Classification, Classifier, ClassifierConfig};
pub use config::PipelineConfig;
pub use error::{CarnetError, Result};
pub use loader::SourceLoader;
pub use normalize::{normalize_title, TitleKey};
pub use persist::{Persister, StagedWrite};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use report::RunReport;
pub use types::*;
