//! Core data types used throughout the carnets library
//!
//! ## Overview
//!
//! - **Records**: [`SongRecord`] is an open JSON object; only the title field
//!   and the source field mean anything to the pipeline.
//! - **Inputs**: [`SourceCollection`], [`SkippedSource`], [`Discovery`] describe
//!   what the loader found in the songbook directory.
//! - **Outputs**: [`Aggregation`], [`AggregateStats`], [`PersistOutcome`] are
//!   the results of the aggregate and persist stages.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// One song entry: field name to arbitrary JSON value
///
/// Field order is preserved as read, so records serialize back in the same
/// order they were constructed.
pub type SongRecord = Map<String, Value>;

/// Records parsed from one songbook file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceCollection {
    /// File name without extension; used for the source field
    pub id: String,
    /// File the collection was read from
    pub path: PathBuf,
    /// Top-level array items, in file order; items may not be records
    pub entries: Vec<Value>,
}

impl SourceCollection {
    /// Build a collection that did not come from disk
    pub fn new(id: impl Into<String>, entries: Vec<Value>) -> Self {
        let id = id.into();
        Self {
            path: PathBuf::from(&id),
            id,
            entries,
        }
    }
}

/// A source file the loader rejected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSource {
    /// Path of the rejected file
    pub path: PathBuf,
    /// Diagnostic shown to the operator
    pub reason: String,
}

/// Everything the loader found, in discovery order
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Valid collections sorted by identifier
    pub sources: Vec<SourceCollection>,
    /// Files that were skipped, sorted by path
    pub skipped: Vec<SkippedSource>,
}

/// Counters collected while aggregating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    /// Records accepted into the canonical collection
    pub accepted: usize,
    /// Records dropped because an earlier record had the same key
    pub duplicates: usize,
    /// Entries dropped because they were not records or had no title
    pub invalid: usize,
}

impl AggregateStats {
    /// Total number of entries examined
    pub fn examined(&self) -> usize {
        self.accepted + self.duplicates + self.invalid
    }
}

/// Canonical collection plus the counters that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Deduplicated records sorted by normalized title
    pub records: Vec<SongRecord>,
    /// Counters for the report
    pub stats: AggregateStats,
}

/// Whether persisting changed the catalog on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistOutcome {
    /// Content digest changed
    Written,
    /// Same bytes as before the run
    Unchanged,
}

impl PersistOutcome {
    /// Whether the catalog content changed
    pub fn is_written(&self) -> bool {
        matches!(self, PersistOutcome::Written)
    }
}

impl fmt::Display for PersistOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistOutcome::Written => f.write_str("written"),
            PersistOutcome::Unchanged => f.write_str("unchanged"),
        }
    }
}

/// Result of a persist call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResult {
    /// Written or unchanged
    pub outcome: PersistOutcome,
    /// Digest of the target before the run; `None` if absent or empty
    pub digest_before: Option<String>,
    /// Digest of the target after the replace
    pub digest_after: Option<String>,
    /// Size of the serialized catalog
    pub bytes_written: u64,
}
