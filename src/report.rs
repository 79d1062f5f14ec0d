//! Run summaries
//!
//! A [`RunReport`] gathers what the operator needs after a merge: how many
//! songbooks were read or skipped, how many records ended up in the catalog,
//! and whether the catalog file actually changed. It makes no decisions; the
//! CLI decides how to render it.

use crate::types::{AggregateStats, PersistOutcome, PersistResult, SkippedSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of one merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Catalog file that was written
    pub target: PathBuf,
    /// Identifiers of the songbooks that were merged, in merge order
    pub sources: Vec<String>,
    /// Songbook files that could not be used
    pub skipped: Vec<SkippedSource>,
    /// Record counters from aggregation
    pub stats: AggregateStats,
    /// Written or unchanged, plus digests
    pub persist: PersistResult,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    /// Number of songbooks merged
    pub fn sources_seen(&self) -> usize {
        self.sources.len()
    }

    /// Number of records in the catalog
    pub fn records_total(&self) -> usize {
        self.stats.accepted
    }

    /// Whether the catalog content changed
    pub fn outcome(&self) -> PersistOutcome {
        self.persist.outcome
    }

    /// One-line description of the run
    pub fn summary(&self) -> String {
        let name = self
            .target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.target.display().to_string());

        let mut line = match self.outcome() {
            PersistOutcome::Written => format!(
                "Updated {} ({} songs from {} songbooks)",
                name,
                self.records_total(),
                self.sources_seen()
            ),
            PersistOutcome::Unchanged => format!(
                "No changes in {} ({} songs from {} songbooks)",
                name,
                self.records_total(),
                self.sources_seen()
            ),
        };
        if !self.skipped.is_empty() {
            line.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        line
    }
}
