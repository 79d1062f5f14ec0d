//! Merging songbooks into one canonical collection
//!
//! ## Algorithm
//!
//! Sources are visited in the order the loader returned them, and records in
//! file order within each source:
//!
//! 1. Entries that are not JSON objects, or whose title is missing or blank,
//!    are dropped and counted as invalid.
//! 2. The title is normalized into a [`TitleKey`].
//! 3. The first record seen for a key is accepted: it is copied, given the
//!    source field if it does not already carry one, and remembered.
//! 4. Later records with the same key are duplicates and are dropped.
//!
//! The accepted records are then stable-sorted by key. Because keys are
//! unique after step 4, the order is total.
//!
//! The aggregator does no I/O.

use crate::config::PipelineConfig;
use crate::normalize::TitleKey;
use crate::types::{AggregateStats, Aggregation, SongRecord, SourceCollection};

use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Deduplicating merger for source collections
#[derive(Debug, Clone)]
pub struct Aggregator {
    title_field: String,
    source_field: String,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}

impl Aggregator {
    /// Create an aggregator using the configured field names
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            title_field: config.title_field.clone(),
            source_field: config.source_field.clone(),
        }
    }

    /// Merge `sources` into a sorted, duplicate-free collection
    pub fn aggregate(&self, sources: &[SourceCollection]) -> Aggregation {
        let mut stats = AggregateStats::default();
        // key -> index into `accepted`
        let mut seen: HashMap<TitleKey, usize> = HashMap::new();
        let mut accepted: Vec<(TitleKey, SongRecord)> = Vec::new();

        for source in sources {
            let before = stats;
            for entry in &source.entries {
                let Some((key, record)) = self.admit(entry) else {
                    stats.invalid += 1;
                    continue;
                };

                if let Some(&index) = seen.get(&key) {
                    trace!(
                        "Duplicate '{}' in '{}' (kept record #{})",
                        key,
                        source.id,
                        index
                    );
                    stats.duplicates += 1;
                    continue;
                }

                let mut record = record.clone();
                if !record.contains_key(&self.source_field) {
                    record.insert(self.source_field.clone(), Value::String(source.id.clone()));
                }
                seen.insert(key.clone(), accepted.len());
                accepted.push((key, record));
                stats.accepted += 1;
            }
            debug!(
                "Source '{}': {} accepted, {} duplicates, {} invalid",
                source.id,
                stats.accepted - before.accepted,
                stats.duplicates - before.duplicates,
                stats.invalid - before.invalid
            );
        }

        // Stable sort on unique keys
        accepted.sort_by(|a, b| a.0.cmp(&b.0));

        Aggregation {
            records: accepted.into_iter().map(|(_, record)| record).collect(),
            stats,
        }
    }

    /// Key of an entry's title, if the entry is a usable record
    pub fn key_of(&self, record: &SongRecord) -> Option<TitleKey> {
        record_title(record, &self.title_field).map(|title| TitleKey::new(&title))
    }

    fn admit<'a>(&self, entry: &'a Value) -> Option<(TitleKey, &'a SongRecord)> {
        let record = entry.as_object()?;
        let key = self.key_of(record)?;
        Some((key, record))
    }
}

/// Title of a record as text, or `None` when missing or blank
///
/// Numeric titles are accepted in their JSON text form.
pub fn record_title(record: &SongRecord, field: &str) -> Option<String> {
    let title = match record.get(field)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}
