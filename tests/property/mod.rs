//! Property-based testing for carnets
//!
//! Uses proptest to check normalization, dedup and ordering invariants over
//! randomly generated songbooks.

use ::carnets::*;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::fs;
use tempfile::TempDir;

/// Titles drawn from a small alphabet so that collisions are common
fn title_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-cA-C ]{1,6}".prop_map(|s| s),
        "[àâéèêÉÀ ]{1,4}[a-c]{0,3}".prop_map(|s| s),
        Just("Ave Maria".to_string()),
        Just("AVE  MARIA".to_string()),
        Just("Avé Maria".to_string()),
        Just("   ".to_string()),
    ]
}

/// One songbook: a list of records, some without titles
fn songbook_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        prop_oneof![
            4 => (title_strategy(), 0..1000u32)
                .prop_map(|(title, page)| json!({"titre": title, "page": page})),
            1 => Just(json!({"page": 0})),
            1 => Just(json!("not a record")),
        ],
        0..15,
    )
}

/// Several songbooks with distinct identifiers
fn sources_strategy() -> impl Strategy<Value = Vec<SourceCollection>> {
    prop::collection::vec(songbook_strategy(), 0..5).prop_map(|books| {
        books
            .into_iter()
            .enumerate()
            .map(|(i, entries)| SourceCollection::new(format!("book{}", i), entries))
            .collect()
    })
}

fn key(record: &SongRecord) -> String {
    normalize_title(record["titre"].as_str().unwrap())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Normalizing twice changes nothing
    #[test]
    fn normalization_idempotent(title in "[a-zA-Z0-9À-ÖØ-öø-ÿ \t]{0,20}") {
        let once = normalize_title(&title);
        prop_assert_eq!(normalize_title(&once), once);
    }

    /// Case and surrounding spaces never change the key
    #[test]
    fn normalization_ignores_case_and_padding(title in "[a-zA-Zéèà ]{0,20}") {
        let padded = format!("  {}  ", title.to_uppercase());
        prop_assert_eq!(normalize_title(&padded), normalize_title(&title));
    }

    /// Every key appears at most once in the output
    #[test]
    fn aggregate_keys_unique(sources in sources_strategy()) {
        let result = Aggregator::default().aggregate(&sources);
        let mut keys = HashSet::new();
        for record in &result.records {
            prop_assert!(keys.insert(key(record)));
        }
    }

    /// Adjacent records are in non-decreasing key order
    #[test]
    fn aggregate_sorted(sources in sources_strategy()) {
        let result = Aggregator::default().aggregate(&sources);
        for pair in result.records.windows(2) {
            prop_assert!(key(&pair[0]) <= key(&pair[1]));
        }
    }

    /// The kept record for each key is the earliest one in source order
    #[test]
    fn aggregate_first_occurrence_wins(sources in sources_strategy()) {
        let mut expected: HashMap<String, (String, Value)> = HashMap::new();
        for source in &sources {
            for entry in &source.entries {
                let Some(title) = entry.get("titre").and_then(Value::as_str) else { continue };
                if title.trim().is_empty() {
                    continue;
                }
                expected
                    .entry(normalize_title(title))
                    .or_insert_with(|| (source.id.clone(), entry["page"].clone()));
            }
        }

        let result = Aggregator::default().aggregate(&sources);
        prop_assert_eq!(result.records.len(), expected.len());
        for record in &result.records {
            let (source_id, page) = &expected[&key(record)];
            prop_assert_eq!(record["source_collection"].as_str().unwrap(), source_id.as_str());
            prop_assert_eq!(&record["page"], page);
        }
    }

    /// Counters account for every entry
    #[test]
    fn aggregate_stats_cover_all_entries(sources in sources_strategy()) {
        let total: usize = sources.iter().map(|s| s.entries.len()).sum();
        let result = Aggregator::default().aggregate(&sources);
        prop_assert_eq!(result.stats.examined(), total);
        prop_assert_eq!(result.stats.accepted, result.records.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    /// Running the pipeline twice gives identical bytes and an unchanged outcome
    #[test]
    fn pipeline_idempotent(sources in sources_strategy()) {
        let temp_dir = TempDir::new().unwrap();
        for source in &sources {
            fs::write(
                temp_dir.path().join(format!("{}.json", source.id)),
                serde_json::to_string(&source.entries).unwrap(),
            )
            .unwrap();
        }

        let pipeline = Pipeline::new(temp_dir.path()).unwrap();
        pipeline.run().unwrap();
        let first = fs::read(pipeline.target()).unwrap();

        let report = pipeline.run().unwrap();
        let second = fs::read(pipeline.target()).unwrap();

        prop_assert_eq!(report.outcome(), PersistOutcome::Unchanged);
        prop_assert_eq!(first, second);
    }
}
