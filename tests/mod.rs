//! Main test module for carnets
//!
//! This module includes all test suites:
//! - Integration tests for end-to-end merge scenarios
//! - Property-based tests for dedup and ordering invariants
//! - Edge cases around odd file names and contents

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::carnets::*;
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;

    fn read_catalog(pipeline: &Pipeline) -> Value {
        serde_json::from_str(&fs::read_to_string(pipeline.target()).unwrap()).unwrap()
    }

    #[test]
    fn test_unicode_file_names_become_source_ids() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("Fréjus-Toulon.json"),
            r#"[{"titre": "Chantez, priez, célébrez le Seigneur"}]"#,
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("carnet de Noël.json"),
            r#"[{"titre": "Les anges dans nos campagnes"}]"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(temp_dir.path()).unwrap();
        pipeline.run().unwrap();

        assert_eq!(
            read_catalog(&pipeline),
            json!([
                {"titre": "Chantez, priez, célébrez le Seigneur", "source_collection": "Fréjus-Toulon"},
                {"titre": "Les anges dans nos campagnes", "source_collection": "carnet de Noël"}
            ])
        );
    }

    #[test]
    fn test_non_ascii_written_literally() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.json"), r#"[{"titre": "Ô Marie, ô Mère chérie"}]"#).unwrap();

        let pipeline = Pipeline::new(temp_dir.path()).unwrap();
        pipeline.run().unwrap();

        let text = fs::read_to_string(pipeline.target()).unwrap();
        assert!(text.contains("Ô Marie, ô Mère chérie"));
        assert!(!text.contains("\\u"));
    }

    #[test]
    fn test_previous_catalog_is_not_reingested() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.json"), r#"[{"titre": "Kyrie"}]"#).unwrap();
        fs::write(
            temp_dir.path().join("all.json"),
            r#"[{"titre": "Stale song", "source_collection": "gone"}]"#,
        )
        .unwrap();

        let pipeline = Pipeline::new(temp_dir.path()).unwrap();
        let report = pipeline.run().unwrap();
        assert_eq!(report.outcome(), PersistOutcome::Written);
        assert_eq!(read_catalog(&pipeline), json!([{"titre": "Kyrie", "source_collection": "a"}]));
    }

    #[test]
    fn test_only_invalid_records() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.json"), r#"[{}, {"titre": ""}, null, [1, 2]]"#).unwrap();

        let pipeline = Pipeline::new(temp_dir.path()).unwrap();
        let report = pipeline.run().unwrap();
        assert_eq!(report.records_total(), 0);
        assert_eq!(report.stats.invalid, 4);
        assert_eq!(fs::read_to_string(pipeline.target()).unwrap(), "[]");
    }

    #[test]
    fn test_empty_previous_file_counts_as_absent() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("all.json"), "").unwrap();

        let report = Pipeline::new(temp_dir.path()).unwrap().run().unwrap();
        assert_eq!(report.persist.digest_before, None);
        assert_eq!(report.outcome(), PersistOutcome::Written);
    }

    #[test]
    fn test_missing_directory_aborts_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("carnets");

        let err = Pipeline::new(&dir).unwrap().run().unwrap_err();
        assert!(err.is_missing_input());
        assert!(!dir.exists());
    }
}
