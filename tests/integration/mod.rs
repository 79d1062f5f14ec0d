//! End-to-end merge scenarios
//!
//! Each test builds a songbook directory, runs the pipeline, and checks the
//! catalog on disk.

use ::carnets::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Songbook directory with helpers for writing sources
pub struct SongbookFixture {
    pub dir: TempDir,
}

impl SongbookFixture {
    /// Create an empty songbook directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// Write one source file named `<id>.json`
    pub fn songbook(&self, id: &str, songs: Value) -> &Self {
        fs::write(
            self.path().join(format!("{}.json", id)),
            serde_json::to_string_pretty(&songs).unwrap(),
        )
        .unwrap();
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn pipeline(&self) -> Pipeline {
        Pipeline::new(self.path()).unwrap()
    }

    pub fn catalog(&self) -> Value {
        let text = fs::read_to_string(self.path().join("all.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

#[cfg(test)]
mod scenarios {
    use super::*;

    #[test]
    fn test_cross_source_duplicate_keeps_earliest_source() {
        let fixture = SongbookFixture::new();
        fixture
            .songbook("A", json!([{"titre": "Amazing Grace"}, {"titre": "Ave Maria"}]))
            .songbook("B", json!([{"titre": "AMAZING GRACE"}, {"titre": "Gloria"}]));

        let report = fixture.pipeline().run().unwrap();
        assert_eq!(report.sources, vec!["A".to_string(), "B".to_string()]);

        assert_eq!(
            fixture.catalog(),
            json!([
                {"titre": "Amazing Grace", "source_collection": "A"},
                {"titre": "Ave Maria", "source_collection": "A"},
                {"titre": "Gloria", "source_collection": "B"}
            ])
        );
    }

    #[test]
    fn test_empty_directory_writes_empty_catalog() {
        let fixture = SongbookFixture::new();

        let report = fixture.pipeline().run().unwrap();
        assert_eq!(report.sources_seen(), 0);
        assert_eq!(report.outcome(), PersistOutcome::Written);
        assert_eq!(fixture.catalog(), json!([]));

        let again = fixture.pipeline().run().unwrap();
        assert_eq!(again.outcome(), PersistOutcome::Unchanged);
    }

    #[test]
    fn test_non_array_source_is_skipped() {
        let fixture = SongbookFixture::new();
        fixture
            .songbook("diocese", json!({"chants": [{"titre": "Hidden"}]}))
            .songbook("paroisse", json!([{"titre": "Gloria"}]));

        let report = fixture.pipeline().run().unwrap();
        assert_eq!(report.sources, vec!["paroisse".to_string()]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("diocese.json"));
        assert_eq!(fixture.catalog(), json!([{"titre": "Gloria", "source_collection": "paroisse"}]));
    }

    #[test]
    fn test_idempotent_bytes() {
        let fixture = SongbookFixture::new();
        fixture
            .songbook("b", json!([{"titre": "Pange lingua", "ton": 3}]))
            .songbook("a", json!([{"titre": "Veni Creator", "auteur": "Raban Maur"}]));

        let first = fixture.pipeline().run().unwrap();
        let bytes_first = fs::read(fixture.path().join("all.json")).unwrap();
        let second = fixture.pipeline().run().unwrap();
        let bytes_second = fs::read(fixture.path().join("all.json")).unwrap();

        assert_eq!(first.outcome(), PersistOutcome::Written);
        assert_eq!(second.outcome(), PersistOutcome::Unchanged);
        assert_eq!(bytes_first, bytes_second);
        assert_eq!(first.persist.digest_after, second.persist.digest_after);
    }

    #[test]
    fn test_source_order_follows_names_not_creation() {
        // Same contents written in opposite creation orders
        let first = SongbookFixture::new();
        first
            .songbook("zz", json!([{"titre": "Salve Regina", "version": "zz"}]))
            .songbook("aa", json!([{"titre": "SALVE REGINA", "version": "aa"}]));
        let second = SongbookFixture::new();
        second
            .songbook("aa", json!([{"titre": "SALVE REGINA", "version": "aa"}]))
            .songbook("zz", json!([{"titre": "Salve Regina", "version": "zz"}]));

        first.pipeline().run().unwrap();
        second.pipeline().run().unwrap();

        assert_eq!(first.catalog(), second.catalog());
        assert_eq!(first.catalog()[0]["version"], "aa");
    }

    #[test]
    fn test_hyphenated_songbook_takes_priority() {
        let fixture = SongbookFixture::new();
        fixture
            .songbook("noel", json!([{"titre": "Douce nuit", "version": "noel"}]))
            .songbook("noel-2", json!([{"titre": "DOUCE NUIT", "version": "noel-2"}]));

        let report = fixture.pipeline().run().unwrap();
        assert_eq!(report.sources, vec!["noel-2".to_string(), "noel".to_string()]);
        assert_eq!(
            fixture.catalog(),
            json!([{"titre": "DOUCE NUIT", "version": "noel-2", "source_collection": "noel-2"}])
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_does_not_abort_run() {
        let fixture = SongbookFixture::new();
        fixture.songbook("a", json!([{"titre": "Agnus Dei"}]));
        std::os::unix::fs::symlink(
            fixture.path().join("deleted.json"),
            fixture.path().join("ancien.json"),
        )
        .unwrap();

        let report = fixture.pipeline().run().unwrap();
        assert_eq!(report.outcome(), PersistOutcome::Written);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("ancien.json"));
        assert_eq!(fixture.catalog(), json!([{"titre": "Agnus Dei", "source_collection": "a"}]));
    }

    #[test]
    fn test_failed_replace_keeps_previous_catalog() {
        let fixture = SongbookFixture::new();
        fixture.songbook("a", json!([{"titre": "Kyrie"}]));
        fixture.pipeline().run().unwrap();
        let before = fs::read(fixture.path().join("all.json")).unwrap();

        fixture.songbook("b", json!([{"titre": "Sanctus"}]));
        let aggregation = fixture.pipeline().preview().unwrap();
        let persister = Persister::new(fixture.path().join("all.json"));
        let staged = persister
            .stage(&persister.serialize(&aggregation.records).unwrap())
            .unwrap();
        drop(staged);

        assert_eq!(fs::read(fixture.path().join("all.json")).unwrap(), before);
        let leftovers = fs::read_dir(fixture.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .ends_with(".tmp")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn test_classify_catalog() {
        let fixture = SongbookFixture::new();
        fixture.songbook(
            "a",
            json!([
                {"titre": "Venez divin Messie"},
                {"titre": "Minuit, chrétiens"},
                {"titre": "Ubi caritas"}
            ]),
        );
        fixture.pipeline().run().unwrap();

        let songs = classify::load_song_list(&fixture.path().join("all.json")).unwrap();
        let classifier = Classifier::new(ClassifierConfig::default()).unwrap();
        let classification = classifier.classify(&songs);
        assert_eq!(
            classification.counts(),
            vec![("Avent", 1), ("Noël", 1), ("Temps ordinaire", 1)]
        );

        let output = fixture.path().join("chants_par_temps.json");
        Persister::new(&output).persist(&classification.to_document()).unwrap();
        let document: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(document["Avent"][0]["source_collection"], "a");
    }
}
