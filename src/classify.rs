//! Keyword classification of songs into thematic buckets
//!
//! Reads any song list in the catalog format and assigns each record to the
//! first category whose keyword list has an entry contained in the record's
//! normalized title. Records that match nothing go to the default category.
//! The keyword table is an explicit [`ClassifierConfig`]; the built-in
//! default sorts songs by liturgical season.
//!
//! Keywords are normalized with the same folding as titles, so `"prépare"`
//! and `"prepare"` are the same keyword.

use crate::config::DEFAULT_TITLE_FIELD;
use crate::error::{CarnetError, Result};
use crate::loader::json_kind;
use crate::normalize::normalize_title;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, trace};

/// Field of a wrapper object that holds the song list
pub const SONG_LIST_FIELD: &str = "chants";

/// One bucket of the keyword table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Bucket name, used as the key in the output document
    pub name: String,
    /// Substrings that select this bucket
    pub keywords: Vec<String>,
    /// Terminal color name for the count summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Category {
    fn new(name: &str, color: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            color: Some(color.to_string()),
        }
    }
}

/// Keyword table and fallback for the classifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Categories in priority order
    pub categories: Vec<Category>,
    /// Bucket for titles that match no keyword
    pub default_category: String,
    /// Field holding the song title
    #[serde(default = "default_title_field")]
    pub title_field: String,
}

fn default_title_field() -> String {
    DEFAULT_TITLE_FIELD.to_string()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                Category::new(
                    "Avent",
                    "bright magenta",
                    &[
                        "avent", "messie", "attends", "viens", "emmanuel", "prépare",
                        "préparez", "attente", "venez", "veille", "veillez", "attentif",
                    ],
                ),
                Category::new(
                    "Noël",
                    "bright yellow",
                    &[
                        "noel", "nativité", "divin enfant", "bethlehem", "berger", "crèche",
                        "paix", "nuit", "gloire à dieu", "naissance", "roi des cieux",
                    ],
                ),
                Category::new(
                    "Carême",
                    "bright blue",
                    &[
                        "careme", "quarante", "penitence", "croix", "passion", "desert",
                        "peche", "repentir", "pardonne", "jeune", "souffle", "misericorde",
                    ],
                ),
                Category::new(
                    "Temps pascal",
                    "bright green",
                    &[
                        "paques", "pascal", "resurrection", "alleluia", "lumiere",
                        "vie nouvelle", "christ est ressuscite", "tombeau", "victime",
                        "regina caeli",
                    ],
                ),
                Category::new(
                    "Temps ordinaire",
                    "green",
                    &[
                        "amour", "louange", "eglise", "communion", "foi", "esperance",
                        "charite", "joie", "dieu", "seigneur", "adorons", "gloire", "chantons",
                    ],
                ),
                Category::new(
                    "Fêtes mariales",
                    "bright cyan",
                    &[
                        "marie", "vierge", "immaculee", "reine", "mère", "magnificat",
                        "notre dame", "assomption", "rosaire",
                    ],
                ),
                Category::new(
                    "Saints et martyrs",
                    "bright red",
                    &[
                        "saint", "sainte", "martyr", "martyrs", "confesseur", "apotre",
                        "docteur", "pape", "eveque",
                    ],
                ),
            ],
            default_category: "Temps ordinaire".to_string(),
            title_field: default_title_field(),
        }
    }
}

impl ClassifierConfig {
    /// Load a keyword table from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Color configured for a bucket, if any
    pub fn color_of(&self, name: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.name == name)
            .and_then(|c| c.color.as_deref())
    }
}

/// Records grouped by bucket, in table order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Non-empty buckets with their records
    pub buckets: Vec<(String, Vec<Value>)>,
    /// Entries that were not records and were left out
    pub ignored: usize,
}

impl Classification {
    /// Output document: bucket name to record list
    pub fn to_document(&self) -> Map<String, Value> {
        self.buckets
            .iter()
            .map(|(name, records)| (name.clone(), Value::Array(records.clone())))
            .collect()
    }

    /// Record count per bucket, in table order
    pub fn counts(&self) -> Vec<(&str, usize)> {
        self.buckets
            .iter()
            .map(|(name, records)| (name.as_str(), records.len()))
            .collect()
    }

    /// Total records classified
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|(_, records)| records.len()).sum()
    }
}

/// Keyword classifier with a prepared table
#[derive(Debug, Clone)]
pub struct Classifier {
    config: ClassifierConfig,
    // (bucket name, normalized keywords)
    table: Vec<(String, Vec<String>)>,
    default_index: usize,
}

impl Classifier {
    /// Prepare a classifier, normalizing every keyword
    ///
    /// The default category is appended after the table when the table does
    /// not already list it.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        if config.default_category.trim().is_empty() {
            return Err(CarnetError::config("default_category must not be empty"));
        }

        let mut table: Vec<(String, Vec<String>)> = config
            .categories
            .iter()
            .map(|category| {
                let keywords = category
                    .keywords
                    .iter()
                    .map(|k| normalize_title(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                (category.name.clone(), keywords)
            })
            .collect();

        let default_index = match table.iter().position(|(name, _)| *name == config.default_category) {
            Some(index) => index,
            None => {
                table.push((config.default_category.clone(), Vec::new()));
                table.len() - 1
            }
        };

        Ok(Self {
            config,
            table,
            default_index,
        })
    }

    /// Settings this classifier was built from
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Bucket name for a single title
    pub fn category_for(&self, title: &str) -> &str {
        &self.table[self.bucket_index(title)].0
    }

    fn bucket_index(&self, title: &str) -> usize {
        let key = normalize_title(title);
        self.table
            .iter()
            .position(|(_, keywords)| keywords.iter().any(|k| key.contains(k.as_str())))
            .unwrap_or(self.default_index)
    }

    /// Assign every record to a bucket
    pub fn classify(&self, entries: &[Value]) -> Classification {
        let mut buckets: Vec<Vec<Value>> = vec![Vec::new(); self.table.len()];
        let mut ignored = 0;

        for entry in entries {
            let Some(record) = entry.as_object() else {
                ignored += 1;
                continue;
            };
            let index = match record.get(&self.config.title_field) {
                Some(Value::String(title)) => self.bucket_index(title),
                Some(Value::Number(n)) => self.bucket_index(&n.to_string()),
                _ => self.default_index,
            };
            trace!("{:?} -> {}", record.get(&self.config.title_field), self.table[index].0);
            buckets[index].push(entry.clone());
        }

        let buckets: Vec<(String, Vec<Value>)> = self
            .table
            .iter()
            .zip(buckets)
            .filter(|(_, records)| !records.is_empty())
            .map(|((name, _), records)| (name.clone(), records))
            .collect();
        debug!("Classified into {} non-empty buckets", buckets.len());

        Classification { buckets, ignored }
    }
}

/// Read a song list: a top-level array, or an object with a `chants` array
pub fn load_song_list(path: &Path) -> Result<Vec<Value>> {
    let content = fs::read_to_string(path)?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);
    let document: Value = serde_json::from_str(content)
        .map_err(|e| CarnetError::malformed(path, format!("invalid JSON: {}", e)))?;

    match document {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove(SONG_LIST_FIELD) {
            Some(Value::Array(entries)) => Ok(entries),
            Some(other) => Err(CarnetError::malformed(
                path,
                format!("'{}' is {}, expected an array", SONG_LIST_FIELD, json_kind(&other)),
            )),
            None => Err(CarnetError::malformed(
                path,
                format!("object has no '{}' array", SONG_LIST_FIELD),
            )),
        },
        other => Err(CarnetError::malformed(
            path,
            format!("top-level value is {}, expected an array", json_kind(&other)),
        )),
    }
}
