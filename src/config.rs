//! Pipeline configuration
//!
//! [`PipelineConfig`] is a plain serde struct so it can be loaded from a JSON
//! file and overridden by CLI flags. Every field has a default matching the
//! songbook layout: a `carnets/` directory of `*.json` files merged into
//! `all.json`.

use crate::error::{CarnetError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Default name of the aggregate output file
pub const DEFAULT_OUTPUT_FILE: &str = "all.json";
/// Default source file extension
pub const DEFAULT_EXTENSION: &str = "json";
/// Default title field name
pub const DEFAULT_TITLE_FIELD: &str = "titre";
/// Default source attribution field name
pub const DEFAULT_SOURCE_FIELD: &str = "source_collection";

/// Settings for a merge run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// File name of the aggregate inside the songbook directory
    pub output_file_name: String,
    /// Extension (without dot) of source files
    pub source_extension: String,
    /// Field holding the song title
    pub title_field: String,
    /// Field recording which songbook a record came from
    pub source_field: String,
    /// Spaces of indentation in the serialized catalog
    pub indent: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_file_name: DEFAULT_OUTPUT_FILE.to_string(),
            source_extension: DEFAULT_EXTENSION.to_string(),
            title_field: DEFAULT_TITLE_FIELD.to_string(),
            source_field: DEFAULT_SOURCE_FIELD.to_string(),
            indent: 2,
        }
    }
}

impl PipelineConfig {
    /// Load a configuration file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the settings can describe a run
    pub fn validate(&self) -> Result<()> {
        if self.title_field.trim().is_empty() {
            return Err(CarnetError::config("title_field must not be empty"));
        }
        if self.source_field.trim().is_empty() {
            return Err(CarnetError::config("source_field must not be empty"));
        }
        if self.source_extension.is_empty() || self.source_extension.starts_with('.') {
            return Err(CarnetError::config(format!(
                "source_extension must be a bare extension, got {:?}",
                self.source_extension
            )));
        }
        let output = Path::new(&self.output_file_name);
        if output.components().count() != 1 {
            return Err(CarnetError::config(format!(
                "output_file_name must be a plain file name, got {:?}",
                self.output_file_name
            )));
        }
        let matches_extension = output
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(self.source_extension.as_str()))
            .unwrap_or(false);
        if !matches_extension {
            return Err(CarnetError::config(format!(
                "output_file_name {:?} must use the .{} extension",
                self.output_file_name, self.source_extension
            )));
        }
        Ok(())
    }
}
