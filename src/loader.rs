//! Songbook discovery and parsing
//!
//! The loader lists the songbook directory (non-recursively), keeps regular
//! files with the source extension, excludes the aggregate output file, and
//! parses each one as a JSON document. Documents whose top-level value is not
//! an array, or that cannot be read or parsed, are skipped with a
//! diagnostic; the run continues with the rest.
//!
//! Sources come back sorted by full file name (bytewise) so that the
//! aggregator's first-occurrence rule gives the same answer on every run,
//! whatever order the filesystem lists entries in.

use crate::config::PipelineConfig;
use crate::error::{CarnetError, Result};
use crate::types::{Discovery, SkippedSource, SourceCollection};
use crate::utils;

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

/// Finds and parses source collections in a songbook directory
#[derive(Debug, Clone)]
pub struct SourceLoader {
    dir: PathBuf,
    output_file_name: String,
    extension: String,
}

impl SourceLoader {
    /// Create a loader for `dir` using the given settings
    pub fn new(dir: impl Into<PathBuf>, config: &PipelineConfig) -> Self {
        Self {
            dir: dir.into(),
            output_file_name: config.output_file_name.clone(),
            extension: config.source_extension.clone(),
        }
    }

    /// Directory this loader reads from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Enumerate, parse and order every source collection
    ///
    /// # Errors
    ///
    /// - [`CarnetError::MissingInputDirectory`] if the directory does not exist
    /// - [`CarnetError::WalkDir`] if the directory itself cannot be listed
    pub fn discover(&self) -> Result<Discovery> {
        if !self.dir.is_dir() {
            return Err(CarnetError::MissingInputDirectory(self.dir.clone()));
        }

        let mut discovery = Discovery::default();
        let candidates = self.candidate_files(&mut discovery.skipped)?;
        debug!("Found {} candidate source files in {:?}", candidates.len(), self.dir);

        for path in candidates {
            match self.load_source(&path) {
                Ok(source) => {
                    debug!(
                        "Loaded source '{}' with {} entries",
                        source.id,
                        source.entries.len()
                    );
                    discovery.sources.push(source);
                }
                Err(CarnetError::MalformedSource { path, reason }) => {
                    warn!("Skipping {:?}: {}", path, reason);
                    discovery.skipped.push(SkippedSource { path, reason });
                }
                Err(e) => return Err(e),
            }
        }

        // Full file name, bytewise: "noel-2.json" sorts before "noel.json"
        discovery
            .sources
            .sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        discovery.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(discovery)
    }

    /// Source files in the directory, excluding the aggregate output
    ///
    /// Entries that cannot be inspected (a dangling symlink, say) are added
    /// to `skipped`; only a failure to list the directory itself is fatal.
    fn candidate_files(&self, skipped: &mut Vec<SkippedSource>) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = match e.path() {
                        Some(path) if e.depth() > 0 => path.to_path_buf(),
                        _ => return Err(e.into()),
                    };
                    if self.has_source_extension(&path) && !self.is_output_file(&path) {
                        let reason = format!("cannot inspect entry: {}", e);
                        warn!("Skipping {:?}: {}", path, reason);
                        skipped.push(SkippedSource { path, reason });
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !self.has_source_extension(path) {
                trace!("Ignoring non-source file {:?}", path);
                continue;
            }
            if self.is_output_file(path) {
                trace!("Ignoring aggregate output {:?}", path);
                continue;
            }
            files.push(path.to_path_buf());
        }
        Ok(files)
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext == self.extension.as_str())
            .unwrap_or(false)
    }

    fn is_output_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| {
                name.to_string_lossy()
                    .to_lowercase()
                    == self.output_file_name.to_lowercase()
            })
            .unwrap_or(false)
    }

    /// Read one file; every failure here is a malformed source
    fn load_source(&self, path: &Path) -> Result<SourceCollection> {
        let content = fs::read_to_string(path)
            .map_err(|e| CarnetError::malformed(path, format!("cannot read file: {}", e)))?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let document: Value = serde_json::from_str(content)
            .map_err(|e| CarnetError::malformed(path, format!("invalid JSON: {}", e)))?;

        match document {
            Value::Array(entries) => Ok(SourceCollection {
                id: utils::collection_id(path),
                path: path.to_path_buf(),
                entries,
            }),
            other => Err(CarnetError::malformed(
                path,
                format!("top-level value is {}, expected an array", json_kind(&other)),
            )),
        }
    }
}

/// Human name of a JSON value's type, for diagnostics
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
