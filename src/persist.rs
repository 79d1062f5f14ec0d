//! Content-aware, crash-safe catalog writes
//!
//! The persister serializes a value as indented JSON (non-ASCII text kept
//! literally), writes it to a temporary file next to the target, syncs it,
//! and renames it over the target. Readers see either the old file or the
//! new one, never a partial write, and a failure before the rename leaves
//! the old file byte-identical.
//!
//! The write always happens. Whether anything changed is decided afterwards
//! by comparing SHA-256 digests of the target before and after:
//!
//! ```rust,no_run
//! use carnets::persist::Persister;
//! use carnets::PersistOutcome;
//!
//! # fn main() -> carnets::Result<()> {
//! let persister = Persister::new("carnets/all.json");
//! let result = persister.persist(&Vec::<serde_json::Value>::new())?;
//! if result.outcome == PersistOutcome::Unchanged {
//!     println!("nothing to commit");
//! }
//! # Ok(())
//! # }
//! ```

use crate::error::{CarnetError, Result};
use crate::types::{PersistOutcome, PersistResult};
use crate::utils;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, info};

/// Writes one target file atomically and reports whether it changed
#[derive(Debug, Clone)]
pub struct Persister {
    target: PathBuf,
    indent: usize,
}

impl Persister {
    /// Create a persister for `target` with two-space indentation
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            indent: 2,
        }
    }

    /// Set the number of spaces per indentation level
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Path being written
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Serialize to the canonical text form
    ///
    /// No trailing newline; an empty sequence is `[]`.
    pub fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        let indent = vec![b' '; self.indent];
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(&indent));
        value.serialize(&mut serializer)?;
        Ok(buffer)
    }

    /// Digest of the target as it is on disk now
    pub fn current_digest(&self) -> Result<Option<String>> {
        utils::hash_file_content(&self.target)
    }

    /// Serialize `value`, replace the target, and compare digests
    ///
    /// # Errors
    ///
    /// - [`CarnetError::Json`] if `value` cannot be serialized (nothing is written)
    /// - [`CarnetError::Persist`] if staging or the rename fails; the target is untouched
    pub fn persist<T: Serialize + ?Sized>(&self, value: &T) -> Result<PersistResult> {
        let digest_before = self.current_digest()?;
        let bytes = self.serialize(value)?;

        self.stage(&bytes)?.commit()?;

        let digest_after = self.current_digest()?;
        let outcome = if digest_before == digest_after {
            PersistOutcome::Unchanged
        } else {
            PersistOutcome::Written
        };
        info!("Persisted {:?} ({}, {} bytes)", self.target, outcome, bytes.len());

        Ok(PersistResult {
            outcome,
            digest_before,
            digest_after,
            bytes_written: bytes.len() as u64,
        })
    }

    /// Write `bytes` to a synced temp file beside the target
    ///
    /// Nothing is visible at the target until [`StagedWrite::commit`].
    pub fn stage(&self, bytes: &[u8]) -> Result<StagedWrite> {
        let dir = match self.target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| self.persist_error(e))?;

        let prefix = format!(
            ".{}.",
            self.target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        let mut temp = Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| self.persist_error(e))?;

        temp.write_all(bytes).map_err(|e| self.persist_error(e))?;
        temp.flush().map_err(|e| self.persist_error(e))?;
        self.copy_permissions(temp.path())?;
        temp.as_file().sync_all().map_err(|e| self.persist_error(e))?;

        debug!("Staged {} bytes at {:?}", bytes.len(), temp.path());
        Ok(StagedWrite {
            temp,
            target: self.target.clone(),
        })
    }

    /// Give the temp file the target's permissions (or 0644 for a new file)
    fn copy_permissions(&self, temp_path: &Path) -> Result<()> {
        let permissions = match fs::metadata(&self.target) {
            Ok(metadata) => metadata.permissions(),
            Err(_) => default_permissions(temp_path).map_err(|e| self.persist_error(e))?,
        };
        fs::set_permissions(temp_path, permissions).map_err(|e| self.persist_error(e))
    }

    fn persist_error(&self, source: std::io::Error) -> CarnetError {
        CarnetError::Persist {
            path: self.target.clone(),
            source,
        }
    }
}

#[cfg(unix)]
fn default_permissions(_temp_path: &Path) -> std::io::Result<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions(temp_path: &Path) -> std::io::Result<fs::Permissions> {
    Ok(fs::metadata(temp_path)?.permissions())
}

/// A fully written temp file waiting to replace its target
///
/// Dropping it without calling [`commit`](StagedWrite::commit) deletes the
/// temp file and leaves the target as it was.
#[derive(Debug)]
pub struct StagedWrite {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedWrite {
    /// Path of the staged temp file
    pub fn temp_path(&self) -> &Path {
        self.temp.path()
    }

    /// Atomically rename the temp file over the target
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.temp.persist(&target).map_err(|e| CarnetError::Persist {
            path: target.clone(),
            source: e.error,
        })?;
        debug!("Replaced {:?}", target);
        Ok(())
    }
}
