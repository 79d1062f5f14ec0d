//! Error types for the carnets library
//!
//! This module defines every error that can surface from a merge or
//! classification run. Directory-level problems abort the run; source-level
//! problems are carried as [`CarnetError::MalformedSource`] values that the
//! loader records and skips. Invalid records are never errors: the
//! aggregator counts and drops them.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the carnets library
pub type Result<T> = std::result::Result<T, CarnetError>;

/// Main error type for all carnets operations
#[derive(Debug, Error)]
pub enum CarnetError {
    /// I/O errors during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The songbook directory does not exist
    #[error("Input directory not found: {0:?}")]
    MissingInputDirectory(PathBuf),

    /// A source file could not be used as a songbook
    #[error("Malformed source {path:?}: {reason}")]
    MalformedSource {
        /// Path to the offending source file
        path: PathBuf,
        /// Why the source was rejected
        reason: String,
    },

    /// The temp-file-then-replace protocol failed
    #[error("Failed to persist {path:?}: {source}")]
    Persist {
        /// Target path that was being replaced
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Directory enumeration error from walkdir
    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl CarnetError {
    /// Create a malformed-source error for a file
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CarnetError::MalformedSource {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error with a custom message
    pub fn config(msg: impl Into<String>) -> Self {
        CarnetError::InvalidConfiguration(msg.into())
    }

    /// Check if the run can continue past this error
    ///
    /// Only source-level failures are absorbed; everything else aborts.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CarnetError::MalformedSource { .. })
    }

    /// Check if this error means there was nothing to aggregate
    pub fn is_missing_input(&self) -> bool {
        matches!(self, CarnetError::MissingInputDirectory(_))
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            CarnetError::MissingInputDirectory(path) => {
                format!(
                    "Songbook directory {:?} not found. Create it or pass the right path to 'carnets merge'.",
                    path
                )
            }
            CarnetError::Persist { path, source } => {
                format!(
                    "Could not replace {:?} ({}). The previous catalog was left untouched.",
                    path, source
                )
            }
            CarnetError::InvalidConfiguration(msg) => {
                format!("Invalid configuration: {}. Check the --config file and flags.", msg)
            }
            _ => self.to_string(),
        }
    }
}
