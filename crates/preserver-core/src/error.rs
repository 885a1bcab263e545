//! Error types for answer storage and import.
//!
//! Most of these never escape the public operations: `save` turns a
//! `StoreError` into `false` plus a log line, `load_all` skips records that
//! fail with `DecodeError`, and `import_json` folds `ImportError` into its
//! outcome message. They are exposed for callers that want the detail.

use std::path::PathBuf;

use thiserror::Error;

/// Failures while reading or writing answer records.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A key component cannot be used as a single path segment.
    #[error("invalid {field} '{value}': {reason}")]
    InvalidKey {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    /// An answer is already stored under this key; records are never replaced.
    #[error("answer already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize answer: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A stored record matched neither the current nor the legacy format.
#[derive(Debug, Error)]
#[error("unrecognized answer record: {structured}")]
pub struct DecodeError {
    /// Why the structured decode failed.
    pub structured: serde_json::Error,
}

/// Structural failures that reject an import payload as a whole.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Invalid JSON format")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Invalid JSON format: missing 'answers' field")]
    MissingAnswers,

    #[error("Invalid JSON format: 'answers' must be a list")]
    AnswersNotList,

    /// The target username cannot be used as a storage key.
    #[error("Invalid username '{0}'")]
    InvalidUsername(String),
}
