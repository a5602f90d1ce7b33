use restore_path::{Path, PathError};
use thiserror::Error;

/// Errors surfaced by store, node and cursor operations.
///
/// A mutation that fails with any of these leaves the current snapshot
/// untouched.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("path {path} not found")]
    PathNotFound { path: String },

    #[error("invalid mutation at {path}: {reason}")]
    InvalidMutation { path: String, reason: String },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl StoreError {
    pub(crate) fn invalid_mutation(path: &Path, reason: impl Into<String>) -> Self {
        StoreError::InvalidMutation {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(path: &Path) -> Self {
        StoreError::PathNotFound {
            path: path.to_string(),
        }
    }
}

impl From<PathError> for StoreError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::PathNotFound { path } => StoreError::PathNotFound { path },
            PathError::InvalidPath { path, reason } => StoreError::InvalidPath { path, reason },
            PathError::InvalidPattern { pattern, source } => {
                StoreError::InvalidPattern { pattern, source }
            }
        }
    }
}
