use thiserror::Error;

/// Errors raised while building, walking or matching paths.
#[derive(Debug, Error)]
pub enum PathError {
    /// A segment was absent, or the value it was applied to is not indexable.
    #[error("path {path} not found")]
    PathNotFound { path: String },

    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
