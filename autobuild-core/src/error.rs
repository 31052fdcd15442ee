//! Error types for loading job specifications

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, JobSpecError>;

/// Errors that can occur while loading a job specification
#[derive(Debug, Error)]
pub enum JobSpecError {
    /// The document was empty or whitespace only
    #[error("Job document is empty")]
    Empty,

    /// The document is not valid JSON or lacks a required field
    #[error("Malformed job document: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The document file could not be read
    #[error("Failed to read job document {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl JobSpecError {
    /// Check if this error was caused by an absent required field
    pub fn is_missing_field(&self) -> bool {
        matches!(self, Self::Malformed(e) if e.is_data() && e.to_string().starts_with("missing field"))
    }
}
