//! Job specification loader
//!
//! A boundary check only: the document must be well-formed JSON carrying every
//! required field. Nothing here checks that images exist or that subpaths are
//! present in the repository; those problems surface when the build runs.

use std::path::Path;

use crate::domain::job::JobSpec;
use crate::error::{JobSpecError, Result};

/// Parses a job document
///
/// # Arguments
/// * `document` - JSON text of the job specification
///
/// # Returns
/// The parsed specification, or the reason the document was rejected
pub fn parse_job_spec(document: &str) -> Result<JobSpec> {
    if document.trim().is_empty() {
        return Err(JobSpecError::Empty);
    }

    Ok(serde_json::from_str(document)?)
}

/// Reads and parses a job document from a file
pub fn load_job_spec(path: &Path) -> Result<JobSpec> {
    let document = std::fs::read_to_string(path).map_err(|source| JobSpecError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_job_spec(&document)
}
