//! Error types for build steps
//!
//! Every orchestration step returns one of these. The orchestrator turns them
//! into an audit log line and the run-wide failure flag; nothing outside the
//! process ever sees them.

use autobuild_core::Phase;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for build steps
pub type Result<T> = std::result::Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    /// The workspace directory could not be created
    #[error("Failed to create workspace {path:?}: {source}")]
    WorkspaceCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The workspace exists but cannot be used as a working directory
    #[error("Workspace {path:?} is not an accessible directory")]
    WorkspaceAccess { path: PathBuf },

    /// An external process could not be started
    #[error("Failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `git clone` exited unsuccessfully
    #[error("Clone of {repository} failed ({status})")]
    Clone { repository: String, status: String },

    /// The bootstrap file could not be seeded into the clone
    #[error("Failed to copy bootstrap file {source_path:?} to {destination:?}: {source}")]
    Bootstrap {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target directory does not exist in the clone
    #[error("Target directory {path:?} is not available")]
    TargetDirectory { path: PathBuf },

    /// A phase command exited unsuccessfully
    #[error("Target '{target}' failed in {phase} phase ({status})")]
    Phase {
        target: String,
        phase: Phase,
        status: String,
    },

    /// The result artifact could not be copied to the run root
    #[error("Failed to export artifact {artifact:?}: {reason}")]
    ArtifactExport { artifact: PathBuf, reason: String },
}
