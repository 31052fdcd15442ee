//! Service layer
//!
//! Services contain the individual build steps the orchestrator sequences:
//! preparing the workspace, fetching the source tree and driving one target
//! through its phases.
//!
//! External processes are always launched through a `ProcessRunner`, so every
//! step can be exercised in tests with a recording runner.

mod source;
mod target;
mod workspace;

pub use source::SourceFetcher;
pub use target::TargetDriver;
pub use workspace::WorkspaceManager;
