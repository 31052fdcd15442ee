//! Run domain types
//!
//! Produced by the runner once a build finishes. They describe how far the
//! run got and what happened to every declared target.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::domain::job::Phase;

/// Orchestrator state
///
/// `Init → Prepared → SourceFetched → TargetRunning(i)* → Finalized`, with
/// `Failed` reachable from every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Init,
    Prepared,
    SourceFetched,
    TargetRunning(usize),
    Failed,
    Finalized,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Init => write!(f, "Init"),
            RunState::Prepared => write!(f, "Prepared"),
            RunState::SourceFetched => write!(f, "SourceFetched"),
            RunState::TargetRunning(i) => write!(f, "TargetRunning({})", i),
            RunState::Failed => write!(f, "Failed"),
            RunState::Finalized => write!(f, "Finalized"),
        }
    }
}

/// Outcome of a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    /// All three phases exited successfully
    Succeeded,
    /// The target directory could not be entered; no phase ran
    DirectoryUnavailable,
    /// The given phase failed; later phases never ran
    PhaseFailed(Phase),
    /// Not driven because an earlier step of the run failed
    Skipped,
}

impl TargetStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, TargetStatus::Succeeded)
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetStatus::Succeeded => write!(f, "succeeded"),
            TargetStatus::DirectoryUnavailable => write!(f, "failed (directory unavailable)"),
            TargetStatus::PhaseFailed(phase) => write!(f, "failed ({} phase)", phase),
            TargetStatus::Skipped => write!(f, "skipped"),
        }
    }
}

/// What happened to a target's declared result artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactStatus {
    /// The target declares no artifact
    NotDeclared,
    /// The target did not succeed, so no export was attempted
    NotAttempted,
    /// Copied to the given path under the run root
    Exported(PathBuf),
    /// Copy failed; recorded in the log, does not change the target verdict
    ExportFailed(String),
}

/// Per-target entry of a run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetReport {
    pub title: String,
    pub status: TargetStatus,
    pub artifact: ArtifactStatus,
}

impl TargetReport {
    pub fn skipped(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: TargetStatus::Skipped,
            artifact: ArtifactStatus::NotAttempted,
        }
    }
}

/// Final report of one orchestrator run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// State the run finished in (`Finalized` or `Failed`)
    pub state: RunState,
    /// Last non-terminal state reached before finishing
    pub reached: RunState,
    pub targets: Vec<TargetReport>,
    pub started_at: DateTime<Local>,
    pub ended_at: DateTime<Local>,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.state == RunState::Finalized
    }

    /// Process exit code for this run
    pub fn exit_code(&self) -> i32 {
        if self.success() { 0 } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(state: RunState) -> RunReport {
        let now = Local::now();
        RunReport {
            state,
            reached: RunState::SourceFetched,
            targets: vec![],
            started_at: now,
            ended_at: now,
        }
    }

    #[test]
    fn test_exit_code_follows_state() {
        assert_eq!(report(RunState::Finalized).exit_code(), 0);
        assert_eq!(report(RunState::Failed).exit_code(), 1);
    }

    #[test]
    fn test_target_status_display() {
        assert_eq!(
            TargetStatus::PhaseFailed(Phase::Build).to_string(),
            "failed (build phase)"
        );
        assert_eq!(TargetStatus::Skipped.to_string(), "skipped");
        assert!(TargetStatus::Succeeded.is_success());
        assert!(!TargetStatus::Skipped.is_success());
    }

    #[test]
    fn test_skipped_report() {
        let r = TargetReport::skipped("uboot");
        assert_eq!(r.status, TargetStatus::Skipped);
        assert_eq!(r.artifact, ArtifactStatus::NotAttempted);
    }
}
