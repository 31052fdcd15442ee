//! Run context
//!
//! Bookkeeping for one build run:
//! - Run root, workspace and audit log paths
//! - Start and end timestamps
//! - The directory of the target currently being driven
//!
//! The orchestrator is the only writer; the pipeline is strictly sequential.

use autobuild_core::JobSpec;
use chrono::{DateTime, Local};
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct RunContext {
    /// Random identifier of this run
    pub run_id: Uuid,

    /// Absolute directory anchoring the run
    pub run_root: PathBuf,

    /// Disposable build tree under the run root
    pub workspace: PathBuf,

    /// Audit log file under the run root
    pub log_file: PathBuf,

    /// Prefix of every audit line, identifying the run
    pub prompt: String,

    pub started_at: DateTime<Local>,
    pub ended_at: Option<DateTime<Local>>,

    /// Working directory of the active target, if any
    pub current_target_workspace: Option<PathBuf>,
}

impl RunContext {
    /// Creates the context for a job
    ///
    /// # Arguments
    /// * `run_root` - Directory anchoring the run (must be absolute)
    /// * `job` - The job being built
    /// * `config` - Runner configuration
    pub fn new(run_root: &Path, job: &JobSpec, config: &Config) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            run_root: run_root.to_path_buf(),
            workspace: run_root.join(&config.workspace_dir),
            log_file: run_root.join(job.log_file_name()),
            prompt: format!(">>>> {} : ", job.title.trim()),
            started_at: Local::now(),
            ended_at: None,
            current_target_workspace: None,
        }
    }

    /// Directory of a target inside the workspace
    ///
    /// The subpath is always taken relative to the workspace, even when it
    /// starts with `/`. Returns `None` when it climbs out with `..`.
    pub fn target_dir(&self, subpath: &str) -> Option<PathBuf> {
        let mut dir = self.workspace.clone();
        for component in Path::new(subpath).components() {
            match component {
                Component::Normal(part) => dir.push(part),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
                Component::ParentDir => return None,
            }
        }
        Some(dir)
    }

    /// Records the end of the run
    pub fn finish(&mut self) -> DateTime<Local> {
        let now = Local::now().max(self.started_at);
        self.ended_at = Some(now);
        self.current_target_workspace = None;
        now
    }
}
