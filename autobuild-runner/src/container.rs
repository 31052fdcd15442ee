//! Container invocation
//!
//! Builds the one-shot container command lines used for target phases:
//! - The target directory is bind-mounted at a fixed in-container path
//! - The container is removed after it exits (`--rm`)
//! - Each phase appends its own command tokens to the shared skeleton

use autobuild_core::Phase;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::Config;
use crate::process::ProcessSpec;

/// Container command skeleton shared by the three phases of one target
#[derive(Debug, Clone)]
pub struct ContainerInvocation {
    engine: String,
    image: String,
    host_dir: PathBuf,
    mount_point: String,

    /// Name stem; the phase is appended per container
    name: Option<String>,
}

impl ContainerInvocation {
    /// Creates the skeleton for a target
    ///
    /// # Arguments
    /// * `config` - Runner configuration (engine, mount point)
    /// * `image` - Container image to run
    /// * `host_dir` - Target directory mounted into the container and used as working directory
    pub fn new(config: &Config, image: &str, host_dir: &Path) -> Self {
        Self {
            engine: config.container_engine.clone(),
            image: image.to_string(),
            host_dir: host_dir.to_path_buf(),
            mount_point: config.mount_point.clone(),
            name: None,
        }
    }

    /// Names containers `autobuild-<run>-<target index>-<phase>`
    pub fn named(mut self, run_id: Uuid, target_index: usize) -> Self {
        self.name = Some(format!("autobuild-{}-{}", run_id, target_index));
        self
    }

    /// Arguments up to and including the image
    pub fn skeleton(&self, phase: Phase) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--rm".to_string(),
            "--volume".to_string(),
            format!("{}:{}", self.host_dir.display(), self.mount_point),
        ];

        if let Some(name) = &self.name {
            args.push("--name".to_string());
            args.push(format!("{}-{}", name, phase));
        }

        args.push(self.image.clone());
        args
    }

    /// Full command line for one phase
    pub fn phase_command(&self, phase: Phase, commands: &[String]) -> ProcessSpec {
        ProcessSpec::new(&self.engine, &self.host_dir)
            .args(self.skeleton(phase))
            .args(commands.iter().cloned())
    }
}
