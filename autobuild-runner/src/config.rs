//! Runner configuration
//!
//! Defines the tools and filesystem conventions the build runner relies on:
//! which container engine and git binary to invoke, where the workspace lives
//! under the run root and which support file is seeded into the fresh clone.

use std::path::{Component, Path, PathBuf};

/// Default container engine binary
pub const DEFAULT_CONTAINER_ENGINE: &str = "docker";

/// Default git binary
pub const DEFAULT_GIT: &str = "git";

/// In-container path the target directory is bind-mounted to
pub const DEFAULT_MOUNT_POINT: &str = "/work";

/// Workspace directory name under the run root
pub const DEFAULT_WORKSPACE_DIR: &str = "build";

/// Bootstrap script, relative to the run root
pub const DEFAULT_BOOTSTRAP_FILE: &str = "../autoconfig.sh";

/// Directory inside the fresh clone that receives the bootstrap script
pub const DEFAULT_BOOTSTRAP_DEST: &str = "buildroot";

/// Support file copied into the fresh clone after a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrap {
    /// Source file, absolute or relative to the run root
    pub source: PathBuf,
    /// Destination directory, relative to the workspace
    pub destination: PathBuf,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_BOOTSTRAP_FILE),
            destination: PathBuf::from(DEFAULT_BOOTSTRAP_DEST),
        }
    }
}

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Container engine binary (docker, podman)
    pub container_engine: String,

    /// Git binary used to fetch sources
    pub git_binary: String,

    /// In-container mount point of the target directory
    pub mount_point: String,

    /// Workspace directory name created under the run root
    pub workspace_dir: String,

    /// Support file seeded into the clone; `None` disables seeding
    pub bootstrap: Option<Bootstrap>,

    /// Whether phase containers get a deterministic `--name`
    pub name_containers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            container_engine: DEFAULT_CONTAINER_ENGINE.to_string(),
            git_binary: DEFAULT_GIT.to_string(),
            mount_point: DEFAULT_MOUNT_POINT.to_string(),
            workspace_dir: DEFAULT_WORKSPACE_DIR.to_string(),
            bootstrap: Some(Bootstrap::default()),
            name_containers: true,
        }
    }
}

impl Config {
    /// Creates configuration from environment variables
    ///
    /// All variables are optional and fall back to the defaults:
    /// - AUTOBUILD_CONTAINER_ENGINE (default: docker)
    /// - AUTOBUILD_GIT (default: git)
    /// - AUTOBUILD_MOUNT_POINT (default: /work)
    /// - AUTOBUILD_WORKSPACE_DIR (default: build)
    /// - AUTOBUILD_BOOTSTRAP_FILE (default: ../autoconfig.sh, empty disables seeding)
    /// - AUTOBUILD_BOOTSTRAP_DEST (default: buildroot)
    /// - AUTOBUILD_NAME_CONTAINERS (default: true)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(engine) = lookup("AUTOBUILD_CONTAINER_ENGINE") {
            config.container_engine = engine;
        }

        if let Some(git) = lookup("AUTOBUILD_GIT") {
            config.git_binary = git;
        }

        if let Some(mount_point) = lookup("AUTOBUILD_MOUNT_POINT") {
            config.mount_point = mount_point;
        }

        if let Some(workspace_dir) = lookup("AUTOBUILD_WORKSPACE_DIR") {
            config.workspace_dir = workspace_dir;
        }

        let bootstrap_file = lookup("AUTOBUILD_BOOTSTRAP_FILE");
        let bootstrap_dest = lookup("AUTOBUILD_BOOTSTRAP_DEST");
        config.bootstrap = match bootstrap_file.as_deref() {
            Some(file) if file.trim().is_empty() => None,
            file => Some(Bootstrap {
                source: PathBuf::from(file.unwrap_or(DEFAULT_BOOTSTRAP_FILE)),
                destination: PathBuf::from(
                    bootstrap_dest.as_deref().unwrap_or(DEFAULT_BOOTSTRAP_DEST),
                ),
            }),
        };

        if let Some(value) = lookup("AUTOBUILD_NAME_CONTAINERS") {
            config.name_containers = parse_bool(&value).ok_or_else(|| {
                anyhow::anyhow!("AUTOBUILD_NAME_CONTAINERS must be a boolean, got '{}'", value)
            })?;
        }

        Ok(config)
    }

    /// Disables bootstrap seeding
    #[cfg(test)]
    pub fn without_bootstrap(mut self) -> Self {
        self.bootstrap = None;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.container_engine.trim().is_empty() {
            anyhow::bail!("container_engine cannot be empty");
        }

        if self.git_binary.trim().is_empty() {
            anyhow::bail!("git_binary cannot be empty");
        }

        if !self.mount_point.starts_with('/') {
            anyhow::bail!("mount_point must be an absolute container path");
        }

        if self.mount_point.contains(':') {
            anyhow::bail!("mount_point cannot contain ':'");
        }

        if !is_single_component(Path::new(&self.workspace_dir)) {
            anyhow::bail!("workspace_dir must be a single relative directory name");
        }

        if let Some(bootstrap) = &self.bootstrap {
            if bootstrap.destination.is_absolute() {
                anyhow::bail!("bootstrap destination must be relative to the workspace");
            }
            if bootstrap
                .destination
                .components()
                .any(|c| matches!(c, Component::ParentDir))
            {
                anyhow::bail!("bootstrap destination cannot leave the workspace");
            }
        }

        Ok(())
    }
}

fn is_single_component(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
