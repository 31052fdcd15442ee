//! Job domain types
//!
//! A job is the externally supplied description of one build run: where the
//! source lives and which targets to build from it, in order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fallback stem used when a job title sanitizes to nothing
const DEFAULT_LOG_STEM: &str = "autobuild";

/// Job specification
///
/// Immutable for the duration of a run. Field names follow the upstream
/// document format (PascalCase) and also accept camelCase/snake_case aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Human readable label, also used for the audit log file name
    #[serde(rename = "Title", alias = "title")]
    pub title: String,

    /// When the build was requested (free-form label, e.g. "2015-10-15 10:30:27")
    #[serde(
        rename = "RequestTime",
        alias = "requestTime",
        alias = "request_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub request_time: Option<String>,

    /// Informational clone directory label. The clone always lands in the workspace root.
    #[serde(
        rename = "CloneDir",
        alias = "cloneDir",
        alias = "clone_dir",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub clone_dir: Option<String>,

    /// Location of the version-controlled source tree
    #[serde(
        rename = "GitRepo",
        alias = "gitRepo",
        alias = "sourceRepository",
        alias = "source_repository",
        alias = "repo"
    )]
    pub source_repository: String,

    /// Ordered build targets; order defines build order
    #[serde(rename = "Target", alias = "targets", default)]
    pub targets: Vec<Target>,

    /// Requester address of the upstream front end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    /// Reply address of the upstream front end
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

impl JobSpec {
    /// Returns the audit log file name derived from the title
    ///
    /// Surrounding whitespace is trimmed and characters that would escape the
    /// run root or break the file name (path separators, control characters)
    /// are replaced with `_`.
    pub fn log_file_name(&self) -> String {
        format!("{}.log", sanitize_title(&self.title))
    }
}

/// Sanitizes a job title into a single safe file name component
pub fn sanitize_title(title: &str) -> String {
    let sanitized: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => DEFAULT_LOG_STEM.to_string(),
        _ => sanitized,
    }
}

/// One independently built component of a job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Label used in log lines
    #[serde(rename = "Title", alias = "title", default)]
    pub title: String,

    /// Directory, relative to the fetched source root, where the target is built
    #[serde(rename = "SubGitSrc", alias = "subpath", alias = "sub_path")]
    pub subpath: String,

    /// Container image the commands run in
    #[serde(
        rename = "DockerName",
        alias = "containerImage",
        alias = "container_image",
        alias = "image"
    )]
    pub container_image: String,

    #[serde(
        rename = "PreCmd",
        alias = "preCommands",
        alias = "pre_commands",
        alias = "pre",
        default
    )]
    pub pre_commands: Vec<String>,

    #[serde(
        rename = "BuildCmd",
        alias = "buildCommands",
        alias = "build_commands",
        alias = "build",
        default
    )]
    pub build_commands: Vec<String>,

    #[serde(
        rename = "PostCmd",
        alias = "postCommands",
        alias = "post_commands",
        alias = "post",
        default
    )]
    pub post_commands: Vec<String>,

    /// File, relative to the target directory, exported to the run root after a successful build
    #[serde(
        rename = "RstFile",
        alias = "resultArtifact",
        alias = "result_artifact",
        alias = "artifact",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub result_artifact: Option<String>,
}

impl Target {
    /// Name shown in log lines: the title, or the subpath when untitled
    pub fn display_name(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.subpath
        } else {
            &self.title
        }
    }

    /// Command tokens executed in the given phase
    pub fn commands(&self, phase: Phase) -> &[String] {
        match phase {
            Phase::Pre => &self.pre_commands,
            Phase::Build => &self.build_commands,
            Phase::Post => &self.post_commands,
        }
    }
}

/// Build phase of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Pre,
    Build,
    Post,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 3] = [Phase::Pre, Phase::Build, Phase::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Build => "build",
            Phase::Post => "post",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Target {
        Target {
            title: String::new(),
            subpath: "kernel".to_string(),
            container_image: "img".to_string(),
            pre_commands: vec!["init".to_string()],
            build_commands: vec!["make".to_string(), "-j4".to_string()],
            post_commands: vec![],
            result_artifact: None,
        }
    }

    #[test]
    fn test_sanitize_title_trims_and_replaces_separators() {
        assert_eq!(sanitize_title("  nightly  "), "nightly");
        assert_eq!(sanitize_title("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_title("line\nbreak"), "line_break");
        assert_eq!(sanitize_title("  "), "autobuild");
        assert_eq!(sanitize_title(".."), "autobuild");
    }

    #[test]
    fn test_log_file_name() {
        let spec = JobSpec {
            title: " kernel build ".to_string(),
            request_time: None,
            clone_dir: None,
            source_repository: "https://example/x.git".to_string(),
            targets: vec![],
            from: None,
            to: None,
        };

        assert_eq!(spec.log_file_name(), "kernel build.log");
    }

    #[test]
    fn test_target_display_name_falls_back_to_subpath() {
        let mut t = target();
        assert_eq!(t.display_name(), "kernel");

        t.title = "Kernel".to_string();
        assert_eq!(t.display_name(), "Kernel");
    }

    #[test]
    fn test_target_commands_per_phase() {
        let t = target();
        assert_eq!(t.commands(Phase::Pre), ["init"]);
        assert_eq!(t.commands(Phase::Build), ["make", "-j4"]);
        assert!(t.commands(Phase::Post).is_empty());
    }

    #[test]
    fn test_phase_order() {
        let names: Vec<_> = Phase::ALL.iter().map(|p| p.to_string()).collect();
        assert_eq!(names, ["pre", "build", "post"]);
    }
}
