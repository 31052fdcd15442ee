//! External process execution
//!
//! Every step of a build (clone, container phases) is a single external
//! process run to completion. The working directory is always passed
//! explicitly; the runner never changes its own current directory.

use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tracing::debug;

/// A command line to execute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory of the child
    pub cwd: PathBuf,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Outcome of a finished process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output followed by standard error
    pub output: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Human readable exit status
    pub fn status(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external processes to completion
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Executes the command and waits for it to exit
    ///
    /// # Returns
    /// The exit status with combined output, or the error that prevented
    /// the process from starting
    async fn run(&self, spec: &ProcessSpec) -> std::io::Result<ProcessOutput>;
}

/// Process runner backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, spec: &ProcessSpec) -> std::io::Result<ProcessOutput> {
        debug!("Executing in {:?}: {}", spec.cwd, spec);

        let output = tokio::process::Command::new(&spec.program)
            .args(&spec.args)
            .current_dir(&spec.cwd)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            "Process {} finished: exit_code={:?}, output_len={}",
            spec.program,
            output.status.code(),
            combined.len()
        );

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            output: combined,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display() {
        let spec = ProcessSpec::new("git", "/tmp")
            .arg("clone")
            .args(["--recursive", "https://example/x.git", "."]);

        assert_eq!(spec.to_string(), "git clone --recursive https://example/x.git .");
        assert_eq!(spec.cwd, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_output_status() {
        let ok = ProcessOutput {
            exit_code: Some(0),
            output: String::new(),
        };
        assert!(ok.success());
        assert_eq!(ok.status(), "exit code 0");

        let killed = ProcessOutput {
            exit_code: None,
            output: String::new(),
        };
        assert!(!killed.success());
        assert_eq!(killed.status(), "terminated by signal");
    }

    #[tokio::test]
    async fn test_system_runner_captures_combined_output() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("sh", dir.path())
            .arg("-c")
            .arg("echo out; echo err >&2; pwd; exit 3");

        let output = SystemProcessRunner.run(&spec).await.unwrap();

        assert_eq!(output.exit_code, Some(3));
        assert!(output.output.contains("out"));
        assert!(output.output.contains("err"));

        let canonical = dir.path().canonicalize().unwrap();
        assert!(output.output.contains(canonical.to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_system_runner_launch_failure() {
        let dir = tempfile::tempdir().unwrap();
        let spec = ProcessSpec::new("autobuild-no-such-binary", dir.path());

        assert!(SystemProcessRunner.run(&spec).await.is_err());
    }
}
