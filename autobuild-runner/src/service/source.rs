//! Source fetcher
//!
//! Clones the job's repository (with submodules) into the workspace and seeds
//! the fresh tree with the bootstrap support file the downstream build expects.

use autobuild_core::JobSpec;
use tracing::debug;

use crate::audit::AuditLog;
use crate::config::{Bootstrap, Config};
use crate::context::RunContext;
use crate::error::{BuildError, Result};
use crate::process::{ProcessRunner, ProcessSpec};

pub struct SourceFetcher<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a Config,
}

impl<'a> SourceFetcher<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Clones the repository into the workspace, then seeds the bootstrap file
    ///
    /// Clone output is written to the audit log before the exit status is
    /// looked at, so a failed clone always leaves its output behind.
    pub async fn fetch(&self, job: &JobSpec, ctx: &RunContext, log: &mut AuditLog) -> Result<()> {
        let repository = &job.source_repository;
        log.info(format!("Clone Source [{}]", repository));

        let spec = ProcessSpec::new(&self.config.git_binary, &ctx.workspace)
            .args(["clone", "--recursive"])
            .arg(repository.as_str())
            .arg(".");
        log.info(format!("Run Command : {}", spec));

        let output = match self.runner.run(&spec).await {
            Ok(output) => output,
            Err(source) => {
                log.error(format!(
                    "Fail Clone Source [{}]: cannot launch {}: {}",
                    repository, spec.program, source
                ));
                return Err(BuildError::Launch {
                    program: spec.program,
                    source,
                });
            }
        };

        log.output("Clone", &output.output);

        if !output.success() {
            log.error(format!(
                "Fail Clone Source [{}] ({})",
                repository,
                output.status()
            ));
            return Err(BuildError::Clone {
                repository: repository.clone(),
                status: output.status(),
            });
        }

        if let Some(bootstrap) = &self.config.bootstrap {
            self.seed_bootstrap(bootstrap, ctx, log)?;
        }

        Ok(())
    }

    /// Copies the bootstrap file into its directory in the fresh clone
    fn seed_bootstrap(
        &self,
        bootstrap: &Bootstrap,
        ctx: &RunContext,
        log: &mut AuditLog,
    ) -> Result<()> {
        let source_path = if bootstrap.source.is_absolute() {
            bootstrap.source.clone()
        } else {
            ctx.run_root.join(&bootstrap.source)
        };
        let destination_dir = ctx.workspace.join(&bootstrap.destination);

        let copied = match source_path.file_name() {
            Some(name) if destination_dir.is_dir() => {
                let destination = destination_dir.join(name);
                std::fs::copy(&source_path, &destination).map(|bytes| (destination, bytes))
            }
            Some(_) => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "destination directory does not exist in the clone",
            )),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "bootstrap source has no file name",
            )),
        };

        match copied {
            Ok((destination, bytes)) => {
                debug!("Copied {} bytes of bootstrap file", bytes);
                log.info(format!(
                    "Copy Bootstrap File [{}] -> [{}]",
                    source_path.display(),
                    destination.display()
                ));
                Ok(())
            }
            Err(source) => {
                log.error(format!(
                    "Fail Bootstrap File Copy [{}] -> [{}]: {}",
                    source_path.display(),
                    destination_dir.display(),
                    source
                ));
                Err(BuildError::Bootstrap {
                    source_path,
                    destination: destination_dir,
                    source,
                })
            }
        }
    }
}
