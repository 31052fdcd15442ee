//! Target driver
//!
//! Drives one target through its phases:
//! - Resolves the target directory inside the workspace
//! - Runs pre, build and post in one-shot containers, stopping at the first failure
//! - Exports the declared result artifact to the run root (best effort)

use autobuild_core::domain::run::{ArtifactStatus, TargetReport, TargetStatus};
use autobuild_core::{Phase, Target};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::container::ContainerInvocation;
use crate::context::RunContext;
use crate::error::{BuildError, Result};
use crate::process::ProcessRunner;
use crate::service::workspace::is_accessible_dir;

pub struct TargetDriver<'a> {
    runner: &'a dyn ProcessRunner,
    config: &'a Config,
}

impl<'a> TargetDriver<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, config: &'a Config) -> Self {
        Self { runner, config }
    }

    /// Executes the full phase sequence of a target
    ///
    /// # Arguments
    /// * `index` - Position of the target in the job
    /// * `target` - The target to build
    /// * `ctx` - Run context; its current target workspace is updated
    /// * `log` - Audit log of the run
    ///
    /// # Returns
    /// The target's outcome. A failed artifact export is reported in the
    /// artifact status only and leaves a successful verdict untouched.
    pub async fn drive(
        &self,
        index: usize,
        target: &Target,
        ctx: &mut RunContext,
        log: &mut AuditLog,
    ) -> TargetReport {
        let title = target.display_name().to_string();
        let Some(dir) = ctx.target_dir(&target.subpath) else {
            log.error(format!(
                "Fail Change Directory: subpath '{}' leaves the workspace",
                target.subpath
            ));
            return unavailable(title);
        };

        log.info(format!("Change Directory [{}]", dir.display()));
        if !is_accessible_dir(&dir) {
            let error = BuildError::TargetDirectory { path: dir };
            log.error(format!("Fail Change Directory: {}", error));
            return unavailable(title);
        }
        ctx.current_target_workspace = Some(dir.clone());

        log.info(format!("Build Start [{}] image [{}]", title, target.container_image));

        let mut invocation = ContainerInvocation::new(self.config, &target.container_image, &dir);
        if self.config.name_containers {
            invocation = invocation.named(ctx.run_id, index);
        }

        for phase in Phase::ALL {
            if let Err(error) = self.run_phase(&title, target, phase, &invocation, log).await {
                log.error(error.to_string());
                return TargetReport {
                    title,
                    status: TargetStatus::PhaseFailed(phase),
                    artifact: ArtifactStatus::NotAttempted,
                };
            }
        }

        log.info(format!("Build Done [{}]", title));

        let artifact = match &target.result_artifact {
            Some(artifact) => self.export_artifact(artifact, &dir, &ctx.run_root, log),
            None => ArtifactStatus::NotDeclared,
        };

        TargetReport {
            title,
            status: TargetStatus::Succeeded,
            artifact,
        }
    }

    /// Runs one phase container to completion
    async fn run_phase(
        &self,
        title: &str,
        target: &Target,
        phase: Phase,
        invocation: &ContainerInvocation,
        log: &mut AuditLog,
    ) -> Result<()> {
        let commands = target.commands(phase);
        let spec = invocation.phase_command(phase, commands);
        log.info(format!("Run Command [{}] : {}", phase, spec));

        let output = match self.runner.run(&spec).await {
            Ok(output) => output,
            Err(e) => {
                return Err(BuildError::Phase {
                    target: title.to_string(),
                    phase,
                    status: format!("cannot launch {}: {}", spec.program, e),
                });
            }
        };

        log.output("Compile", &output.output);

        if !output.success() {
            log.error(format!("Fail Build [{}] {:?}", phase, commands));
            return Err(BuildError::Phase {
                target: title.to_string(),
                phase,
                status: output.status(),
            });
        }

        debug!("Phase {} of '{}' succeeded", phase, title);
        Ok(())
    }

    /// Copies the result artifact next to the audit log
    fn export_artifact(
        &self,
        artifact: &str,
        target_dir: &Path,
        run_root: &Path,
        log: &mut AuditLog,
    ) -> ArtifactStatus {
        let Some(source) = self.resolve_artifact(artifact, target_dir) else {
            let reason = "artifact path leaves the target directory".to_string();
            let error = BuildError::ArtifactExport {
                artifact: PathBuf::from(artifact),
                reason: reason.clone(),
            };
            log.warning(format!("Fail Result File Copy: {}", error));
            return ArtifactStatus::ExportFailed(reason);
        };

        let result = match source.file_name() {
            Some(name) => {
                let destination = run_root.join(name);
                std::fs::copy(&source, &destination)
                    .map(|_| destination)
                    .map_err(|e| e.to_string())
            }
            None => Err("artifact path has no file name".to_string()),
        };

        match result {
            Ok(destination) => {
                info!("Exported artifact {:?}", destination);
                log.info(format!(
                    "Copy Result File [{}] -> [{}]",
                    source.display(),
                    destination.display()
                ));
                ArtifactStatus::Exported(destination)
            }
            Err(reason) => {
                let error = BuildError::ArtifactExport {
                    artifact: source,
                    reason: reason.clone(),
                };
                log.warning(format!("Fail Result File Copy: {}", error));
                ArtifactStatus::ExportFailed(reason)
            }
        }
    }

    /// Maps an artifact path to the host
    ///
    /// Relative paths, paths under the in-container mount point and other
    /// absolute paths all refer to the target directory. Returns `None` when
    /// the path climbs out of it with `..`.
    fn resolve_artifact(&self, artifact: &str, target_dir: &Path) -> Option<PathBuf> {
        let path = Path::new(artifact);
        let relative = path.strip_prefix(&self.config.mount_point).unwrap_or(path);

        let mut resolved = target_dir.to_path_buf();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::RootDir | Component::Prefix(_) | Component::CurDir => {}
                Component::ParentDir => return None,
            }
        }
        Some(resolved)
    }
}

fn unavailable(title: String) -> TargetReport {
    TargetReport {
        title,
        status: TargetStatus::DirectoryUnavailable,
        artifact: ArtifactStatus::NotAttempted,
    }
}
