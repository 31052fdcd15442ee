//! Build orchestrator
//!
//! Sequences one build run:
//! `Init → Prepared → SourceFetched → TargetRunning(i)* → Finalized`
//!
//! A failure while preparing the workspace or fetching the source aborts the
//! run before any target starts. A failed target ends the target loop; the
//! remaining targets are reported as skipped and never driven. Work already
//! done by earlier targets is left in place. The audit log is closed at the
//! end of every run, whatever the outcome.

use autobuild_core::JobSpec;
use autobuild_core::domain::log::MARK_TIME_FORMAT;
use autobuild_core::domain::run::{RunReport, RunState, TargetReport};
use tracing::{debug, error};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::context::RunContext;
use crate::process::ProcessRunner;
use crate::service::{SourceFetcher, TargetDriver, WorkspaceManager};

pub struct BuildOrchestrator<'a> {
    config: &'a Config,
    runner: &'a dyn ProcessRunner,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn ProcessRunner) -> Self {
        Self { config, runner }
    }

    /// Runs the whole job and closes the audit log
    ///
    /// # Arguments
    /// * `job` - The job to build
    /// * `ctx` - Run context created for this invocation
    /// * `log` - Audit log of the run, closed before returning
    ///
    /// # Returns
    /// The run report; its exit code is 0 only if the source was fetched and
    /// every target completed all three phases
    pub async fn run(&self, job: &JobSpec, ctx: &mut RunContext, log: &mut AuditLog) -> RunReport {
        let mut state = RunState::Init;
        let mut failed = false;
        let mut targets = Vec::with_capacity(job.targets.len());

        log.info(format!(
            "AutoBuild Start [{}]",
            ctx.started_at.format(MARK_TIME_FORMAT)
        ));
        self.log_job(job, ctx, log);

        if let Err(e) = WorkspaceManager.prepare(ctx, log) {
            error!("Workspace preparation failed: {}", e);
            failed = true;
        } else {
            state = RunState::Prepared;
        }

        if !failed {
            let fetcher = SourceFetcher::new(self.runner, self.config);
            match fetcher.fetch(job, ctx, log).await {
                Ok(()) => state = RunState::SourceFetched,
                Err(e) => {
                    error!("Source fetch failed: {}", e);
                    failed = true;
                }
            }
        }

        if !failed {
            let driver = TargetDriver::new(self.runner, self.config);

            for (index, target) in job.targets.iter().enumerate() {
                state = RunState::TargetRunning(index);
                debug!("Entering state {}", state);
                log.info(format!(
                    "Target {}/{} [{}]",
                    index + 1,
                    job.targets.len(),
                    target.display_name()
                ));

                let report = driver.drive(index, target, ctx, log).await;
                let succeeded = report.status.is_success();
                targets.push(report);

                if !succeeded {
                    failed = true;
                    break;
                }
            }
        }

        // Everything not driven is reported as skipped
        for target in job.targets.iter().skip(targets.len()) {
            targets.push(TargetReport::skipped(target.display_name()));
        }

        self.finalize(state, failed, targets, ctx, log)
    }

    fn log_job(&self, job: &JobSpec, ctx: &RunContext, log: &mut AuditLog) {
        log.info(format!("Run Directory [{}]", ctx.run_root.display()));
        log.info(format!("Build Log File [{}]", ctx.log_file.display()));

        if let Some(request_time) = &job.request_time {
            log.info(format!("Requested At [{}]", request_time));
        }
        if let Some(from) = &job.from {
            log.info(format!("Requested By [{}]", from));
        }
        if let Some(clone_dir) = &job.clone_dir {
            log.info(format!("Clone Directory Label [{}]", clone_dir));
        }

        log.info(format!(
            "Source [{}] with {} target(s)",
            job.source_repository,
            job.targets.len()
        ));
    }

    fn finalize(
        &self,
        reached: RunState,
        failed: bool,
        targets: Vec<TargetReport>,
        ctx: &mut RunContext,
        log: &mut AuditLog,
    ) -> RunReport {
        let ended_at = ctx.finish();

        for target in &targets {
            log.info(format!("Target [{}] {}", target.title, target.status));
        }

        if failed {
            log.error(format!("Build Failed (reached {})", reached));
        } else {
            log.info("Build Succeeded");
        }
        log.info(format!("Build End [{}]", ended_at.format(MARK_TIME_FORMAT)));
        log.close();

        RunReport {
            state: if failed {
                RunState::Failed
            } else {
                RunState::Finalized
            },
            reached,
            targets,
            started_at: ctx.started_at,
            ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::testing::{MemorySink, Recorded};
    use crate::process::testing::{ScriptedRunner, exit_with};
    use autobuild_core::Phase;
    use autobuild_core::domain::log::LogLevel;
    use autobuild_core::domain::run::{ArtifactStatus, TargetStatus};
    use autobuild_core::parse_job_spec;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const SCENARIO: &str = r#"{
        "title": "scenario",
        "repo": "https://example/x.git",
        "targets": [
            {"subpath": "a", "image": "img1", "pre": ["init"], "build": ["make"], "post": ["pack"], "artifact": "out.bin"}
        ]
    }"#;

    const THREE_TARGETS: &str = r#"{
        "Title": "three",
        "GitRepo": "https://example/x.git",
        "Target": [
            {"Title": "one", "SubGitSrc": "a", "DockerName": "img", "PreCmd": ["p1"], "BuildCmd": ["b1"], "PostCmd": ["q1"]},
            {"Title": "two", "SubGitSrc": "b", "DockerName": "img", "PreCmd": ["p2"], "BuildCmd": ["b2"], "PostCmd": ["q2"]},
            {"Title": "three", "SubGitSrc": "c", "DockerName": "img", "PreCmd": ["p3"], "BuildCmd": ["b3"], "PostCmd": ["q3"]}
        ]
    }"#;

    struct Harness {
        _dir: tempfile::TempDir,
        root: std::path::PathBuf,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let root = dir.path().to_path_buf();
            Self {
                _dir: dir,
                root,
                config: Config::default().without_bootstrap(),
            }
        }

        /// Runner standing in for git and docker
        ///
        /// The clone creates every target directory; a container whose last
        /// token is `pack` writes `out.bin`; the token in `failing` exits 1.
        fn runner(&self, subdirs: &'static [&'static str], failing: Option<&'static str>) -> ScriptedRunner {
            ScriptedRunner::new(move |spec| {
                let last = spec.args.last().map(String::as_str);
                if spec.program == "git" {
                    for subdir in subdirs {
                        std::fs::create_dir_all(spec.cwd.join(subdir))?;
                    }
                    return Ok(exit_with(0, "Cloning into '.'..."));
                }
                if last.is_some() && last == failing {
                    return Ok(exit_with(1, "make: *** [all] Error 1"));
                }
                if last == Some("pack") {
                    std::fs::write(spec.cwd.join("out.bin"), "image")?;
                }
                Ok(exit_with(0, "done"))
            })
        }

        async fn run(&self, document: &str, runner: &ScriptedRunner) -> (RunReport, Arc<Mutex<Recorded>>) {
            let job = parse_job_spec(document).unwrap();
            let mut ctx = RunContext::new(&self.root, &job, &self.config);
            let (sink, recorded) = MemorySink::new();
            let mut log = AuditLog::new(ctx.prompt.clone()).with_sink(sink);

            let report = BuildOrchestrator::new(&self.config, runner)
                .run(&job, &mut ctx, &mut log)
                .await;

            (report, recorded)
        }

        fn root(&self) -> &Path {
            &self.root
        }
    }

    #[tokio::test]
    async fn test_scenario_success() {
        let harness = Harness::new();
        let runner = harness.runner(&["a"], None);

        let (report, recorded) = harness.run(SCENARIO, &runner).await;

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.state, RunState::Finalized);
        assert_eq!(report.reached, RunState::TargetRunning(0));
        assert_eq!(
            std::fs::read_to_string(harness.root().join("out.bin")).unwrap(),
            "image"
        );

        let recorded = recorded.lock().unwrap();
        assert!(recorded.contains("Clone Source [https://example/x.git]"));
        for phase in Phase::ALL {
            assert!(recorded.contains(&format!("Run Command [{}] :", phase)));
        }
        assert!(recorded.contains("Build End"));
        assert_eq!(recorded.closes, 1);
    }

    #[tokio::test]
    async fn test_scenario_build_failure() {
        let harness = Harness::new();
        let runner = harness.runner(&["a"], Some("make"));

        let (report, recorded) = harness.run(SCENARIO, &runner).await;

        assert_ne!(report.exit_code(), 0);
        assert_eq!(report.targets[0].status, TargetStatus::PhaseFailed(Phase::Build));
        assert_eq!(report.targets[0].artifact, ArtifactStatus::NotAttempted);
        assert_eq!(runner.count_ending_with("pack"), 0);
        assert!(!harness.root().join("out.bin").exists());
        assert_eq!(recorded.lock().unwrap().closes, 1);
    }

    #[tokio::test]
    async fn test_zero_targets_succeed() {
        let harness = Harness::new();
        let runner = harness.runner(&[], None);

        let (report, _) = harness
            .run(r#"{"Title": "empty", "GitRepo": "https://example/x.git"}"#, &runner)
            .await;

        assert!(report.success());
        assert!(report.targets.is_empty());
        assert_eq!(report.reached, RunState::SourceFetched);
        assert_eq!(runner.count_program("git"), 1);
        assert_eq!(runner.count_program("docker"), 0);
    }

    #[tokio::test]
    async fn test_failed_target_stops_later_targets() {
        let harness = Harness::new();
        let runner = harness.runner(&["a", "b", "c"], Some("b2"));

        let (report, _) = harness.run(THREE_TARGETS, &runner).await;

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.reached, RunState::TargetRunning(1));

        let statuses: Vec<_> = report.targets.iter().map(|t| t.status.clone()).collect();
        assert_eq!(
            statuses,
            [
                TargetStatus::Succeeded,
                TargetStatus::PhaseFailed(Phase::Build),
                TargetStatus::Skipped,
            ]
        );

        // Target three is never driven; target two never reaches post
        assert_eq!(runner.count_ending_with("p3"), 0);
        assert_eq!(runner.count_ending_with("q2"), 0);
        assert_eq!(runner.count_ending_with("q1"), 1);
        assert_eq!(runner.count_program("docker"), 5);
    }

    #[tokio::test]
    async fn test_artifact_copy_failure_keeps_success() {
        let harness = Harness::new();
        // No `pack` step writes the artifact
        let runner = harness.runner(&["a", "b", "c"], None);
        let document = THREE_TARGETS.replace(
            r#""PostCmd": ["q2"]"#,
            r#""PostCmd": ["q2"], "RstFile": "missing.bin""#,
        );

        let (report, recorded) = harness.run(&document, &runner).await;

        assert_eq!(report.exit_code(), 0);
        assert!(matches!(report.targets[1].artifact, ArtifactStatus::ExportFailed(_)));

        let recorded = recorded.lock().unwrap();
        let warnings = recorded.messages_at(LogLevel::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing.bin"));
    }

    #[tokio::test]
    async fn test_workspace_failure_runs_no_process() {
        let harness = Harness::new();
        std::fs::write(harness.root().join("build"), "in the way").unwrap();
        let runner = harness.runner(&["a"], None);

        let (report, recorded) = harness.run(SCENARIO, &runner).await;

        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.reached, RunState::Init);
        assert!(runner.calls().is_empty());
        assert_eq!(report.targets[0].status, TargetStatus::Skipped);

        let recorded = recorded.lock().unwrap();
        assert!(recorded.contains("Fail Create Directory"));
        assert_eq!(recorded.closes, 1);
    }

    #[tokio::test]
    async fn test_clone_failure_runs_no_container() {
        let harness = Harness::new();
        let runner = ScriptedRunner::new(|spec| {
            if spec.program == "git" {
                Ok(exit_with(128, "fatal: could not read from remote repository"))
            } else {
                Ok(exit_with(0, ""))
            }
        });

        let (report, recorded) = harness.run(THREE_TARGETS, &runner).await;

        assert!(!report.success());
        assert_eq!(report.reached, RunState::Prepared);
        assert_eq!(runner.count_program("docker"), 0);
        assert!(report.targets.iter().all(|t| t.status == TargetStatus::Skipped));
        assert!(recorded.lock().unwrap().contains("could not read from remote repository"));
    }

    #[tokio::test]
    async fn test_log_timestamps_monotonic_and_prefixed() {
        let harness = Harness::new();
        let runner = harness.runner(&["a", "b", "c"], None);

        let (_, recorded) = harness.run(THREE_TARGETS, &runner).await;

        let recorded = recorded.lock().unwrap();
        assert!(recorded.entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(recorded.lines.iter().all(|l| l.starts_with(">>>> three : ")));
        assert!(recorded.entries[0].message.starts_with("AutoBuild Start"));
        assert!(recorded.entries.last().unwrap().message.starts_with("Build End"));
    }

    #[tokio::test]
    async fn test_log_file_written_and_closed() {
        let harness = Harness::new();
        let runner = harness.runner(&["a"], Some("init"));
        let job = parse_job_spec(SCENARIO).unwrap();
        let mut ctx = RunContext::new(harness.root(), &job, &harness.config);
        let mut log = AuditLog::open(&ctx).unwrap();

        let report = BuildOrchestrator::new(&harness.config, &runner)
            .run(&job, &mut ctx, &mut log)
            .await;

        assert!(!report.success());

        // The log is already closed; later records never reach the file
        log.info("after close");

        let content = std::fs::read_to_string(harness.root().join("scenario.log")).unwrap();
        assert!(content.contains("Fail Build [pre]"));
        assert!(!content.contains("after close"));
        assert!(content.trim_end().lines().last().unwrap().contains("Build End"));
    }
}
