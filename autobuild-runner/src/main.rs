//! Autobuild Runner
//!
//! A one-shot build runner that builds a source tree inside containers,
//! driven by a JSON job document, and records a timestamped audit log.
//!
//! Architecture:
//! - Configuration: tool and layout settings from environment or defaults
//! - Context: paths and timestamps of the current run
//! - Audit: dual-sink (file + console) audit log
//! - Services: workspace preparation, source fetch, target driving
//! - Orchestrator: sequences the services and aggregates the verdict
//!
//! The process exits 0 only when the source was fetched and every target
//! completed all of its phases.

mod audit;
mod config;
mod container;
mod context;
mod error;
mod orchestrator;
mod process;
mod service;

use anyhow::{Context, Result};
use autobuild_core::domain::run::RunReport;
use autobuild_core::{JobSpec, load_job_spec, parse_job_spec};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::audit::AuditLog;
use crate::config::Config;
use crate::context::RunContext;
use crate::orchestrator::BuildOrchestrator;
use crate::process::SystemProcessRunner;

/// Exit code for a malformed job document or invalid configuration
const EXIT_INVALID_INPUT: u8 = 2;

#[derive(Parser)]
#[command(name = "autobuild")]
#[command(about = "Build a source tree in containers from a JSON job document", long_about = None)]
struct Cli {
    /// JSON job document (a path to one with --job-file)
    job: String,

    /// Read the job document from the file named by JOB
    #[arg(long)]
    job_file: bool,

    /// Directory anchoring the run (defaults to the current directory)
    #[arg(long, env = "AUTOBUILD_ROOT")]
    root: Option<PathBuf>,

    /// Also write the run report as JSON to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries the audit log mirror
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "autobuild=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("autobuild: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let job = match load_job(&cli) {
        Ok(job) => job,
        Err(e) => {
            eprintln!("autobuild: {}", e);
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("autobuild: invalid configuration: {:#}", e);
            return Ok(ExitCode::from(EXIT_INVALID_INPUT));
        }
    };

    let run_root = resolve_run_root(cli.root.as_deref())?;
    let mut ctx = RunContext::new(&run_root, &job, &config);
    info!("Run {} rooted at {:?}", ctx.run_id, ctx.run_root);

    let mut log = AuditLog::open(&ctx)
        .with_context(|| format!("Failed to open log file {:?}", ctx.log_file))?;

    let runner = SystemProcessRunner;
    let report = BuildOrchestrator::new(&config, &runner)
        .run(&job, &mut ctx, &mut log)
        .await;

    if let Some(path) = &cli.report {
        write_report(&report, path)?;
    }

    Ok(if report.success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn load_job(cli: &Cli) -> autobuild_core::error::Result<JobSpec> {
    if cli.job_file {
        load_job_spec(Path::new(&cli.job))
    } else {
        parse_job_spec(&cli.job)
    }
}

/// Loads configuration from the environment and validates it
fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}

/// Absolute, existing run root
fn resolve_run_root(root: Option<&Path>) -> Result<PathBuf> {
    let root = match root {
        Some(root) => root.to_path_buf(),
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };

    root.canonicalize()
        .with_context(|| format!("Run root {:?} is not accessible", root))
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write run report {:?}", path))
}
