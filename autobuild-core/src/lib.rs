//! Autobuild Core
//!
//! Core types and abstractions for the Autobuild container build runner.
//!
//! This crate contains:
//! - Domain types: job specification, targets, phases, audit log entries and run reports
//! - Loader: parsing of the externally supplied job document
//! - Errors: typed failures of the loader

pub mod domain;
pub mod error;
pub mod loader;

pub use domain::job::{JobSpec, Phase, Target};
pub use error::JobSpecError;
pub use loader::{load_job_spec, parse_job_spec};
