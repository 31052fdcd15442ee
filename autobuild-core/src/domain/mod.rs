//! Core domain types
//!
//! This module contains the domain structures shared by the loader and the runner.
//! The job specification is immutable once loaded; run reports are produced by the
//! runner at the end of a build.

pub mod job;
pub mod log;
pub mod run;
