//! Audit log
//!
//! The timestamped record of every orchestration step of a run. One logging
//! interface fans each record out to all registered sinks (the log file and
//! the console). Opened once per run and closed exactly once at the end,
//! whatever the outcome.

mod sinks;

pub use sinks::{ConsoleSink, FileSink, LogSink};

#[cfg(test)]
pub use sinks::testing;

use autobuild_core::domain::log::{LogEntry, LogLevel};
use chrono::{DateTime, Local};
use std::io;
use tracing::{debug, warn};

use crate::context::RunContext;

pub struct AuditLog {
    prompt: String,
    sinks: Vec<Box<dyn LogSink>>,
    last_timestamp: Option<DateTime<Local>>,
    closed: bool,
}

impl AuditLog {
    /// Creates an audit log without sinks
    ///
    /// # Arguments
    /// * `prompt` - Prefix written at the start of every line
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            sinks: Vec::new(),
            last_timestamp: None,
            closed: false,
        }
    }

    /// Opens the standard pair of sinks for a run: the log file and the console
    pub fn open(ctx: &RunContext) -> io::Result<Self> {
        let file = FileSink::open(&ctx.log_file)?;

        Ok(Self::new(ctx.prompt.clone())
            .with_sink(file)
            .with_sink(ConsoleSink))
    }

    /// Registers another sink
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Writes a record to every sink
    ///
    /// Timestamps never go backwards within one log, even if the wall clock does.
    pub fn record(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();

        if self.closed {
            debug!("Audit log closed, dropping record: {}", message);
            return;
        }

        let now = Local::now();
        let timestamp = match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last_timestamp = Some(timestamp);

        let entry = LogEntry {
            timestamp,
            level,
            message,
        };
        let line = entry.render(&self.prompt);

        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.write(&entry, &line) {
                warn!("Failed to write audit record to {} sink: {}", sink.name(), e);
            }
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(LogLevel::Error, message);
    }

    /// Records captured process output framed by start/end markers
    ///
    /// # Arguments
    /// * `label` - Marker label, e.g. "Clone" gives "Clone Log Start" / "Clone Log End"
    /// * `output` - Captured output; nothing is written when empty
    pub fn output(&mut self, label: &str, output: &str) {
        if output.trim().is_empty() {
            return;
        }

        self.info(format!("{} Log Start\n{}", label, output.trim_end()));
        self.info(format!("{} Log End", label));
    }

    /// Flushes and closes every sink
    ///
    /// Only the first call has an effect; later records are dropped.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for sink in self.sinks.iter_mut() {
            if let Err(e) = sink.close() {
                warn!("Failed to close {} audit sink: {}", sink.name(), e);
            }
        }
    }
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        self.close();
    }
}
