//! Log domain types

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Timestamp layout of audit log lines (e.g. `2015/11/16 16:26:46`)
pub const LINE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Timestamp layout of the run start/end markers (e.g. `2015-11-16T16:26:46`)
pub const MARK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A single audit log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEntry {
    /// Renders the entry as one log line behind the given run prefix
    ///
    /// Multi-line messages (captured process output) are kept verbatim after
    /// the header so they stay readable in the file.
    pub fn render(&self, prefix: &str) -> String {
        format!(
            "{}{} {:<5} {}",
            prefix,
            self.timestamp.format(LINE_TIME_FORMAT),
            self.level,
            self.message.trim_end()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Padding flags only apply through `pad`
        f.pad(match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        })
    }
}
