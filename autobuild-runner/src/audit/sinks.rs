//! Audit log sinks
//!
//! Every rendered audit line is handed to each registered sink in order.
//! The file sink is the durable record consumed after the run; the console
//! sink mirrors it live.

use autobuild_core::domain::log::{LogEntry, LogLevel};
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Destination for audit lines
pub trait LogSink: Send {
    /// Writes one rendered line
    ///
    /// # Arguments
    /// * `entry` - The record the line was rendered from
    /// * `line` - The rendered line, without trailing newline
    fn write(&mut self, entry: &LogEntry, line: &str) -> io::Result<()>;

    /// Flushes and releases the destination
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Short name used in diagnostics
    fn name(&self) -> &str;
}

/// Appends lines to the audit log file
pub struct FileSink {
    writer: Option<BufWriter<File>>,
}

impl FileSink {
    /// Opens (creating if needed) the file in append mode
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o666);
        }

        let file = options.open(path)?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
        })
    }
}

impl LogSink for FileSink {
    fn write(&mut self, _entry: &LogEntry, line: &str) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => {
                writeln!(writer, "{}", line)?;
                // Records must survive a run that is killed while a step hangs
                writer.flush()
            }
            None => Err(io::Error::other("audit log file already closed")),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "file"
    }
}

/// Mirrors lines to standard output, colored by level
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl LogSink for ConsoleSink {
    fn write(&mut self, entry: &LogEntry, line: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        match entry.level {
            LogLevel::Debug => writeln!(stdout, "{}", line.dimmed()),
            LogLevel::Info => writeln!(stdout, "{}", line),
            LogLevel::Warning => writeln!(stdout, "{}", line.yellow()),
            LogLevel::Error => writeln!(stdout, "{}", line.red()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }

    fn name(&self) -> &str {
        "console"
    }
}
