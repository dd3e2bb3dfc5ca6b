//! Timestamped, human-readable processing log.

use crate::report::ReportEntry;
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Default processing log file name, created under the content root
pub const DEFAULT_LOG_FILE: &str = "processing.log";

const RULE: &str = "────────────────────────────────────────────";

/// Renders messages as `[YYYY-MM-DD HH:MM:SS]  message` lines
pub struct LogFile<W: Write = BufWriter<File>> {
    out: W,
}

impl LogFile {
    /// Creates or truncates the log file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be opened for writing.
    pub fn create(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> LogFile<W> {
    pub fn from_writer(out: W) -> Self {
        Self { out }
    }

    /// Writes one timestamped line
    pub fn message(&mut self, msg: &str) -> io::Result<()> {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.out, "[{now}]  {msg}")
    }

    /// Writes a banner between two rules
    pub fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{RULE}\n{title}\n{RULE}")
    }

    /// Writes each entry on its own line, in order
    pub fn entries<'a>(
        &mut self,
        entries: impl IntoIterator<Item = &'a ReportEntry>,
    ) -> io::Result<()> {
        for entry in entries {
            self.message(&entry.to_string())?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
