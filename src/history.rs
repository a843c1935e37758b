//! Append-only JSONL history log.
//!
//! Every request/response exchange is recorded as one compact JSON object
//! per line. Entries are immutable once written; the file grows without
//! bound and readers must not assume any line length limit.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::models::HistoryEntry;
use crate::{AppError, Result};

/// Appends [`HistoryEntry`] records to a JSONL file.
///
/// The log is best-effort durable: each append opens the file in append
/// mode, writes a single line, and flushes on close. Callers report
/// failures to the console and carry on — history is never a fatal
/// dependency of the bridge's primary function.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    /// Create a logger writing to `path`.
    ///
    /// The containing directory is provisioned by the bridge at
    /// construction time, not here.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one entry as a compact JSON line.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::History`] if serialization or the write fails.
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|err| AppError::History(format!("failed to serialize entry: {err}")))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                AppError::History(format!("failed to open {}: {err}", self.path.display()))
            })?;
        writeln!(file, "{line}")
            .map_err(|err| AppError::History(format!("failed to append history: {err}")))?;
        file.flush()
            .map_err(|err| AppError::History(format!("failed to flush history: {err}")))
    }
}
