//! Append-only operational bridge log.
//!
//! Free-form trace distinct from the history file: loop start/stop, errors,
//! and a per-request echo. One `"<timestamp> <message>"` line per event,
//! local time, never rewritten.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;

use crate::{AppError, Result};

/// Appends timestamped trace lines to the bridge log file.
#[derive(Debug, Clone)]
pub struct BridgeLog {
    path: PathBuf,
}

impl BridgeLog {
    /// Create a logger writing to `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one trace line, prefixed with the local timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::History`] if the write fails. Callers treat this
    /// as best-effort.
    pub fn append(&self, message: &str) -> Result<()> {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                AppError::History(format!("failed to open {}: {err}", self.path.display()))
            })?;
        writeln!(file, "{stamp} {message}")
            .map_err(|err| AppError::History(format!("failed to append bridge log: {err}")))
    }
}
