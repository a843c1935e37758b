//! Request dispatcher: raw request in, pane keystrokes and log entries out.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{Local, Utc};
use tracing::{error, warn};

use crate::backend::PaneBackend;
use crate::history::HistoryLog;
use crate::models::{HistoryEntry, HistoryRole, Request};
use crate::oplog::BridgeLog;

/// Seconds component of the most recently issued marker.
///
/// Markers are derived from wall-clock seconds plus the process id; bumping
/// past the last issued value keeps them unique within a process run even
/// when two requests land in the same second.
static LAST_MARKER_SECS: AtomicI64 = AtomicI64::new(0);

/// Turns one inbound request into a normalized pane command plus history
/// and bridge-log records.
///
/// Dispatch never fails outward: backend errors are converted into a
/// recorded synthetic reply and a console message, and log write failures
/// are reported to the console only.
pub struct Dispatcher {
    backend: Box<dyn PaneBackend>,
    history: HistoryLog,
    oplog: BridgeLog,
}

impl Dispatcher {
    /// Assemble a dispatcher from its collaborators.
    #[must_use]
    pub fn new(backend: Box<dyn PaneBackend>, history: HistoryLog, oplog: BridgeLog) -> Self {
        Self {
            backend,
            history,
            oplog,
        }
    }

    /// Process one request end to end.
    ///
    /// Records the sender entry, normalizes the command text, and forwards
    /// it to the backend. An empty normalized command is a no-op send. A
    /// backend failure is recorded as a target-role history entry sharing
    /// the request marker.
    pub fn dispatch(&self, request: Request) {
        let marker = request
            .marker
            .filter(|m| !m.is_empty())
            .unwrap_or_else(next_marker);

        let trace = serde_json::json!({
            "marker": marker,
            "question": request.content,
            "time": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        });
        if let Err(err) = self.oplog.append(&trace.to_string()) {
            warn!(%err, "failed to write bridge log");
        }

        self.record(HistoryRole::Sender, &marker, &request.content);

        let command = normalize(&request.content);
        if command.is_empty() {
            return;
        }

        if let Err(err) = self.backend.send_text(&command) {
            let message = format!("failed to send to pane: {err}");
            self.record(HistoryRole::Target, &marker, &message);
            error!(%marker, "{message}");
        }
    }

    /// Append a history entry, reporting failure to the console only.
    fn record(&self, role: HistoryRole, marker: &str, content: &str) {
        if let Err(err) = self.history.append(&HistoryEntry::new(role, marker, content)) {
            warn!(%err, "failed to write history");
        }
    }
}

/// Collapse carriage returns and newlines to single spaces and trim.
///
/// Normalizing an already single-line, trimmed string is a no-op.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.replace(['\r', '\n'], " ").trim().to_owned()
}

/// Generate a correlation marker of the form `ask-<unix-seconds>-<pid>`.
///
/// The seconds component is bumped past the previously issued value when
/// the clock has not advanced, so markers never repeat within one process.
#[must_use]
pub fn next_marker() -> String {
    let now = Utc::now().timestamp();
    let mut issued = now;
    let _ = LAST_MARKER_SECS.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
        issued = if now > last { now } else { last + 1 };
        Some(issued)
    });
    format!("ask-{issued}-{}", std::process::id())
}
