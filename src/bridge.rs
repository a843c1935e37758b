//! Bridge loop and failure controller.
//!
//! The long-running control loop: poll the channel, dispatch requests, and
//! isolate transient failures behind a bounded exponential backoff. "No work
//! available" takes the fast idle-sleep path and leaves the backoff alone;
//! only a failed iteration grows it. Shutdown is cooperative — the
//! cancellation token is read once at the top of each iteration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::backend::{self, PaneBackend};
use crate::channel::ChannelReader;
use crate::config::BridgeConfig;
use crate::dispatch::Dispatcher;
use crate::history::HistoryLog;
use crate::oplog::BridgeLog;
use crate::{AppError, Result};

/// Bounded exponential error backoff.
///
/// Invariant: `min <= current <= max` (with `min` clamped down to `max` at
/// construction when misordered). A zero `max` disables growth and sleeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    /// Construct a backoff starting at its minimum.
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.min(max);
        Self {
            current: min,
            min,
            max,
        }
    }

    /// The pause to take before the next retry.
    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Reset to the minimum after a successful dispatch.
    pub fn reset(&mut self) {
        self.current = self.min;
    }

    /// Double the pause, clamped to the configured bounds.
    pub fn grow(&mut self) {
        if self.max.is_zero() {
            return;
        }
        self.current = self.current.saturating_mul(2).clamp(self.min, self.max);
    }
}

/// The bridge: channel reader, dispatcher, and failure controller.
pub struct Bridge {
    reader: ChannelReader,
    dispatcher: Dispatcher,
    oplog: BridgeLog,
    idle_sleep: Duration,
    backoff: Backoff,
    cancel: CancellationToken,
    session_id: String,
    destination: String,
}

impl Bridge {
    /// Build a bridge with the backend selected from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the history directory cannot be created.
    pub fn from_config(
        runtime_dir: &Path,
        session_id: &str,
        config: &BridgeConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let pane = backend::select(config);
        Self::assemble(runtime_dir, session_id, pane, config, cancel)
    }

    /// Build a bridge around a pre-constructed backend.
    ///
    /// Provisions `<runtime_dir>/history/` (with parents) — the only
    /// filesystem setup the bridge performs. The channel is expected at
    /// `<runtime_dir>/input.fifo`, history at `history/session.jsonl`, and
    /// the operational trace at `bridge.log`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Io`] if the history directory cannot be created.
    pub fn assemble(
        runtime_dir: &Path,
        session_id: &str,
        pane: Box<dyn PaneBackend>,
        config: &BridgeConfig,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let history_dir = runtime_dir.join("history");
        fs::create_dir_all(&history_dir).map_err(|err| {
            AppError::Io(format!(
                "failed to create {}: {err}",
                history_dir.display()
            ))
        })?;

        let history = HistoryLog::new(history_dir.join("session.jsonl"));
        let oplog = BridgeLog::new(runtime_dir.join("bridge.log"));
        let reader = ChannelReader::new(runtime_dir.join("input.fifo"));
        let destination = pane.describe();
        let dispatcher = Dispatcher::new(pane, history, oplog.clone());

        Ok(Self {
            reader,
            dispatcher,
            oplog,
            idle_sleep: config.idle_sleep,
            backoff: Backoff::new(config.backoff_min, config.backoff_max),
            cancel,
            session_id: session_id.to_owned(),
            destination,
        })
    }

    /// Run the loop until the cancellation token fires.
    ///
    /// Every iteration is bounded: the only suspension points are the idle
    /// sleep and the error-backoff sleep. Requests are processed strictly
    /// in channel order.
    pub async fn run(&mut self) {
        info!(
            session_id = %self.session_id,
            destination = %self.destination,
            "bridge started, waiting for commands"
        );
        if let Err(err) = self.oplog.append("bridge started") {
            error!(%err, "failed to write bridge log");
        }

        while !self.cancel.is_cancelled() {
            match self.reader.poll() {
                Ok(Some(request)) => {
                    self.dispatcher.dispatch(request);
                    self.backoff.reset();
                }
                Ok(None) => {
                    if !self.idle_sleep.is_zero() {
                        sleep(self.idle_sleep).await;
                    }
                }
                Err(err) => {
                    error!(%err, "failed to process message");
                    if let Err(log_err) = self.oplog.append(&format!("error: {err}")) {
                        error!(%log_err, "failed to write bridge log");
                    }
                    let pause = self.backoff.current();
                    if !pause.is_zero() {
                        sleep(pause).await;
                    }
                    self.backoff.grow();
                }
            }
        }

        if let Err(err) = self.oplog.append("bridge stopped") {
            error!(%err, "failed to write bridge log");
        }
        info!(session_id = %self.session_id, "bridge exited");
    }
}
