//! Terminal backend abstraction.
//!
//! The [`PaneBackend`] trait decouples the bridge loop and dispatcher from
//! the keystroke-injection mechanics of each multiplexer. The destination
//! pane is bound at construction; the loop never branches on the variant.

pub mod tmux;
pub mod wezterm;

use crate::config::{BackendKind, BridgeConfig};
use crate::Result;

/// Delivers text to an addressed terminal destination.
///
/// Implementations must be [`Send`] and [`Sync`] so the dispatcher can be
/// shared across task boundaries.
pub trait PaneBackend: Send + Sync {
    /// Deliver `text` to the bound pane, followed by a key press that
    /// submits it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Backend`](crate::AppError::Backend) if the
    /// multiplexer CLI cannot be spawned or exits non-zero.
    fn send_text(&self, text: &str) -> Result<()>;

    /// Human-readable description of the bound destination, for logs.
    fn describe(&self) -> String;
}

/// Select the backend implementation for the configured variant.
#[must_use]
pub fn select(config: &BridgeConfig) -> Box<dyn PaneBackend> {
    match config.backend {
        BackendKind::Tmux => Box::new(tmux::TmuxBackend::new(config.destination.clone())),
        BackendKind::Wezterm => Box::new(wezterm::WeztermBackend::new(config.destination.clone())),
    }
}

/// Run a multiplexer CLI invocation and map failures to a backend error.
pub(crate) fn run_cli(program: &str, args: &[&str]) -> Result<()> {
    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|err| crate::AppError::Backend(format!("failed to spawn {program}: {err}")))?;

    if output.status.success() {
        Ok(())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(crate::AppError::Backend(format!(
            "{program} exited with {}: {}",
            output.status,
            stderr.trim()
        )))
    }
}
