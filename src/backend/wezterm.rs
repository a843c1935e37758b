//! WezTerm keystroke injection via `wezterm cli send-text`.

use super::{run_cli, PaneBackend};
use crate::Result;

/// Sends text to a WezTerm pane by id.
pub struct WeztermBackend {
    pane_id: String,
}

impl WeztermBackend {
    /// Bind a backend to a WezTerm pane id.
    #[must_use]
    pub fn new(pane_id: String) -> Self {
        Self { pane_id }
    }
}

impl PaneBackend for WeztermBackend {
    fn send_text(&self, text: &str) -> Result<()> {
        run_cli(
            "wezterm",
            &[
                "cli",
                "send-text",
                "--pane-id",
                &self.pane_id,
                "--no-paste",
                text,
            ],
        )?;
        // Carriage return submits the line in the target program.
        run_cli(
            "wezterm",
            &["cli", "send-text", "--pane-id", &self.pane_id, "--no-paste", "\r"],
        )
    }

    fn describe(&self) -> String {
        format!("wezterm pane {}", self.pane_id)
    }
}
