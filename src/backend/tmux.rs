//! tmux keystroke injection via `send-keys`.

use super::{run_cli, PaneBackend};
use crate::Result;

/// Sends text to a tmux pane or session target.
pub struct TmuxBackend {
    target: String,
}

impl TmuxBackend {
    /// Bind a backend to a tmux target (`%pane`, `session:window.pane`, …).
    #[must_use]
    pub fn new(target: String) -> Self {
        Self { target }
    }
}

impl PaneBackend for TmuxBackend {
    fn send_text(&self, text: &str) -> Result<()> {
        // Literal mode first so the text is not interpreted as key names,
        // then a separate Enter press to submit.
        run_cli("tmux", &["send-keys", "-l", "-t", &self.target, "--", text])?;
        run_cli("tmux", &["send-keys", "-t", &self.target, "Enter"])
    }

    fn describe(&self) -> String {
        format!("tmux target {}", self.target)
    }
}
