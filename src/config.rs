//! Environment-driven bridge configuration with parse-or-default leniency.

use std::env;
use std::time::Duration;

use crate::{AppError, Result};

/// Default idle sleep between empty channel polls.
const DEFAULT_IDLE_SLEEP_MS: u64 = 50;
/// Default minimum error backoff.
const DEFAULT_BACKOFF_MIN_MS: u64 = 50;
/// Default maximum error backoff.
const DEFAULT_BACKOFF_MAX_MS: u64 = 200;

/// Terminal multiplexer variant the bridge injects keystrokes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// tmux `send-keys` delivery.
    Tmux,
    /// WezTerm `cli send-text` delivery.
    Wezterm,
}

/// Bridge configuration resolved once at startup.
///
/// Numeric tunables use parse-or-default semantics: an unset or unparseable
/// override silently falls back to the default. This leniency is deliberate —
/// a malformed tunable must never keep the bridge from starting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Selected multiplexer variant.
    pub backend: BackendKind,
    /// Destination pane or session identifier for the selected backend.
    pub destination: String,
    /// Sleep between polls when the channel has nothing available.
    pub idle_sleep: Duration,
    /// Error backoff lower bound (also the post-success reset value).
    pub backoff_min: Duration,
    /// Error backoff upper bound; zero disables backoff sleeps entirely.
    pub backoff_max: Duration,
}

impl BridgeConfig {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] when no destination identifier can be
    /// resolved for the selected backend. This is the only fatal
    /// configuration condition; all tunables fall back to defaults.
    pub fn from_env() -> Result<Self> {
        let backend = match env::var("PANE_RELAY_BACKEND").as_deref() {
            Ok("wezterm") => BackendKind::Wezterm,
            _ => BackendKind::Tmux,
        };

        let destination = match backend {
            BackendKind::Wezterm => resolve_wezterm_pane()?,
            BackendKind::Tmux => resolve_tmux_target()?,
        };

        Ok(Self {
            backend,
            destination,
            idle_sleep: env_duration_ms("PANE_RELAY_IDLE_SLEEP_MS", DEFAULT_IDLE_SLEEP_MS),
            backoff_min: env_duration_ms("PANE_RELAY_BACKOFF_MIN_MS", DEFAULT_BACKOFF_MIN_MS),
            backoff_max: env_duration_ms("PANE_RELAY_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
        })
    }
}

/// Resolve the WezTerm pane id from `PANE_RELAY_WEZTERM_PANE`.
fn resolve_wezterm_pane() -> Result<String> {
    let pane = env::var("PANE_RELAY_WEZTERM_PANE")
        .unwrap_or_default()
        .trim()
        .to_owned();
    if pane.is_empty() {
        return Err(AppError::Config(
            "missing PANE_RELAY_WEZTERM_PANE environment variable".into(),
        ));
    }
    Ok(pane)
}

/// Resolve the tmux destination from `PANE_RELAY_TMUX_TARGET`.
///
/// When both the configured target and the ambient `TMUX_PANE` are pane ids
/// (`%`-prefixed) and differ, the ambient pane id wins. The launcher may
/// switch focus right after creating the pane, and the pane-local id does not
/// race with that.
fn resolve_tmux_target() -> Result<String> {
    let mut target = env::var("PANE_RELAY_TMUX_TARGET")
        .unwrap_or_default()
        .trim()
        .to_owned();
    let ambient_pane = env::var("TMUX_PANE").unwrap_or_default().trim().to_owned();

    if target.starts_with('%') && ambient_pane.starts_with('%') && ambient_pane != target {
        target = ambient_pane;
    } else if target.is_empty() && ambient_pane.starts_with('%') {
        target = ambient_pane;
    }

    if target.is_empty() {
        return Err(AppError::Config(
            "missing PANE_RELAY_TMUX_TARGET environment variable".into(),
        ));
    }
    Ok(target)
}

/// Read a millisecond duration from the environment, falling back to
/// `default_ms` when the variable is unset or unparseable.
fn env_duration_ms(name: &str, default_ms: u64) -> Duration {
    let ms = env::var(name)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .unwrap_or(default_ms);
    Duration::from_millis(ms)
}
