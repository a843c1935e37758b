//! Wire and history record types for the bridge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single inbound command read from the channel.
///
/// Ephemeral — exists only for the loop iteration that dispatches it.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Request {
    /// Free-form command text destined for the pane.
    pub content: String,
    /// Optional correlation token; generated by the dispatcher when absent.
    #[serde(default)]
    pub marker: Option<String>,
}

/// Which side of the exchange a history entry records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HistoryRole {
    /// The external producer that wrote the request into the channel.
    Sender,
    /// The program running in the destination pane.
    Target,
}

/// One immutable line of the append-only history log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Event time, serialized as RFC 3339 with timezone.
    pub timestamp: DateTime<Utc>,
    /// Exchange side this entry records.
    pub role: HistoryRole,
    /// Correlation token tying request and reply entries together.
    pub marker: String,
    /// Raw (un-normalized) message text.
    pub content: String,
}

impl HistoryEntry {
    /// Construct an entry stamped with the current time.
    #[must_use]
    pub fn new(role: HistoryRole, marker: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            marker: marker.into(),
            content: content.into(),
        }
    }
}
