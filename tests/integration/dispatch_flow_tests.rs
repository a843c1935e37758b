//! Dispatcher flows: request in, pane send plus history/bridge-log records out.

use std::fs;
use std::path::Path;

use pane_relay::dispatch::Dispatcher;
use pane_relay::history::HistoryLog;
use pane_relay::models::{HistoryEntry, HistoryRole, Request};
use pane_relay::oplog::BridgeLog;

use super::test_helpers::{FailingBackend, RecordingBackend};

fn read_history(dir: &Path) -> Vec<HistoryEntry> {
    let raw = fs::read_to_string(dir.join("session.jsonl")).expect("read history");
    raw.lines()
        .map(|line| serde_json::from_str(line).expect("history line parses"))
        .collect()
}

fn dispatcher_with(
    dir: &Path,
    backend: Box<dyn pane_relay::backend::PaneBackend>,
) -> Dispatcher {
    Dispatcher::new(
        backend,
        HistoryLog::new(dir.join("session.jsonl")),
        BridgeLog::new(dir.join("bridge.log")),
    )
}

/// A multiline request reaches the pane normalized while history keeps the
/// raw content, and a successful send leaves no target-role entry.
#[test]
fn successful_send_records_sender_entry_only() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, sent) = RecordingBackend::pair();
    let dispatcher = dispatcher_with(temp.path(), Box::new(backend));

    dispatcher.dispatch(Request {
        content: "hello\nworld".into(),
        marker: Some("m1".into()),
    });

    assert_eq!(*sent.lock().expect("lock"), vec!["hello world".to_owned()]);

    let entries = read_history(temp.path());
    assert_eq!(entries.len(), 1, "no target entry on success");
    assert_eq!(entries[0].role, HistoryRole::Sender);
    assert_eq!(entries[0].marker, "m1", "explicit marker preserved");
    assert_eq!(entries[0].content, "hello\nworld", "raw content preserved");
}

/// A backend failure is swallowed: the sender entry is followed by a
/// target-role failure entry sharing the same marker.
#[test]
fn backend_failure_records_synthetic_target_reply() {
    let temp = tempfile::tempdir().expect("tempdir");
    let dispatcher = dispatcher_with(temp.path(), Box::new(FailingBackend));

    dispatcher.dispatch(Request {
        content: "do it".into(),
        marker: Some("m9".into()),
    });

    let entries = read_history(temp.path());
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].role, HistoryRole::Sender);
    assert_eq!(entries[1].role, HistoryRole::Target);
    assert_eq!(entries[1].marker, "m9", "failure entry shares the marker");
    assert!(
        entries[1].content.starts_with("failed to send"),
        "failure indicator expected, got: {}",
        entries[1].content
    );
}

/// Whitespace-only content is logged but never forwarded to the backend.
#[test]
fn empty_normalized_command_skips_backend() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, sent) = RecordingBackend::pair();
    let dispatcher = dispatcher_with(temp.path(), Box::new(backend));

    dispatcher.dispatch(Request {
        content: "\r\n  \n".into(),
        marker: Some("m2".into()),
    });

    assert!(sent.lock().expect("lock").is_empty(), "no-op send expected");
    let entries = read_history(temp.path());
    assert_eq!(entries.len(), 1, "sender entry is still recorded");
}

#[test]
fn missing_marker_is_generated_for_history() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, _sent) = RecordingBackend::pair();
    let dispatcher = dispatcher_with(temp.path(), Box::new(backend));

    dispatcher.dispatch(Request {
        content: "no marker here".into(),
        marker: None,
    });

    let entries = read_history(temp.path());
    assert_eq!(entries.len(), 1);
    assert!(
        entries[0].marker.starts_with("ask-"),
        "generated marker expected, got: {}",
        entries[0].marker
    );
}

/// Each dispatch echoes a structured trace line into the bridge log.
#[test]
fn dispatch_echoes_trace_into_bridge_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, _sent) = RecordingBackend::pair();
    let dispatcher = dispatcher_with(temp.path(), Box::new(backend));

    dispatcher.dispatch(Request {
        content: "trace me".into(),
        marker: Some("m5".into()),
    });

    let raw = fs::read_to_string(temp.path().join("bridge.log")).expect("read bridge log");
    let line = raw.lines().next().expect("one trace line");
    assert!(line.contains("\"marker\":\"m5\""), "got: {line}");
    assert!(line.contains("\"question\":\"trace me\""), "got: {line}");
}
