//! End-to-end bridge loop tests over a file-backed channel.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use pane_relay::bridge::Bridge;
use pane_relay::config::{BackendKind, BridgeConfig};

use super::test_helpers::RecordingBackend;

fn fast_config() -> BridgeConfig {
    BridgeConfig {
        backend: BackendKind::Tmux,
        destination: "test:0".into(),
        idle_sleep: Duration::from_millis(5),
        backoff_min: Duration::from_millis(5),
        backoff_max: Duration::from_millis(20),
    }
}

fn queue_request(runtime_dir: &Path, json: &str) {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(runtime_dir.join("input.fifo"))
        .expect("open channel file");
    writeln!(file, "{json}").expect("queue request");
}

/// Requests are dispatched strictly in channel order, then the loop stops
/// on cancellation.
#[tokio::test]
async fn processes_requests_in_channel_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    queue_request(temp.path(), r#"{"content":"first"}"#);
    queue_request(temp.path(), r#"{"content":"second"}"#);
    queue_request(temp.path(), r#"{"content":"third"}"#);

    let (backend, sent) = RecordingBackend::pair();
    let cancel = CancellationToken::new();
    let mut bridge = Bridge::assemble(
        temp.path(),
        "sess-1",
        Box::new(backend),
        &fast_config(),
        cancel.clone(),
    )
    .expect("bridge assembles");

    let handle = tokio::spawn(async move { bridge.run().await });

    // Wait for all three dispatches, bounded.
    for _ in 0..100 {
        if sent.lock().expect("lock").len() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("loop must stop after cancellation")
        .expect("loop task must not panic");

    assert_eq!(
        *sent.lock().expect("lock"),
        vec!["first".to_owned(), "second".to_owned(), "third".to_owned()]
    );
}

/// Cancellation while the loop is idle-sleeping exits after the current
/// sleep, with no dispatches.
#[tokio::test]
async fn shutdown_during_idle_sleep_exits_promptly() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, sent) = RecordingBackend::pair();
    let cancel = CancellationToken::new();
    let mut bridge = Bridge::assemble(
        temp.path(),
        "sess-2",
        Box::new(backend),
        &fast_config(),
        cancel.clone(),
    )
    .expect("bridge assembles");

    let handle = tokio::spawn(async move { bridge.run().await });
    tokio::time::sleep(Duration::from_millis(30)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("idle loop must observe cancellation")
        .expect("loop task must not panic");

    assert!(sent.lock().expect("lock").is_empty());
}

/// A token cancelled before the loop starts means no iterations run.
#[tokio::test]
async fn pre_cancelled_token_stops_before_first_poll() {
    let temp = tempfile::tempdir().expect("tempdir");
    queue_request(temp.path(), r#"{"content":"never delivered"}"#);

    let (backend, sent) = RecordingBackend::pair();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut bridge = Bridge::assemble(
        temp.path(),
        "sess-3",
        Box::new(backend),
        &fast_config(),
        cancel,
    )
    .expect("bridge assembles");

    tokio::time::timeout(Duration::from_secs(1), bridge.run())
        .await
        .expect("cancelled loop returns immediately");

    assert!(sent.lock().expect("lock").is_empty());
}

/// A persistent channel fault is isolated: the loop logs, backs off, and
/// keeps running until told to stop.
#[tokio::test]
async fn channel_fault_is_logged_and_survived() {
    let temp = tempfile::tempdir().expect("tempdir");
    // A directory where the channel should be makes every read fail.
    fs::create_dir(temp.path().join("input.fifo")).expect("create fault");

    let (backend, sent) = RecordingBackend::pair();
    let cancel = CancellationToken::new();
    let mut bridge = Bridge::assemble(
        temp.path(),
        "sess-4",
        Box::new(backend),
        &fast_config(),
        cancel.clone(),
    )
    .expect("bridge assembles");

    let handle = tokio::spawn(async move { bridge.run().await });
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("faulted loop must still observe cancellation")
        .expect("loop task must not panic");

    let log = fs::read_to_string(temp.path().join("bridge.log")).expect("read bridge log");
    assert!(
        log.lines().any(|line| line.contains("error:")),
        "channel fault must be traced, got: {log}"
    );
    assert!(sent.lock().expect("lock").is_empty());
}

/// Construction provisions the history directory; the loop brackets its run
/// with start/stop trace lines.
#[tokio::test]
async fn run_brackets_bridge_log_and_provisions_history_dir() {
    let temp = tempfile::tempdir().expect("tempdir");
    let (backend, _sent) = RecordingBackend::pair();
    let cancel = CancellationToken::new();
    let mut bridge = Bridge::assemble(
        temp.path(),
        "sess-5",
        Box::new(backend),
        &fast_config(),
        cancel.clone(),
    )
    .expect("bridge assembles");

    assert!(
        temp.path().join("history").is_dir(),
        "history dir must exist after construction"
    );

    cancel.cancel();
    bridge.run().await;

    let log = fs::read_to_string(temp.path().join("bridge.log")).expect("read bridge log");
    assert!(log.contains("bridge started"), "got: {log}");
    assert!(log.contains("bridge stopped"), "got: {log}");
}
