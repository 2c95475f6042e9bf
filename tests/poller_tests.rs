//! Integration tests for the polling driver, using a scripted source.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use proctree_monitor::{
    CycleEvent, Monitor, Poller, PollerState, ProcessRecord, ProcessSource, Snapshot, SourceError,
};

fn record(pid: &str, ppid: &str) -> ProcessRecord {
    ProcessRecord {
        pid: pid.to_string(),
        ppid: ppid.to_string(),
        user: "root".to_string(),
        cpu_percent: "0.0".to_string(),
        mem_percent: "0.1".to_string(),
        elapsed_time: "01:00".to_string(),
        state: "S".to_string(),
        command: format!("proc-{}", pid),
    }
}

fn snapshot(entries: &[(&str, &str)]) -> Snapshot {
    entries
        .iter()
        .map(|(pid, ppid)| record(pid, ppid))
        .collect()
}

enum Step {
    Capture(Snapshot),
    Fail,
    Slow(Snapshot, Duration),
}

/// Source that replays a script; once exhausted, every further capture
/// fails, so the applied cycle count stays deterministic.
struct ScriptedSource {
    steps: Mutex<VecDeque<Step>>,
}

impl ScriptedSource {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
        }
    }
}

#[async_trait]
impl ProcessSource for ScriptedSource {
    async fn capture(&self) -> Result<Snapshot, SourceError> {
        let step = self.steps.lock().await.pop_front();
        match step {
            Some(Step::Capture(snap)) => Ok(snap),
            Some(Step::Slow(snap, delay)) => {
                tokio::time::sleep(delay).await;
                Ok(snap)
            }
            Some(Step::Fail) | None => Err(SourceError::Timeout(Duration::from_secs(3))),
        }
    }
}

const SHORT_INTERVAL: Duration = Duration::from_millis(10);

#[tokio::test]
async fn test_poller_runs_cycles_and_stops_idle() {
    let monitor = Arc::new(Monitor::default());
    let source = ScriptedSource::new(vec![
        Step::Capture(snapshot(&[("1", "0"), ("2", "1")])),
        Step::Capture(snapshot(&[("1", "0"), ("2", "1"), ("3", "2")])),
    ]);
    let poller = Poller::new(Arc::clone(&monitor), source, SHORT_INTERVAL);
    let mut events = poller.subscribe();
    let handle = poller.spawn();

    let first = events.recv().await.unwrap();
    let CycleEvent::Completed(first) = first else {
        panic!("expected completed first cycle");
    };
    assert_eq!(first.cycle, 1);
    assert_eq!(first.total, 2);
    assert_eq!(first.created, 2);
    assert_eq!(first.removed, 0);

    let second = events.recv().await.unwrap();
    let CycleEvent::Completed(second) = second else {
        panic!("expected completed second cycle");
    };
    assert_eq!(second.total, 3);
    assert_eq!(second.created, 1);

    assert_eq!(handle.state(), PollerState::Running);
    assert_eq!(handle.stop().await, PollerState::Idle);

    let current = monitor.current().await;
    assert!(current.contains("3"));
    let view = monitor.analyze("3").await.unwrap();
    assert_eq!(view.depth, 2);
}

#[tokio::test]
async fn test_capture_failure_skips_cycle_and_keeps_state() {
    let monitor = Arc::new(Monitor::default());
    let snap = snapshot(&[("1", "0"), ("2", "1")]);
    let source = ScriptedSource::new(vec![Step::Capture(snap.clone()), Step::Fail]);
    let poller = Poller::new(Arc::clone(&monitor), source, SHORT_INTERVAL);
    let mut events = poller.subscribe();
    let handle = poller.spawn();

    let first = events.recv().await.unwrap();
    assert!(matches!(first, CycleEvent::Completed(_)));

    let second = events.recv().await.unwrap();
    let CycleEvent::SourceFailed(message) = second else {
        panic!("expected a skipped cycle");
    };
    assert!(message.contains("timed out"));

    // The failed cycle applied nothing: previous snapshot and graph intact.
    assert_eq!(monitor.cycles().await, 1);
    let current = monitor.current().await;
    assert_eq!(current.len(), 2);
    assert!(current.contains("2"));
    let delta = monitor.last_delta().await;
    assert_eq!(delta.created.len(), 2);
    assert!(delta.removed.is_empty());

    handle.stop().await;
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_cycle() {
    let monitor = Arc::new(Monitor::default());
    let source = ScriptedSource::new(vec![Step::Slow(
        snapshot(&[("1", "0")]),
        Duration::from_millis(100),
    )]);
    let poller = Poller::new(Arc::clone(&monitor), source, Duration::from_secs(60));
    let handle = poller.spawn();

    // Let the first capture get in flight, then request a stop.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.stop().await, PollerState::Idle);

    // The in-flight cycle was allowed to finish before the loop exited.
    assert_eq!(monitor.cycles().await, 1);
    assert!(monitor.current().await.contains("1"));
}

#[tokio::test]
async fn test_poller_recovers_after_failure() {
    let monitor = Arc::new(Monitor::default());
    let source = ScriptedSource::new(vec![
        Step::Fail,
        Step::Capture(snapshot(&[("1", "0")])),
    ]);
    let poller = Poller::new(Arc::clone(&monitor), source, SHORT_INTERVAL);
    let mut events = poller.subscribe();
    let handle = poller.spawn();

    assert!(matches!(
        events.recv().await.unwrap(),
        CycleEvent::SourceFailed(_)
    ));
    assert!(matches!(
        events.recv().await.unwrap(),
        CycleEvent::Completed(_)
    ));

    assert_eq!(monitor.cycles().await, 1);
    handle.stop().await;
}
