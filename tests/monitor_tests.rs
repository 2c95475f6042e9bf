//! Integration tests for the shared monitor state.

use proctree_monitor::{Lifecycle, Monitor, ProcessRecord, Snapshot};

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

#[tokio::test]
async fn test_first_cycle_creates_everything() {
    let monitor = Monitor::default();
    let summary = monitor.apply_cycle(snapshot(&[("1", "0"), ("2", "1")])).await;

    assert_eq!(summary.cycle, 1);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.removed, 0);
}

#[tokio::test]
async fn test_snapshot_rotation_and_delta() {
    let monitor = Monitor::default();
    monitor.apply_cycle(snapshot(&[("1", "0"), ("2", "1")])).await;
    let summary = monitor
        .apply_cycle(snapshot(&[("1", "0"), ("3", "1")]))
        .await;

    assert_eq!(summary.created, 1);
    assert_eq!(summary.removed, 1);

    let delta = monitor.last_delta().await;
    assert!(delta.created.contains("3"));
    assert!(delta.removed.contains("2"));

    let current = monitor.current().await;
    assert!(current.contains("3"));
    assert!(!current.contains("2"));

    // The vanished process remains visible in the graph, tagged Removed.
    let graph = monitor.graph().await;
    assert_eq!(graph.node("2").unwrap().lifecycle, Lifecycle::Removed);
    assert_eq!(graph.node("3").unwrap().lifecycle, Lifecycle::Active);
}

#[tokio::test]
async fn test_analyze_through_monitor() {
    let monitor = Monitor::default();
    monitor
        .apply_cycle(snapshot(&[("1", "0"), ("2", "1"), ("3", "2")]))
        .await;

    let view = monitor.analyze("2").await.unwrap();
    assert_eq!(view.parent.as_deref(), Some("1"));
    assert_eq!(view.children, vec!["3".to_string()]);
    assert_eq!(view.depth, 1);
    assert_eq!(view.context_size, 3);

    assert!(monitor.analyze("nope").await.is_none());
}

#[tokio::test]
async fn test_custom_root_changes_depth() {
    let monitor = Monitor::new("10");
    monitor
        .apply_cycle(snapshot(&[("10", "0"), ("11", "10"), ("12", "11")]))
        .await;

    assert_eq!(monitor.root_pid(), "10");
    let view = monitor.analyze("12").await.unwrap();
    assert_eq!(view.depth, 2);
}
