//! Integration tests for hierarchy queries.

use proctree_monitor::{analyze, diff, ProcessGraph, ProcessRecord, Snapshot, DEFAULT_ROOT_PID};

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

fn graph_of(entries: &[(&str, &str)]) -> ProcessGraph {
    let current: Snapshot = entries
        .iter()
        .map(|(pid, ppid)| record(pid, ppid))
        .collect();
    let previous = Snapshot::new();
    let delta = diff(&previous, &current);
    let mut graph = ProcessGraph::new();
    graph.update(&current, &previous, &delta);
    graph
}

#[test]
fn test_scenario_a_analysis() {
    let graph = graph_of(&[("1", "0"), ("2", "1"), ("3", "2")]);
    let view = analyze(&graph, "3", DEFAULT_ROOT_PID).unwrap();

    assert_eq!(view.parent.as_deref(), Some("2"));
    assert_eq!(view.ancestors, vec!["1".to_string(), "2".to_string()]);
    assert!(view.descendants.is_empty());
    assert_eq!(view.depth, 2);
    assert_eq!(view.context_size, 3);
}

#[test]
fn test_unknown_pid_yields_none() {
    let graph = graph_of(&[("1", "0")]);
    assert!(analyze(&graph, "999", DEFAULT_ROOT_PID).is_none());
}

#[test]
fn test_root_analysis_covers_whole_tree() {
    let graph = graph_of(&[("1", "0"), ("2", "1"), ("3", "1"), ("4", "3")]);
    let view = analyze(&graph, "1", DEFAULT_ROOT_PID).unwrap();

    assert_eq!(view.parent, None);
    assert_eq!(view.children, vec!["2".to_string(), "3".to_string()]);
    assert!(view.ancestors.is_empty());
    assert_eq!(
        view.descendants,
        vec!["2".to_string(), "3".to_string(), "4".to_string()]
    );
    assert_eq!(view.depth, 0);
    assert_eq!(view.context_size, 4);
}

#[test]
fn test_depth_zero_when_root_absent() {
    // No pid "1" anywhere: every depth collapses to 0 instead of failing.
    let graph = graph_of(&[("7", "0"), ("8", "7"), ("9", "8")]);
    for pid in ["7", "8", "9"] {
        let view = analyze(&graph, pid, DEFAULT_ROOT_PID).unwrap();
        assert_eq!(view.depth, 0, "pid {} should report depth 0", pid);
    }
}

#[test]
fn test_depth_zero_when_unreachable_from_root() {
    // "9" hangs off an orphan branch disconnected from the root.
    let graph = graph_of(&[("1", "0"), ("2", "1"), ("8", "0"), ("9", "8")]);
    let view = analyze(&graph, "9", DEFAULT_ROOT_PID).unwrap();
    assert_eq!(view.depth, 0);

    let reachable = analyze(&graph, "2", DEFAULT_ROOT_PID).unwrap();
    assert_eq!(reachable.depth, 1);
}

#[test]
fn test_context_size_matches_definition() {
    let graph = graph_of(&[("1", "0"), ("2", "1"), ("3", "2"), ("4", "2"), ("5", "4")]);
    for pid in ["1", "2", "3", "4", "5"] {
        let view = analyze(&graph, pid, DEFAULT_ROOT_PID).unwrap();
        assert_eq!(
            view.context_size,
            view.ancestors.len() + view.descendants.len() + 1
        );
    }
}

#[test]
fn test_descendants_ordered_numerically() {
    let graph = graph_of(&[("1", "0"), ("30", "1"), ("4", "1"), ("100", "4")]);
    let view = analyze(&graph, "1", DEFAULT_ROOT_PID).unwrap();
    assert_eq!(
        view.descendants,
        vec!["4".to_string(), "30".to_string(), "100".to_string()]
    );
}

#[test]
fn test_removed_node_is_isolated_but_analyzable() {
    let snap1: Snapshot = [record("1", "0"), record("2", "1")].into_iter().collect();
    let snap2: Snapshot = [record("1", "0")].into_iter().collect();

    let mut graph = ProcessGraph::new();
    let d1 = diff(&Snapshot::new(), &snap1);
    graph.update(&snap1, &Snapshot::new(), &d1);
    let d2 = diff(&snap1, &snap2);
    graph.update(&snap2, &snap1, &d2);

    // The removed node is still a node, but has no hierarchy around it.
    let view = analyze(&graph, "2", DEFAULT_ROOT_PID).unwrap();
    assert_eq!(view.parent, None);
    assert!(view.children.is_empty());
    assert!(view.ancestors.is_empty());
    assert!(view.descendants.is_empty());
    assert_eq!(view.depth, 0);
    assert_eq!(view.context_size, 1);
}

#[test]
fn test_custom_root_pid() {
    let graph = graph_of(&[("50", "0"), ("51", "50"), ("52", "51")]);
    let view = analyze(&graph, "52", "50").unwrap();
    assert_eq!(view.depth, 2);
}
