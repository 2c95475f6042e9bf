//! Hierarchical queries over the process graph.
//!
//! Answers, for a single pid: direct parent, direct children, all
//! ancestors, all descendants, depth below the designated root, and the
//! total context size. Everything is computed on demand with breadth-first
//! traversals, O(V+E) per query.

use std::collections::VecDeque;

use ahash::AHashSet as HashSet;
use serde::Serialize;

use crate::graph::{pid_order, ProcessGraph};

/// Conventional tree root used for depth computation.
pub const DEFAULT_ROOT_PID: &str = "1";

/// Result of one hierarchy query. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyView {
    pub pid: String,
    pub parent: Option<String>,
    pub children: Vec<String>,
    pub ancestors: Vec<String>,
    pub descendants: Vec<String>,
    pub depth: usize,
    pub context_size: usize,
}

/// Analyzes `pid` against the graph, or `None` if it is not a node.
///
/// Depth is the shortest directed path from `root` to `pid`; when the root
/// is absent from the graph or `pid` is unreachable from it, depth is 0 so
/// the query stays total. Ancestor/descendant lists are sorted in
/// deterministic pid order.
pub fn analyze(graph: &ProcessGraph, pid: &str, root: &str) -> Option<HierarchyView> {
    if !graph.has_node(pid) {
        return None;
    }

    let parent = graph.parent(pid).map(str::to_owned);
    let children = graph.children(pid).to_vec();

    let mut ancestors = reachable(graph, pid, |g, p| g.parents(p));
    ancestors.sort_by(|a, b| pid_order(a, b));
    let mut descendants = reachable(graph, pid, |g, p| g.children(p));
    descendants.sort_by(|a, b| pid_order(a, b));

    let depth = depth_from(graph, root, pid);
    let context_size = ancestors.len() + descendants.len() + 1;

    Some(HierarchyView {
        pid: pid.to_string(),
        parent,
        children,
        ancestors,
        descendants,
        depth,
        context_size,
    })
}

/// All nodes reachable from `start` (exclusive) along `step` edges.
fn reachable<'g, F>(graph: &'g ProcessGraph, start: &str, step: F) -> Vec<String>
where
    F: Fn(&'g ProcessGraph, &str) -> &'g [String],
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    seen.insert(start);
    queue.push_back(start);

    let mut out = Vec::new();
    while let Some(pid) = queue.pop_front() {
        for next in step(graph, pid) {
            if seen.insert(next) {
                out.push(next.clone());
                queue.push_back(next);
            }
        }
    }
    out
}

/// Shortest directed path length from `root` to `pid`, or 0 when the root
/// is missing or `pid` is unreachable.
fn depth_from(graph: &ProcessGraph, root: &str, pid: &str) -> usize {
    if !graph.has_node(root) {
        return 0;
    }
    if root == pid {
        return 0;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
    seen.insert(root);
    queue.push_back((root, 0));

    while let Some((current, dist)) = queue.pop_front() {
        for child in graph.children(current) {
            if child == pid {
                return dist + 1;
            }
            if seen.insert(child) {
                queue.push_back((child, dist + 1));
            }
        }
    }
    0
}
