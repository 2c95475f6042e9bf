//! Incrementally updated directed graph of parent -> child relations.
//!
//! Nodes are kept in an arena keyed by pid and are never deleted: a pid
//! that vanishes is overwritten with a [`Lifecycle::Removed`] tag and its
//! last-known record frozen, until a later cycle overwrites it again
//! (re-creation or a fresh removal). Edges, by contrast, are cleared and
//! rebuilt from the current snapshot on every update, so a stale edge can
//! never outlive the snapshot that justified it.

use std::cmp::Ordering;

use ahash::AHashMap as HashMap;
use serde::Serialize;

use crate::snapshot::{Delta, ProcessRecord, Snapshot};

/// Presence of a node in the latest snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Lifecycle {
    Active,
    Removed,
}

/// One graph node: the last-known record plus its lifecycle tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub record: ProcessRecord,
    pub lifecycle: Lifecycle,
}

/// Deterministic pid ordering: numeric when both sides parse as integers,
/// lexicographic otherwise. Used for children lists and parent tie-breaks.
pub fn pid_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

/// Directed process graph with clear-and-rebuild edge maintenance.
#[derive(Debug, Clone, Default)]
pub struct ProcessGraph {
    nodes: HashMap<String, GraphNode>,
    children: HashMap<String, Vec<String>>,
    parents: HashMap<String, Vec<String>>,
}

impl ProcessGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one polling cycle to the graph.
    ///
    /// Every pid in `current` becomes an Active node carrying its fresh
    /// record. Every pid in `delta.removed` that existed in `previous`
    /// becomes a Removed node carrying the record it had when last seen.
    /// The entire edge set is then rebuilt from `current` alone: edge
    /// ppid -> pid exists iff both pids are in `current` and ppid != pid.
    /// Rebuilding is cheaper than differential edge maintenance at the
    /// expected sizes and guarantees no edge references a vanished node.
    ///
    /// Never fails; calling it twice with identical inputs yields an
    /// identical graph.
    pub fn update(&mut self, current: &Snapshot, previous: &Snapshot, delta: &Delta) {
        for (_, record) in current.iter() {
            self.nodes.insert(
                record.pid.clone(),
                GraphNode {
                    record: record.clone(),
                    lifecycle: Lifecycle::Active,
                },
            );
        }

        for pid in &delta.removed {
            if let Some(record) = previous.get(pid) {
                self.nodes.insert(
                    pid.clone(),
                    GraphNode {
                        record: record.clone(),
                        lifecycle: Lifecycle::Removed,
                    },
                );
            }
        }

        self.children.clear();
        self.parents.clear();
        for (pid, record) in current.iter() {
            let ppid = record.ppid.as_str();
            if ppid != pid && current.contains(ppid) {
                self.children
                    .entry(ppid.to_string())
                    .or_default()
                    .push(pid.to_string());
                self.parents
                    .entry(pid.to_string())
                    .or_default()
                    .push(ppid.to_string());
            }
        }
        for list in self.children.values_mut() {
            list.sort_by(|a, b| pid_order(a, b));
        }
        for list in self.parents.values_mut() {
            list.sort_by(|a, b| pid_order(a, b));
        }
    }

    pub fn has_node(&self, pid: &str) -> bool {
        self.nodes.contains_key(pid)
    }

    pub fn node(&self, pid: &str) -> Option<&GraphNode> {
        self.nodes.get(pid)
    }

    /// Children of `pid` in deterministic pid order. Empty for unknown or
    /// removed pids.
    pub fn children(&self, pid: &str) -> &[String] {
        self.children.get(pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The direct parent of `pid`, if any. A process has at most one
    /// recorded parent; should the representation ever yield several, the
    /// lowest pid wins deterministically.
    pub fn parent(&self, pid: &str) -> Option<&str> {
        self.parents
            .get(pid)
            .and_then(|list| list.first())
            .map(String::as_str)
    }

    /// All parents of `pid`, for reverse reachability traversals.
    pub fn parents(&self, pid: &str) -> &[String] {
        self.parents.get(pid).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &GraphNode)> {
        self.nodes.iter().map(|(pid, node)| (pid.as_str(), node))
    }

    /// All edges as (parent, child) pairs, for drawing consumers.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.children.iter().flat_map(|(parent, kids)| {
            kids.iter().map(move |child| (parent.as_str(), child.as_str()))
        })
    }

    pub fn edge_count(&self) -> usize {
        self.children.values().map(Vec::len).sum()
    }

    /// Number of nodes currently tagged Active.
    pub fn active_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|n| n.lifecycle == Lifecycle::Active)
            .count()
    }

    /// Number of nodes currently tagged Removed.
    pub fn removed_count(&self) -> usize {
        self.nodes.len() - self.active_count()
    }
}
