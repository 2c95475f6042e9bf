//! Shared monitoring state: the snapshot store and the process graph.
//!
//! The [`Monitor`] is the single mutation entry point for everything the
//! polling driver produces. One write lock spans the whole of
//! [`Monitor::apply_cycle`], so a concurrent reader either sees the state
//! before a cycle or after it, never a half-applied update. Readers (UI,
//! CLI commands, any downstream consumer) only get read-only accessors.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tokio::sync::{RwLock, RwLockReadGuard};

use crate::graph::ProcessGraph;
use crate::hierarchy::{self, HierarchyView, DEFAULT_ROOT_PID};
use crate::snapshot::{diff, Delta, Snapshot};

/// Outcome of one applied polling cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleSummary {
    pub timestamp: DateTime<Utc>,
    pub cycle: u64,
    pub total: usize,
    pub created: usize,
    pub removed: usize,
    pub apply_duration_ms: f64,
}

#[derive(Default)]
struct MonitorInner {
    current: Snapshot,
    previous: Snapshot,
    last_delta: Delta,
    graph: ProcessGraph,
    cycles: u64,
}

/// Owner of the two retained snapshots and the process graph.
pub struct Monitor {
    root_pid: String,
    inner: RwLock<MonitorInner>,
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_PID)
    }
}

impl Monitor {
    /// Creates a monitor with the given root pid for depth queries.
    pub fn new(root_pid: &str) -> Self {
        Self {
            root_pid: root_pid.to_string(),
            inner: RwLock::new(MonitorInner::default()),
        }
    }

    pub fn root_pid(&self) -> &str {
        &self.root_pid
    }

    /// Applies one freshly captured snapshot: rotates current -> previous,
    /// computes the delta and rebuilds the graph, all under one write lock.
    pub async fn apply_cycle(&self, snapshot: Snapshot) -> CycleSummary {
        let start = Instant::now();
        let mut inner = self.inner.write().await;

        let outgoing = std::mem::take(&mut inner.current);
        inner.current = snapshot;
        inner.previous = outgoing;
        let delta = diff(&inner.previous, &inner.current);
        inner.last_delta = delta;

        let MonitorInner {
            current,
            previous,
            last_delta,
            graph,
            cycles,
        } = &mut *inner;
        graph.update(current, previous, last_delta);
        *cycles += 1;

        CycleSummary {
            timestamp: Utc::now(),
            cycle: *cycles,
            total: current.len(),
            created: last_delta.created.len(),
            removed: last_delta.removed.len(),
            apply_duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }

    /// The most recent successful snapshot.
    pub async fn current(&self) -> Snapshot {
        self.inner.read().await.current.clone()
    }

    /// The delta between the two retained snapshots.
    pub async fn last_delta(&self) -> Delta {
        self.inner.read().await.last_delta.clone()
    }

    /// Number of cycles applied so far.
    pub async fn cycles(&self) -> u64 {
        self.inner.read().await.cycles
    }

    /// Read guard over the graph, for node/edge enumeration by consumers.
    pub async fn graph(&self) -> RwLockReadGuard<'_, ProcessGraph> {
        RwLockReadGuard::map(self.inner.read().await, |inner| &inner.graph)
    }

    /// Hierarchy query for `pid`, or `None` if it is not tracked.
    pub async fn analyze(&self, pid: &str) -> Option<HierarchyView> {
        let inner = self.inner.read().await;
        hierarchy::analyze(&inner.graph, pid, &self.root_pid)
    }
}
