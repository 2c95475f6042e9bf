//! Snapshot storage and snapshot differencing.
//!
//! A [`Snapshot`] is one point-in-time observation of every process visible
//! to the caller, keyed by pid. Two snapshots are kept alive at any time
//! (current and previous); [`diff`] computes the created/removed pid sets
//! between them.

use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use serde::Serialize;

/// One observed process, immutable once captured.
///
/// All attributes are opaque trimmed strings. Pids are deliberately not
/// numeric: they are reused by the kernel and compared only for identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessRecord {
    pub pid: String,
    pub ppid: String,
    pub user: String,
    pub cpu_percent: String,
    pub mem_percent: String,
    pub elapsed_time: String,
    pub state: String,
    pub command: String,
}

/// Point-in-time mapping pid -> record.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: HashMap<String, ProcessRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its own pid. A later record for the same pid
    /// wins, mirroring the duplicate handling of a plain listing.
    pub fn insert(&mut self, record: ProcessRecord) {
        self.records.insert(record.pid.clone(), record);
    }

    pub fn get(&self, pid: &str) -> Option<&ProcessRecord> {
        self.records.get(pid)
    }

    pub fn contains(&self, pid: &str) -> bool {
        self.records.contains_key(pid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn pids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProcessRecord)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<ProcessRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = ProcessRecord>>(iter: I) -> Self {
        let mut snap = Snapshot::new();
        for record in iter {
            snap.insert(record);
        }
        snap
    }
}

/// Created/removed pid sets between two consecutive snapshots.
///
/// Built fresh each polling cycle and discarded once applied.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    pub created: HashSet<String>,
    pub removed: HashSet<String>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.removed.is_empty()
    }
}

/// Computes the structural difference between two snapshots.
///
/// `created = keys(current) - keys(previous)`,
/// `removed = keys(previous) - keys(current)`. Pure and O(n); an empty
/// previous snapshot yields every current pid as created.
pub fn diff(previous: &Snapshot, current: &Snapshot) -> Delta {
    let created = current
        .pids()
        .filter(|pid| !previous.contains(pid))
        .map(str::to_owned)
        .collect();
    let removed = previous
        .pids()
        .filter(|pid| !current.contains(pid))
        .map(str::to_owned)
        .collect();
    Delta { created, removed }
}
