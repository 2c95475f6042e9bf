//! proctree-monitor engine
//!
//! Tracks the live process tree of one host: a pluggable process source
//! captures snapshots, a differencer computes created/removed pid sets
//! between consecutive snapshots, and a directed graph of parent -> child
//! relations is rebuilt incrementally each cycle. Hierarchy queries
//! (ancestors, descendants, depth, context size) run on demand against the
//! graph while a polling driver keeps it current.
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use proctree_monitor::{Monitor, Poller, PsSource, DEFAULT_POLL_INTERVAL};
//!
//! # async fn run() {
//! let monitor = Arc::new(Monitor::default());
//! let source = PsSource::new(Duration::from_secs(3));
//! let poller = Poller::new(Arc::clone(&monitor), source, DEFAULT_POLL_INTERVAL);
//!
//! let mut events = poller.subscribe();
//! let handle = poller.spawn();
//!
//! // ... consume events, query monitor.analyze("1") ...
//!
//! handle.stop().await;
//! # }
//! ```

pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod monitor;
pub mod poller;
pub mod register;
pub mod snapshot;
pub mod source;

// Re-export main types for convenience
pub use error::{RegisterError, SourceError};
pub use graph::{GraphNode, Lifecycle, ProcessGraph};
pub use hierarchy::{analyze, HierarchyView, DEFAULT_ROOT_PID};
pub use monitor::{CycleSummary, Monitor};
pub use poller::{CycleEvent, Poller, PollerHandle, PollerState, DEFAULT_POLL_INTERVAL};
pub use register::{RegisterServer, DEFAULT_REGISTER_VALUE, REGISTER_COUNT};
pub use snapshot::{diff, Delta, ProcessRecord, Snapshot};
pub use source::{parse_listing, ProcessSource, PsSource, DEFAULT_CAPTURE_TIMEOUT};
