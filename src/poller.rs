//! Polling driver: repeatedly captures, diffs and applies snapshots.
//!
//! One cycle is capture -> diff -> graph update -> event broadcast. The
//! driver runs at most one cycle at a time and measures the poll interval
//! between cycle completions, so a slow capture can never cause two
//! overlapping cycles. Stopping is cooperative: an in-flight cycle always
//! finishes before the loop exits.

use std::sync::{Arc, RwLock as StdRwLock};
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::monitor::{CycleSummary, Monitor};
use crate::source::ProcessSource;

/// Default interval between cycle completions.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle of the polling driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Not started, or fully stopped.
    Idle,
    /// The polling loop is live.
    Running,
    /// Stop requested; the in-flight cycle is allowed to finish.
    Stopping,
}

/// Consumer notification emitted once per cycle.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    Completed(CycleSummary),
    /// The capture failed; the cycle was skipped and prior state retained.
    SourceFailed(String),
}

/// Polling driver over a monitor and a process source.
pub struct Poller<S> {
    monitor: Arc<Monitor>,
    source: S,
    interval: Duration,
    events: broadcast::Sender<CycleEvent>,
}

impl<S: ProcessSource + 'static> Poller<S> {
    pub fn new(monitor: Arc<Monitor>, source: S, interval: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            monitor,
            source,
            interval,
            events,
        }
    }

    /// Subscribes to cycle events. May be called before [`Poller::spawn`]
    /// so no event of the first cycle is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    /// Starts the polling loop (Idle -> Running) on the tokio runtime.
    pub fn spawn(self) -> PollerHandle {
        let state = Arc::new(StdRwLock::new(PollerState::Running));
        let (stop_tx, stop_rx) = watch::channel(false);
        let events = self.events.clone();

        info!(
            "polling driver started, interval {} ms",
            self.interval.as_millis()
        );
        let loop_state = Arc::clone(&state);
        let task = tokio::spawn(run_loop(
            self.monitor,
            self.source,
            self.interval,
            self.events,
            stop_rx,
            loop_state,
        ));

        PollerHandle {
            state,
            stop_tx,
            events,
            task,
        }
    }
}

/// Handle to a running polling driver.
pub struct PollerHandle {
    state: Arc<StdRwLock<PollerState>>,
    stop_tx: watch::Sender<bool>,
    events: broadcast::Sender<CycleEvent>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn state(&self) -> PollerState {
        *self.state.read().expect("poller state lock poisoned")
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    /// Requests a stop (Running -> Stopping) and waits until the in-flight
    /// cycle, if any, has completed (Stopping -> Idle). Returns the final
    /// state, which is always Idle.
    pub async fn stop(self) -> PollerState {
        {
            let mut state = self.state.write().expect("poller state lock poisoned");
            if *state == PollerState::Running {
                *state = PollerState::Stopping;
            }
        }
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            warn!("polling task terminated abnormally: {}", e);
        }
        *self.state.write().expect("poller state lock poisoned") = PollerState::Idle;
        info!("polling driver stopped");
        PollerState::Idle
    }
}

async fn run_loop<S: ProcessSource>(
    monitor: Arc<Monitor>,
    source: S,
    interval: Duration,
    events: broadcast::Sender<CycleEvent>,
    mut stop_rx: watch::Receiver<bool>,
    state: Arc<StdRwLock<PollerState>>,
) {
    loop {
        match source.capture().await {
            Ok(snapshot) => {
                let summary = monitor.apply_cycle(snapshot).await;
                debug!(
                    "cycle {}: {} processes, +{} -{}",
                    summary.cycle, summary.total, summary.created, summary.removed
                );
                let _ = events.send(CycleEvent::Completed(summary));
            }
            Err(e) => {
                // Transient failure: keep the previous snapshot and graph.
                warn!("capture failed, skipping cycle: {}", e);
                let _ = events.send(CycleEvent::SourceFailed(e.to_string()));
            }
        }

        if *stop_rx.borrow() {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
    *state.write().expect("poller state lock poisoned") = PollerState::Idle;
}
