//! Application state management for the monitor binary.
//!
//! This module defines the shared application state handed to CLI commands
//! and to the background polling task.

use std::sync::Arc;
use std::time::Instant;

use proctree_monitor::Monitor;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across commands and background tasks.
pub struct AppState {
    pub config: Arc<Config>,
    pub monitor: Arc<Monitor>,
    /// Process start time for uptime reporting.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: Config) -> SharedState {
        let monitor = Arc::new(Monitor::new(config.root_pid()));
        Arc::new(Self {
            config: Arc::new(config),
            monitor,
            start_time: Instant::now(),
        })
    }
}
