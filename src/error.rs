//! Error taxonomy for the monitoring engine.
//!
//! Only two conditions are real errors: the process source failing as a
//! whole and the register server failing to come up. A single malformed
//! listing line is skipped where it is parsed, and a query for an unknown
//! pid yields an empty result rather than an error.

use std::time::Duration;
use thiserror::Error;

/// Failure of one whole capture attempt.
///
/// Recovered locally by the polling driver: the cycle is skipped and the
/// previous snapshot, delta and graph stay visible.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The process lister did not complete within the configured bound.
    #[error("process listing timed out after {0:?}")]
    Timeout(Duration),

    /// The process lister could not be spawned at all.
    #[error("failed to spawn process lister: {0}")]
    Spawn(#[source] std::io::Error),

    /// The process lister ran but exited unsuccessfully.
    #[error("process lister exited with {status}: {stderr}")]
    Command { status: String, stderr: String },

    /// The process lister produced output that is not valid UTF-8.
    #[error("process lister produced non-UTF-8 output")]
    MalformedOutput,
}

/// Failure states of the downstream register server.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("failed to bind register server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
