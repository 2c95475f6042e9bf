//! Process sources: pluggable providers of point-in-time snapshots.
//!
//! The production source shells out to `ps` with a fixed column set and a
//! bounded timeout. Anything that can enumerate pid, parent pid, user,
//! cpu%, mem%, elapsed time, state and command satisfies [`ProcessSource`].

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use tokio::process::Command;
use tracing::debug;

use crate::error::SourceError;
use crate::snapshot::{ProcessRecord, Snapshot};

/// Default bound on one capture attempt.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(3);

/// Number of whitespace-separated fields a listing line must carry. The
/// last field (command) absorbs any remaining whitespace.
const RECORD_FIELDS: usize = 8;

static DEFAULT_CAPTURE_ARGV: Lazy<Vec<String>> = Lazy::new(|| {
    "ps ax -o pid,ppid,user,%cpu,%mem,etime,state,comm"
        .split_whitespace()
        .map(str::to_owned)
        .collect()
});

/// Provider of process snapshots.
#[async_trait]
pub trait ProcessSource: Send + Sync {
    /// Captures one snapshot of all visible processes.
    ///
    /// No side effects beyond the underlying query. Individual malformed
    /// records are skipped by the implementation, not surfaced as errors.
    async fn capture(&self) -> Result<Snapshot, SourceError>;
}

/// `ps`-backed process source.
#[derive(Debug, Clone)]
pub struct PsSource {
    argv: Vec<String>,
    timeout: Duration,
}

impl Default for PsSource {
    fn default() -> Self {
        Self {
            argv: DEFAULT_CAPTURE_ARGV.clone(),
            timeout: DEFAULT_CAPTURE_TIMEOUT,
        }
    }
}

impl PsSource {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Overrides the listing command. The argv must produce one header line
    /// followed by one line per process with the standard column set.
    pub fn with_argv(mut self, argv: Vec<String>) -> Self {
        if !argv.is_empty() {
            self.argv = argv;
        }
        self
    }
}

#[async_trait]
impl ProcessSource for PsSource {
    async fn capture(&self) -> Result<Snapshot, SourceError> {
        let mut command = Command::new(&self.argv[0]);
        command
            .args(&self.argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| SourceError::Timeout(self.timeout))?
            .map_err(SourceError::Spawn)?;

        if !output.status.success() {
            return Err(SourceError::Command {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout =
            std::str::from_utf8(&output.stdout).map_err(|_| SourceError::MalformedOutput)?;
        Ok(parse_listing(stdout))
    }
}

/// Parses a full `ps` listing into a snapshot.
///
/// The first line is the column header and is skipped. Lines with fewer
/// than [`RECORD_FIELDS`] fields are dropped individually; they never fail
/// the capture.
pub fn parse_listing(listing: &str) -> Snapshot {
    let mut snapshot = Snapshot::new();
    let mut skipped = 0usize;

    for line in listing.lines().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_record(line) {
            Some(record) => snapshot.insert(record),
            None => {
                skipped += 1;
                debug!("skipping malformed listing line: {:?}", line);
            }
        }
    }

    if skipped > 0 {
        debug!(
            "parsed {} records, skipped {} malformed lines",
            snapshot.len(),
            skipped
        );
    }
    snapshot
}

/// Parses one listing line, trimming every field. The command field keeps
/// its internal whitespace.
fn parse_record(line: &str) -> Option<ProcessRecord> {
    let mut rest = line.trim();
    let mut fields = [""; RECORD_FIELDS];

    for slot in fields.iter_mut().take(RECORD_FIELDS - 1) {
        let end = rest.find(char::is_whitespace)?;
        *slot = &rest[..end];
        rest = rest[end..].trim_start();
    }
    if rest.is_empty() {
        return None;
    }
    fields[RECORD_FIELDS - 1] = rest;

    let [pid, ppid, user, cpu, mem, etime, state, command] = fields;
    Some(ProcessRecord {
        pid: pid.to_string(),
        ppid: ppid.to_string(),
        user: user.to_string(),
        cpu_percent: cpu.to_string(),
        mem_percent: mem.to_string(),
        elapsed_time: etime.to_string(),
        state: state.to_string(),
        command: command.trim().to_string(),
    })
}
