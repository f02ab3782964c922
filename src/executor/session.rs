//! Per-invocation run state

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::ExecutionParameters;
use crate::http::StatusSnapshot;
use crate::models::ExecutionStatus;

/// What is known about the remote run for one invocation
#[derive(Debug)]
pub struct RunSession {
    params: ExecutionParameters,
    has_warnings: bool,
    /// The remote run is known to have stopped, either through our kill
    /// call or because a snapshot reported a terminal state.
    killed: bool,
    latest: Option<StatusSnapshot>,
    started_at: DateTime<Utc>,
}

impl RunSession {
    pub fn new(params: ExecutionParameters, has_warnings: bool) -> Self {
        Self {
            params,
            has_warnings,
            killed: false,
            latest: None,
            started_at: Utc::now(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.has_warnings
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn mark_killed(&mut self) {
        self.killed = true;
    }

    /// Store a fresh snapshot, replacing the previous one
    pub fn record(&mut self, snapshot: StatusSnapshot) {
        if let Some(previous) = self.status() {
            if snapshot.status.executed_tcs < previous.executed_tcs {
                warn!(
                    "Executed test case count went backwards ({} -> {})",
                    previous.executed_tcs, snapshot.status.executed_tcs
                );
            }
        }
        if snapshot.status.exec_status.is_terminal() {
            self.killed = true;
        }
        self.latest = Some(snapshot);
    }

    pub fn latest(&self) -> Option<&StatusSnapshot> {
        self.latest.as_ref()
    }

    pub fn status(&self) -> Option<&ExecutionStatus> {
        self.latest.as_ref().map(|s| &s.status)
    }

    pub fn executed_tcs(&self) -> u32 {
        self.status().map_or(0, |s| s.executed_tcs)
    }

    pub fn failure_percent(&self) -> f64 {
        self.status().map_or(0.0, ExecutionStatus::failure_percent)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status()
            .map_or(false, |s| s.exec_status.is_in_progress())
    }

    /// Latest fail percentage is at or above the threshold
    pub fn breached(&self) -> bool {
        self.status()
            .map_or(false, |s| s.breaches(self.params.threshold))
    }

    pub fn elapsed_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
