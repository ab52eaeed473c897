//! Backend availability monitor.
//!
//! A two-state machine (reachable / unreachable) with a consecutive-failure
//! counter. There is no time-based recovery: the monitor only flips back to
//! reachable when an explicit probe or fetch actually succeeds.

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{info, warn};

use crate::backend::DataBackend;

/// Observed reachability of the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// No probe or fetch has completed yet
    Unknown,
    Reachable,
    Unreachable,
}

/// Snapshot of the monitor's state.
#[derive(Debug, Clone, Copy)]
pub struct AvailabilityState {
    pub reachability: Reachability,
    /// Retry-exhaustion events since the last success
    pub consecutive_failures: u32,
    pub last_probe_at: Option<Instant>,
}

/// Process-wide availability state for one backend endpoint.
///
/// Owned by the application session and shared (behind `Arc`) between the
/// fetch gateway and any manual-retry surface. All mutation goes through
/// [`report_success`](Self::report_success) /
/// [`report_failure`](Self::report_failure) / [`reset`](Self::reset).
pub struct AvailabilityMonitor {
    state: RwLock<AvailabilityState>,
    /// Failure events before Reachable/Unknown degrades to Unreachable
    failure_threshold: u32,
}

impl AvailabilityMonitor {
    pub fn new(failure_threshold: u32) -> Self {
        Self {
            state: RwLock::new(AvailabilityState {
                reachability: Reachability::Unknown,
                consecutive_failures: 0,
                last_probe_at: None,
            }),
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// Whether fetches should be attempted. `Unknown` counts as reachable so
    /// the very first fetch of a session is allowed to try the network.
    pub fn is_reachable(&self) -> bool {
        self.state.read().reachability != Reachability::Unreachable
    }

    pub fn reachability(&self) -> Reachability {
        self.state.read().reachability
    }

    pub fn snapshot(&self) -> AvailabilityState {
        *self.state.read()
    }

    /// Record a successful probe or fetch. Any single success restores
    /// reachability and zeroes the failure counter.
    pub fn report_success(&self) {
        let mut state = self.state.write();
        if state.reachability == Reachability::Unreachable {
            info!("backend reachable again");
        }
        state.reachability = Reachability::Reachable;
        state.consecutive_failures = 0;
    }

    /// Record a retry-exhaustion event (one full failed fetch cycle or a
    /// failed probe).
    pub fn report_failure(&self) {
        let mut state = self.state.write();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if state.consecutive_failures >= self.failure_threshold
            && state.reachability != Reachability::Unreachable
        {
            warn!(
                failures = state.consecutive_failures,
                "backend marked unreachable"
            );
            state.reachability = Reachability::Unreachable;
        }
    }

    /// Manual-retry reset: forget the failure history so the next fetch is
    /// gated as if the session just started.
    pub fn reset(&self) {
        let mut state = self.state.write();
        state.reachability = Reachability::Unknown;
        state.consecutive_failures = 0;
    }

    /// Issue a liveness ping, bounded by `timeout_ms`, and update state from
    /// the result. Returns the post-probe reachability.
    pub async fn probe(&self, backend: &dyn DataBackend, timeout_ms: u64) -> bool {
        let deadline = std::time::Duration::from_millis(timeout_ms);
        let outcome = tokio::time::timeout(deadline, backend.ping()).await;

        self.state.write().last_probe_at = Some(Instant::now());

        match outcome {
            Ok(Ok(())) => {
                self.report_success();
                true
            }
            Ok(Err(e)) => {
                warn!(error = %e, "liveness probe failed");
                self.report_failure();
                false
            }
            Err(_) => {
                warn!(timeout_ms, "liveness probe timed out");
                self.report_failure();
                false
            }
        }
    }
}
