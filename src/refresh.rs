//! Periodic refresh scheduler.
//!
//! Replaces the per-view auto-refresh timers: one background task per
//! domain calls into the freshness cache on a fixed interval and publishes
//! the outcome on a broadcast channel. The renderer subscribes; nothing
//! here knows about views. The handle stops all tasks so a torn-down
//! session leaves no periodic work behind.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::FreshnessCache;
use crate::domain::{DomainKey, FetchOutcome};

/// One refresh cycle's result for one domain.
#[derive(Debug, Clone)]
pub struct RefreshEvent {
    pub domain: DomainKey,
    pub outcome: FetchOutcome,
}

/// Spawns and owns the per-domain refresh tasks.
pub struct RefreshScheduler {
    cache: Arc<FreshnessCache>,
    domains: Vec<DomainKey>,
    interval_secs: u64,
    broadcast_tx: broadcast::Sender<RefreshEvent>,
}

impl RefreshScheduler {
    pub fn new(cache: Arc<FreshnessCache>) -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            cache,
            domains: DomainKey::ALL.to_vec(),
            interval_secs: crate::DEFAULT_REFRESH_INTERVAL_SECS,
            broadcast_tx: tx,
        }
    }

    /// Refresh interval in seconds (default 60, the dashboard's cadence).
    pub fn with_interval(mut self, secs: u64) -> Self {
        self.interval_secs = secs.max(1);
        self
    }

    /// Restrict refreshing to a subset of domains (a single active view).
    pub fn with_domains(mut self, domains: &[DomainKey]) -> Self {
        self.domains = domains.to_vec();
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Spawn the refresh tasks. Domains refresh independently and
    /// concurrently; completion order between domains is not guaranteed.
    pub fn start(self) -> RefreshHandle {
        let mut tasks = Vec::with_capacity(self.domains.len());

        for domain in self.domains {
            let cache = Arc::clone(&self.cache);
            let tx = self.broadcast_tx.clone();
            let interval_secs = self.interval_secs;

            tasks.push(tokio::spawn(async move {
                let mut ticker =
                    tokio::time::interval(std::time::Duration::from_secs(interval_secs));
                loop {
                    ticker.tick().await;
                    let outcome = cache.get(domain, false).await;
                    debug!(domain = %domain, simulated = outcome.is_simulated(), "refresh cycle");
                    // Send fails only when no renderer is subscribed; the
                    // cache is still warmed either way
                    let _ = tx.send(RefreshEvent { domain, outcome });
                }
            }));
        }

        RefreshHandle {
            tx: self.broadcast_tx,
            tasks,
        }
    }
}

/// Running scheduler. Dropping or stopping it cancels all refresh tasks.
pub struct RefreshHandle {
    tx: broadcast::Sender<RefreshEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl RefreshHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.tx.subscribe()
    }

    /// Cancel all periodic refresh tasks.
    pub fn stop(mut self) {
        self.abort_all();
    }

    fn abort_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.abort_all();
    }
}
