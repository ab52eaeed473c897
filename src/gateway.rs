//! Fetch gateway: bounded retry against the backend, with availability
//! gating. All network-layer failures are absorbed here and classified —
//! callers only ever see `Success` or `Unavailable`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::availability::AvailabilityMonitor;
use crate::backend::DataBackend;
use crate::config::RetryConfig;
use crate::domain::{DomainKey, DomainPayload};
use crate::error::ClientError;

/// Classified result of one gateway fetch cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayResult {
    Success(DomainPayload),
    Unavailable(String),
}

/// Issues domain requests with a fixed-delay retry budget.
pub struct FetchGateway {
    backend: Arc<dyn DataBackend>,
    monitor: Arc<AvailabilityMonitor>,
    retry: RetryConfig,
}

impl FetchGateway {
    pub fn new(
        backend: Arc<dyn DataBackend>,
        monitor: Arc<AvailabilityMonitor>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            backend,
            monitor,
            retry,
        }
    }

    pub fn monitor(&self) -> &Arc<AvailabilityMonitor> {
        &self.monitor
    }

    /// Run one fetch cycle for `domain`: up to `max_attempts` attempts with a
    /// fixed delay between them, each bounded by the per-attempt timeout.
    ///
    /// When the monitor already reports the backend unreachable the cycle is
    /// skipped entirely (no point adding latency to every view refresh) —
    /// unless `bypass_gate` is set, which the manual-retry / force-refresh
    /// path uses so recovery can actually be observed.
    pub async fn fetch(&self, domain: DomainKey, bypass_gate: bool) -> GatewayResult {
        if !bypass_gate && !self.monitor.is_reachable() {
            debug!(domain = %domain, "skipping fetch, backend marked unreachable");
            return GatewayResult::Unavailable("backend down".into());
        }

        let timeout = Duration::from_millis(self.retry.attempt_timeout_ms);
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            match tokio::time::timeout(timeout, self.backend.fetch_domain(domain)).await {
                Ok(Ok(payload)) => {
                    self.monitor.report_success();
                    return GatewayResult::Success(payload);
                }
                Ok(Err(e)) => {
                    last_error = e.to_string();
                    warn!(
                        domain = %domain,
                        attempt,
                        max = self.retry.max_attempts,
                        error = %last_error,
                        "domain fetch attempt failed"
                    );
                }
                Err(_) => {
                    last_error = ClientError::Timeout(self.retry.attempt_timeout_ms).to_string();
                    warn!(
                        domain = %domain,
                        attempt,
                        max = self.retry.max_attempts,
                        "domain fetch attempt timed out"
                    );
                }
            }

            if attempt < self.retry.max_attempts {
                tokio::time::sleep(Duration::from_millis(self.retry.retry_delay_ms)).await;
            }
        }

        self.monitor.report_failure();
        GatewayResult::Unavailable(last_error)
    }
}
