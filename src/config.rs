use serde::{Deserialize, Serialize};

use crate::domain::DomainKey;

/// Top-level configuration for the dashboard data client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend API endpoint (single POST endpoint, `{action, ...}` body)
    pub endpoint: String,
    /// Retry policy applied to every domain fetch
    pub retry: RetryConfig,
    /// Per-domain cache time-to-live
    pub ttl: TtlConfig,
    /// Availability monitor tuning
    pub availability: AvailabilityConfig,
    /// Serve synthetic offline payloads when no cached data exists.
    /// Disabling this makes a cold unreachable backend surface as
    /// `FetchOutcome::Failed` instead of simulated data.
    pub offline_fallback: bool,
    /// Default number of log entries requested for the activity log
    pub log_limit: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: crate::DEFAULT_ENDPOINT.to_string(),
            retry: RetryConfig::default(),
            ttl: TtlConfig::default(),
            availability: AvailabilityConfig::default(),
            offline_fallback: true,
            log_limit: 10,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }

    pub fn with_offline_fallback(mut self, enabled: bool) -> Self {
        self.offline_fallback = enabled;
        self
    }
}

/// Bounded retry with a fixed inter-attempt delay. No exponential backoff:
/// the dashboard polls on short intervals anyway, so growing delays would
/// only push recovery past the next poll.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per fetch before classifying the backend as unavailable
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds
    pub retry_delay_ms: u64,
    /// Per-attempt timeout, in milliseconds
    pub attempt_timeout_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::API_RETRY_ATTEMPTS,
            retry_delay_ms: crate::API_RETRY_DELAY_MS,
            attempt_timeout_ms: crate::API_ATTEMPT_TIMEOUT_MS,
        }
    }
}

/// Cache time-to-live per data domain, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtlConfig {
    pub system_status_ms: u64,
    pub network_status_ms: u64,
    pub threat_data_ms: u64,
    /// The activity log historically shipped with both 15 000 and 30 000 ms;
    /// 30 000 ms is the default, shorter values remain valid.
    pub activity_log_ms: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            system_status_ms: crate::DEFAULT_CACHE_TTL_MS,
            network_status_ms: crate::DEFAULT_CACHE_TTL_MS,
            threat_data_ms: crate::DEFAULT_CACHE_TTL_MS,
            activity_log_ms: crate::DEFAULT_CACHE_TTL_MS,
        }
    }
}

impl TtlConfig {
    /// TTL for one domain, in milliseconds.
    pub fn for_domain(&self, domain: DomainKey) -> u64 {
        match domain {
            DomainKey::SystemStatus => self.system_status_ms,
            DomainKey::NetworkStatus => self.network_status_ms,
            DomainKey::ThreatData => self.threat_data_ms,
            DomainKey::ActivityLog => self.activity_log_ms,
        }
    }
}

/// Availability monitor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityConfig {
    /// Retry-exhaustion events before the backend is marked unreachable.
    /// 1 means a single failed fetch cycle (all attempts spent) flips the
    /// monitor to unreachable.
    pub failure_threshold: u32,
}

impl Default for AvailabilityConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 1,
        }
    }
}
