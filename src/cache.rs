//! Freshness cache: the single answer to "give me domain D's data".
//!
//! Every view used to hand-roll its own `now - lastUpdate < TTL` check;
//! this is that logic once, with the degradation ladder attached:
//!
//! 1. TTL-valid cache hit → served immediately, no network
//! 2. miss/expired/forced → one coalesced gateway fetch
//! 3. gateway unavailable, cache exists → stale data, age disclosed
//! 4. gateway unavailable, no cache → synthetic offline payload

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::availability::AvailabilityMonitor;
use crate::config::ClientConfig;
use crate::domain::{DomainKey, DomainPayload, FetchOutcome};
use crate::gateway::{FetchGateway, GatewayResult};

/// Last successful payload for one domain. Replaced atomically on fetch
/// completion, never partially updated.
struct CacheEntry {
    payload: DomainPayload,
    fetched_at: Instant,
}

/// Session-owned cache over a [`FetchGateway`].
///
/// Shared behind `Arc` between views and the refresh scheduler. The entry
/// map is only mutated after an awaited fetch completes, so interleaved
/// tasks never observe partial state.
pub struct FreshnessCache {
    entries: RwLock<HashMap<DomainKey, CacheEntry>>,
    /// Per-domain coalescing locks: at most one in-flight fetch per domain
    inflight: [Mutex<()>; 4],
    /// Bumped on every entry insert; used to detect a fetch that completed
    /// while a caller was waiting on the coalescing lock
    fetch_seq: [AtomicU64; 4],
    gateway: FetchGateway,
    ttl_ms: [u64; 4],
    offline_fallback: bool,
}

impl FreshnessCache {
    pub fn new(gateway: FetchGateway, config: &ClientConfig) -> Self {
        let ttl_ms = [
            config.ttl.for_domain(DomainKey::SystemStatus),
            config.ttl.for_domain(DomainKey::NetworkStatus),
            config.ttl.for_domain(DomainKey::ThreatData),
            config.ttl.for_domain(DomainKey::ActivityLog),
        ];
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: [Mutex::new(()), Mutex::new(()), Mutex::new(()), Mutex::new(())],
            fetch_seq: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            gateway,
            ttl_ms,
            offline_fallback: config.offline_fallback,
        }
    }

    /// The availability monitor backing this cache's gateway, for manual
    /// retry surfaces (reset + probe).
    pub fn monitor(&self) -> &Arc<AvailabilityMonitor> {
        self.gateway.monitor()
    }

    /// Get domain data, honoring TTL and the degradation ladder.
    ///
    /// `force_refresh` bypasses the TTL fast path and the unreachable gate,
    /// so a manual retry genuinely hits the network. Concurrent calls for
    /// the same domain coalesce onto one backend fetch; a call (forced or
    /// not) that arrives while a fetch is in flight joins its result.
    pub async fn get(&self, domain: DomainKey, force_refresh: bool) -> FetchOutcome {
        let ttl = self.ttl_ms[domain.index()];

        if !force_refresh {
            if let Some((payload, age_ms)) = self.snapshot(domain) {
                if age_ms < ttl {
                    debug!(domain = %domain, age_ms, "serving TTL-valid cache hit");
                    return FetchOutcome::Stale { payload, age_ms };
                }
            }
        }

        let seq_before = self.fetch_seq[domain.index()].load(Ordering::Acquire);
        let _inflight = self.inflight[domain.index()].lock().await;

        // Another task's fetch completed while we waited: join its result
        if self.fetch_seq[domain.index()].load(Ordering::Acquire) != seq_before {
            if let Some((payload, age_ms)) = self.snapshot(domain) {
                debug!(domain = %domain, "joined in-flight fetch result");
                return FetchOutcome::Stale { payload, age_ms };
            }
        }

        match self.gateway.fetch(domain, force_refresh).await {
            GatewayResult::Success(payload) => {
                self.store(domain, payload.clone());
                FetchOutcome::Fresh(payload)
            }
            GatewayResult::Unavailable(reason) => {
                if let Some((payload, age_ms)) = self.snapshot(domain) {
                    info!(domain = %domain, age_ms, "backend unavailable, serving stale cache");
                    return FetchOutcome::Stale { payload, age_ms };
                }
                if self.offline_fallback {
                    info!(domain = %domain, "backend unavailable, serving offline fallback");
                    FetchOutcome::Fallback(DomainPayload::fallback(domain))
                } else {
                    FetchOutcome::Failed { reason }
                }
            }
        }
    }

    /// Drop the cached entry for one domain so the next `get` re-fetches.
    pub fn invalidate(&self, domain: DomainKey) {
        if self.entries.write().remove(&domain).is_some() {
            debug!(domain = %domain, "cache entry invalidated");
        }
    }

    /// Drop all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.write().clear();
    }

    /// Age of the cached entry for `domain`, if one exists.
    pub fn age_ms(&self, domain: DomainKey) -> Option<u64> {
        self.snapshot(domain).map(|(_, age)| age)
    }

    fn snapshot(&self, domain: DomainKey) -> Option<(DomainPayload, u64)> {
        let entries = self.entries.read();
        entries.get(&domain).map(|entry| {
            let age_ms = entry.fetched_at.elapsed().as_millis() as u64;
            (entry.payload.clone(), age_ms)
        })
    }

    fn store(&self, domain: DomainKey, payload: DomainPayload) {
        let mut entries = self.entries.write();
        entries.insert(
            domain,
            CacheEntry {
                payload,
                fetched_at: Instant::now(),
            },
        );
        self.fetch_seq[domain.index()].fetch_add(1, Ordering::Release);
    }
}
