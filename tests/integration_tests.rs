//! End-to-end scenarios for the dashboard data layer:
//! - TTL fast path and expiry
//! - forced refresh bypassing cache and unreachable gate
//! - request coalescing per domain
//! - retry budget and fixed inter-attempt spacing
//! - stale-then-fallback degradation and availability recovery
//!
//! All timing-sensitive tests run under tokio paused time, so TTL ages and
//! retry delays are asserted exactly instead of approximately.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::time::{advance, Duration, Instant};

use async_trait::async_trait;
use hardn_client::{
    Action, ActionResult, ActionRunner, AvailabilityMonitor, ClientConfig, ClientError,
    ClientResult, DataBackend, DomainKey, DomainPayload, FetchGateway, FetchOutcome,
    FreshnessCache, Reachability, RefreshScheduler,
};

// ── Mock backend ─────────────────────────────────────────────────────────

struct MockBackend {
    fail: AtomicBool,
    ping_fail: AtomicBool,
    delay_ms: AtomicU64,
    calls: [AtomicU64; 4],
    pings: AtomicU64,
    attempt_at: Mutex<Vec<Instant>>,
    payloads: RwLock<HashMap<DomainKey, DomainPayload>>,
    actions_seen: Mutex<Vec<&'static str>>,
}

fn idx(domain: DomainKey) -> usize {
    match domain {
        DomainKey::SystemStatus => 0,
        DomainKey::NetworkStatus => 1,
        DomainKey::ThreatData => 2,
        DomainKey::ActivityLog => 3,
    }
}

fn sample_payload(domain: DomainKey) -> DomainPayload {
    let value = match domain {
        DomainKey::SystemStatus => serde_json::json!({
            "overall": {"status": "ok", "message": "Secure"}
        }),
        DomainKey::NetworkStatus => serde_json::json!({
            "status": "ok",
            "message": "All connections protected",
            "connections": [{"ip": "10.0.0.2", "port": 443, "type": "tcp"}]
        }),
        DomainKey::ThreatData => serde_json::json!({
            "level": 0,
            "status": "ok",
            "items": []
        }),
        DomainKey::ActivityLog => serde_json::json!({
            "logs": [{
                "level": "info",
                "message": "System check completed",
                "timestamp": "2025-01-01T00:00:00Z"
            }]
        }),
    };
    DomainPayload::from_value(domain, value).unwrap()
}

impl MockBackend {
    fn new() -> Self {
        Self {
            fail: AtomicBool::new(false),
            ping_fail: AtomicBool::new(false),
            delay_ms: AtomicU64::new(0),
            calls: [
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
                AtomicU64::new(0),
            ],
            pings: AtomicU64::new(0),
            attempt_at: Mutex::new(Vec::new()),
            payloads: RwLock::new(HashMap::new()),
            actions_seen: Mutex::new(Vec::new()),
        }
    }

    fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
        self.ping_fail.store(failing, Ordering::SeqCst);
    }

    fn set_delay_ms(&self, ms: u64) {
        self.delay_ms.store(ms, Ordering::SeqCst);
    }

    fn set_payload(&self, payload: DomainPayload) {
        self.payloads.write().insert(payload.domain(), payload);
    }

    fn calls(&self, domain: DomainKey) -> u64 {
        self.calls[idx(domain)].load(Ordering::SeqCst)
    }

    fn attempt_times(&self) -> Vec<Instant> {
        self.attempt_at.lock().clone()
    }
}

#[async_trait]
impl DataBackend for MockBackend {
    async fn fetch_domain(&self, domain: DomainKey) -> ClientResult<DomainPayload> {
        self.calls[idx(domain)].fetch_add(1, Ordering::SeqCst);
        self.attempt_at.lock().push(Instant::now());

        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("simulated outage".into()));
        }

        let stored = self.payloads.read().get(&domain).cloned();
        Ok(stored.unwrap_or_else(|| sample_payload(domain)))
    }

    async fn ping(&self) -> ClientResult<()> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.ping_fail.load(Ordering::SeqCst) {
            Err(ClientError::Backend("simulated outage".into()))
        } else {
            Ok(())
        }
    }

    async fn execute(&self, action: &Action) -> ClientResult<ActionResult> {
        self.actions_seen.lock().push(action.action_name());
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Backend("simulated outage".into()));
        }
        Ok(ActionResult {
            success: true,
            message: Some("done".into()),
        })
    }
}

fn build_cache(config: ClientConfig) -> (Arc<MockBackend>, Arc<FreshnessCache>) {
    let backend = Arc::new(MockBackend::new());
    let monitor = Arc::new(AvailabilityMonitor::new(
        config.availability.failure_threshold,
    ));
    let gateway = FetchGateway::new(
        backend.clone() as Arc<dyn DataBackend>,
        monitor,
        config.retry.clone(),
    );
    let cache = Arc::new(FreshnessCache::new(gateway, &config));
    (backend, cache)
}

fn default_cache() -> (Arc<MockBackend>, Arc<FreshnessCache>) {
    build_cache(ClientConfig::default())
}

// ── Scenario 1: TTL respect ──────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_second_get_within_ttl_hits_cache() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::SystemStatus;

    let first = cache.get(domain, false).await;
    assert!(first.is_fresh());
    assert_eq!(backend.calls(domain), 1);

    advance(Duration::from_millis(10_000)).await;
    let second = cache.get(domain, false).await;
    match second {
        FetchOutcome::Stale { age_ms, .. } => assert_eq!(age_ms, 10_000),
        other => panic!("expected stale cache hit, got {:?}", other),
    }
    assert_eq!(backend.calls(domain), 1, "cache hit must not call backend");
}

#[tokio::test(start_paused = true)]
async fn test_get_after_ttl_expiry_refetches() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::SystemStatus;

    cache.get(domain, false).await;
    advance(Duration::from_millis(30_001)).await;

    let outcome = cache.get(domain, false).await;
    assert!(outcome.is_fresh());
    assert_eq!(backend.calls(domain), 2);
}

// ── Scenario 2: force bypass ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_force_refresh_bypasses_fresh_cache() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::ThreatData;

    cache.get(domain, false).await;
    assert_eq!(backend.calls(domain), 1);

    let forced = cache.get(domain, true).await;
    assert!(forced.is_fresh());
    assert_eq!(backend.calls(domain), 2);
}

#[tokio::test(start_paused = true)]
async fn test_force_refresh_attempts_even_when_marked_unreachable() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::ThreatData;

    backend.set_failing(true);
    cache.get(domain, false).await; // exhausts retries, marks unreachable
    assert_eq!(backend.calls(domain), 3);
    assert_eq!(cache.monitor().reachability(), Reachability::Unreachable);

    // Unforced gets are gated: no further attempts
    cache.get(domain, false).await;
    assert_eq!(backend.calls(domain), 3);

    // Forced get runs exactly one more gateway cycle
    cache.get(domain, true).await;
    assert_eq!(backend.calls(domain), 6);
}

// ── Scenario 3: request coalescing ───────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_concurrent_gets_coalesce_to_one_backend_call() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::NetworkStatus;
    backend.set_delay_ms(50);

    let (a, b) = tokio::join!(cache.get(domain, false), cache.get(domain, false));

    assert_eq!(backend.calls(domain), 1, "concurrent gets must coalesce");
    let pa = a.payload().expect("first caller has payload");
    let pb = b.payload().expect("second caller has payload");
    assert_eq!(pa, pb, "both callers see the same payload");
}

#[tokio::test(start_paused = true)]
async fn test_forced_get_joins_in_flight_fetch() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::NetworkStatus;
    backend.set_delay_ms(50);

    let (a, b) = tokio::join!(cache.get(domain, false), cache.get(domain, true));
    assert_eq!(backend.calls(domain), 1, "forced call joins, not duplicates");
    assert_eq!(a.payload(), b.payload());
}

#[tokio::test(start_paused = true)]
async fn test_different_domains_fetch_independently() {
    let (backend, cache) = default_cache();
    backend.set_delay_ms(50);

    let (a, b) = tokio::join!(
        cache.get(DomainKey::SystemStatus, false),
        cache.get(DomainKey::ThreatData, false)
    );

    assert!(a.is_fresh());
    assert!(b.is_fresh());
    assert_eq!(backend.calls(DomainKey::SystemStatus), 1);
    assert_eq!(backend.calls(DomainKey::ThreatData), 1);
}

// ── Scenario 4: retry budget ─────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_failing_backend_gets_three_attempts_one_second_apart() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::ActivityLog;
    backend.set_failing(true);

    let outcome = cache.get(domain, false).await;
    assert!(outcome.is_simulated(), "cold failure degrades to fallback");
    assert_eq!(backend.calls(domain), 3);

    let times = backend.attempt_times();
    assert_eq!(times.len(), 3);
    for pair in times.windows(2) {
        let gap = pair[1].duration_since(pair[0]);
        assert!(
            gap >= Duration::from_millis(1_000) && gap <= Duration::from_millis(1_010),
            "attempts should be spaced ~1000 ms apart, got {:?}",
            gap
        );
    }
}

// ── Scenario 5: graceful degradation to stale ────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_outage_after_successful_fetch_serves_stale_not_fallback() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::NetworkStatus;

    let fresh = cache.get(domain, false).await;
    let original = fresh.payload().unwrap().clone();

    backend.set_failing(true);
    advance(Duration::from_millis(31_000)).await; // past TTL

    match cache.get(domain, false).await {
        FetchOutcome::Stale { payload, age_ms } => {
            assert_eq!(payload, original);
            assert!(age_ms >= 31_000, "staleness is disclosed, not hidden");
        }
        other => panic!("expected stale cache, got {:?}", other),
    }
}

// ── Scenario 6: cold fallback ────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_cold_unreachable_backend_yields_documented_fallback() {
    let (backend, cache) = default_cache();
    backend.set_failing(true);

    match cache.get(DomainKey::ThreatData, false).await {
        FetchOutcome::Fallback(DomainPayload::Threats(t)) => {
            assert_eq!(t.level, 1);
            assert_eq!(t.status, "warning");
        }
        other => panic!("expected threat fallback, got {:?}", other),
    }

    // Now marked unreachable: the next get short-circuits, same fallback
    let calls_before = backend.calls(DomainKey::ThreatData);
    let again = cache.get(DomainKey::ThreatData, false).await;
    assert!(again.is_simulated());
    assert_eq!(backend.calls(DomainKey::ThreatData), calls_before);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_fallback_surfaces_failed_outcome() {
    let config = ClientConfig::default().with_offline_fallback(false);
    let (backend, cache) = build_cache(config);
    backend.set_failing(true);

    match cache.get(DomainKey::ThreatData, false).await {
        FetchOutcome::Failed { reason } => assert!(reason.contains("simulated outage")),
        other => panic!("expected Failed, got {:?}", other),
    }
}

// ── Scenario 7: availability recovery ────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_single_successful_probe_recovers_reachability() {
    let (backend, cache) = default_cache();
    backend.set_failing(true);

    cache.get(DomainKey::SystemStatus, false).await;
    assert_eq!(cache.monitor().reachability(), Reachability::Unreachable);

    backend.set_failing(false);
    let reachable = cache
        .monitor()
        .probe(backend.as_ref(), hardn_client::API_ATTEMPT_TIMEOUT_MS)
        .await;
    assert!(reachable);

    let state = cache.monitor().snapshot();
    assert_eq!(state.reachability, Reachability::Reachable);
    assert_eq!(state.consecutive_failures, 0);

    // And unforced fetches flow again
    let outcome = cache.get(DomainKey::NetworkStatus, false).await;
    assert!(outcome.is_fresh());
}

#[tokio::test(start_paused = true)]
async fn test_successful_forced_fetch_also_recovers_reachability() {
    let (backend, cache) = default_cache();
    backend.set_failing(true);
    cache.get(DomainKey::SystemStatus, false).await;
    assert_eq!(cache.monitor().reachability(), Reachability::Unreachable);

    backend.set_failing(false);
    let outcome = cache.get(DomainKey::SystemStatus, true).await;
    assert!(outcome.is_fresh());
    assert_eq!(cache.monitor().reachability(), Reachability::Reachable);
}

// ── Scenario 8: end-to-end fresh → stale → outage → stale ────────────────

#[tokio::test(start_paused = true)]
async fn test_end_to_end_dashboard_session() {
    let (backend, cache) = default_cache();
    let domain = DomainKey::SystemStatus;
    backend.set_payload(
        DomainPayload::from_value(
            domain,
            serde_json::json!({"overall": {"status": "ok", "message": "Secure"}}),
        )
        .unwrap(),
    );

    // First call: fresh from the backend
    let first = cache.get(domain, false).await;
    match &first {
        FetchOutcome::Fresh(DomainPayload::System(s)) => {
            assert_eq!(s.overall.status, "ok");
            assert_eq!(s.overall.message, "Secure");
        }
        other => panic!("expected fresh system status, got {:?}", other),
    }

    // Immediate second call: cache hit, age ~0
    match cache.get(domain, false).await {
        FetchOutcome::Stale { age_ms, .. } => assert_eq!(age_ms, 0),
        other => panic!("expected immediate cache hit, got {:?}", other),
    }

    // Backend goes down; a forced refresh burns one full retry cycle
    backend.set_failing(true);
    advance(Duration::from_millis(31_000)).await;
    match cache.get(domain, true).await {
        FetchOutcome::Stale { .. } => {}
        other => panic!("expected stale after failed force, got {:?}", other),
    }
    assert_eq!(cache.monitor().reachability(), Reachability::Unreachable);

    // Unforced call with expired TTL: unreachability extends the window,
    // the original payload is served stale — never Fallback
    match cache.get(domain, false).await {
        FetchOutcome::Stale { payload, .. } => match payload {
            DomainPayload::System(s) => assert_eq!(s.overall.status, "ok"),
            other => panic!("wrong payload variant: {:?}", other),
        },
        other => panic!("expected stale, got {:?}", other),
    }
}

// ── Actions invalidate affected cache domains ────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_successful_scan_invalidates_threat_cache() {
    let (backend, cache) = default_cache();
    let runner = ActionRunner::new(
        backend.clone() as Arc<dyn DataBackend>,
        Arc::clone(&cache),
    );

    cache.get(DomainKey::ThreatData, false).await;
    assert_eq!(backend.calls(DomainKey::ThreatData), 1);

    let result = runner.run(Action::RunSecurityScan).await;
    assert!(result.success);
    assert_eq!(*backend.actions_seen.lock(), vec!["run_security_scan"]);

    // Cache was invalidated: next get within the old TTL still re-fetches
    let outcome = cache.get(DomainKey::ThreatData, false).await;
    assert!(outcome.is_fresh());
    assert_eq!(backend.calls(DomainKey::ThreatData), 2);
}

#[tokio::test(start_paused = true)]
async fn test_failed_action_is_absorbed_and_leaves_cache_alone() {
    let (backend, cache) = default_cache();
    let runner = ActionRunner::new(
        backend.clone() as Arc<dyn DataBackend>,
        Arc::clone(&cache),
    );

    cache.get(DomainKey::ThreatData, false).await;
    backend.set_failing(true);

    let result = runner.run(Action::UpdateThreatDatabase).await;
    assert!(!result.success);
    assert!(result.message.unwrap().contains("simulated outage"));

    // Cached entry survives: served without a backend call
    backend.set_failing(false);
    let outcome = cache.get(DomainKey::ThreatData, false).await;
    assert!(matches!(outcome, FetchOutcome::Stale { .. }));
    assert_eq!(backend.calls(DomainKey::ThreatData), 1);
}

// ── Refresh scheduler ────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_scheduler_publishes_refresh_events_until_stopped() {
    let (backend, cache) = default_cache();

    let scheduler = RefreshScheduler::new(Arc::clone(&cache))
        .with_domains(&[DomainKey::SystemStatus])
        .with_interval(30);
    let handle = scheduler.start();
    let mut rx = handle.subscribe();

    let event = rx.recv().await.expect("first refresh event");
    assert_eq!(event.domain, DomainKey::SystemStatus);
    assert!(event.outcome.payload().is_some());
    assert!(backend.calls(DomainKey::SystemStatus) >= 1);

    // Interval elapses, cache TTL (30 s) has expired: a new fetch happens
    advance(Duration::from_secs(31)).await;
    let event = rx.recv().await.expect("second refresh event");
    assert_eq!(event.domain, DomainKey::SystemStatus);

    let calls_at_stop = backend.calls(DomainKey::SystemStatus);
    handle.stop();
    advance(Duration::from_secs(120)).await;
    assert_eq!(
        backend.calls(DomainKey::SystemStatus),
        calls_at_stop,
        "stopped scheduler must not keep polling"
    );
}
