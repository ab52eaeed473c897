//! # HARDN Client — Dashboard data layer
//!
//! The backend-facing core of the HARDN security dashboard: everything
//! between "a view wants data" and "bytes on the wire", with the rendering
//! left to an external subscriber.
//!
//! Three cooperating pieces:
//! - **[`FreshnessCache`]** — per-domain TTL cache; decides cache hit vs.
//!   network, coalesces concurrent requests, degrades to stale then
//!   synthetic offline data instead of erroring
//! - **[`FetchGateway`]** — bounded retry (3 attempts, fixed 1 s delay,
//!   3 s per-attempt timeout) and outcome classification
//! - **[`AvailabilityMonitor`]** — reachable/unreachable state machine fed
//!   by fetch results and liveness pings; gates whether fetches are even
//!   attempted
//!
//! Plus the surrounding plumbing the dashboard needs: the
//! [`DataBackend`] wire protocol ([`HttpBackend`] speaks `POST /api` with
//! `{action, ...}` bodies), periodic refresh tasks
//! ([`RefreshScheduler`]), and side-effecting action commands
//! ([`ActionRunner`]).
//!
//! ## Assembly
//!
//! ```no_run
//! use std::sync::Arc;
//! use hardn_client::{
//!     AvailabilityMonitor, ClientConfig, DomainKey, FetchGateway, FreshnessCache, HttpBackend,
//! };
//!
//! # async fn assemble() -> hardn_client::ClientResult<()> {
//! let config = ClientConfig::default();
//! let backend = Arc::new(HttpBackend::new(&config)?);
//! let monitor = Arc::new(AvailabilityMonitor::new(config.availability.failure_threshold));
//! let gateway = FetchGateway::new(backend, monitor, config.retry.clone());
//! let cache = Arc::new(FreshnessCache::new(gateway, &config));
//!
//! let outcome = cache.get(DomainKey::SystemStatus, false).await;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod availability;
pub mod backend;
pub mod cache;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod refresh;

pub use actions::{Action, ActionResult, ActionRunner, SecurityTool, SetupCheck, ToolOperation};
pub use availability::{AvailabilityMonitor, AvailabilityState, Reachability};
pub use backend::{DataBackend, HttpBackend};
pub use cache::FreshnessCache;
pub use config::{AvailabilityConfig, ClientConfig, RetryConfig, TtlConfig};
pub use domain::{DomainKey, DomainPayload, FetchOutcome};
pub use error::{ClientError, ClientResult};
pub use gateway::{FetchGateway, GatewayResult};
pub use refresh::{RefreshEvent, RefreshHandle, RefreshScheduler};

/// Default backend API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8081/api";

/// Attempts per fetch cycle before the backend counts as unavailable
pub const API_RETRY_ATTEMPTS: u32 = 3;

/// Fixed delay between retry attempts (milliseconds)
pub const API_RETRY_DELAY_MS: u64 = 1_000;

/// Per-attempt timeout (milliseconds)
pub const API_ATTEMPT_TIMEOUT_MS: u64 = 3_000;

/// Default cache TTL for every domain (milliseconds)
pub const DEFAULT_CACHE_TTL_MS: u64 = 30_000;

/// Default periodic refresh interval (seconds)
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
