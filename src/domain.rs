//! Data domains and their typed payloads.
//!
//! Each dashboard view reads exactly one domain. Payload shapes mirror what
//! the backend actually sends, with optional fields where the backend omits
//! them; validation happens once at the backend boundary instead of at every
//! render site.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// One independently cacheable category of backend data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DomainKey {
    SystemStatus,
    NetworkStatus,
    ThreatData,
    ActivityLog,
}

impl DomainKey {
    /// All domains, in dashboard order. A full-dashboard refresh walks this.
    pub const ALL: [DomainKey; 4] = [
        DomainKey::SystemStatus,
        DomainKey::NetworkStatus,
        DomainKey::ThreatData,
        DomainKey::ActivityLog,
    ];

    /// Wire action for the backend request.
    pub fn action(&self) -> &'static str {
        match self {
            DomainKey::SystemStatus => "get_system_status",
            DomainKey::NetworkStatus => "network_status",
            DomainKey::ThreatData => "threats",
            DomainKey::ActivityLog => "get_logs",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKey::SystemStatus => "system_status",
            DomainKey::NetworkStatus => "network_status",
            DomainKey::ThreatData => "threat_data",
            DomainKey::ActivityLog => "activity_log",
        }
    }

    /// Index into per-domain slots (coalescing locks, counters).
    pub(crate) fn index(&self) -> usize {
        match self {
            DomainKey::SystemStatus => 0,
            DomainKey::NetworkStatus => 1,
            DomainKey::ThreatData => 2,
            DomainKey::ActivityLog => 3,
        }
    }
}

impl std::fmt::Display for DomainKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one security component (SELinux, firewall, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Overall + per-component security status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemStatus {
    pub overall: ComponentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selinux: Option<ComponentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall: Option<ComponentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparmor: Option<ComponentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<ComponentStatus>,
    /// e.g. "virtual_machine" when the backend detects a VM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

/// One active network connection as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkConnection {
    pub ip: String,
    pub port: u16,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Network protection status plus active connections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub connections: Vec<NetworkConnection>,
}

/// One detected threat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatItem {
    pub level: i64,
    pub description: String,
}

/// Current threat level and detected items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThreatData {
    pub level: i64,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_threats: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    #[serde(default)]
    pub items: Vec<ThreatItem>,
}

/// One activity log entry. Timestamps are passed through as the backend
/// sends them (RFC 3339 strings); formatting is the renderer's job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Recent activity log entries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityLog {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

/// Tagged payload, one variant per domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum DomainPayload {
    System(SystemStatus),
    Network(NetworkStatus),
    Threats(ThreatData),
    Logs(ActivityLog),
}

impl DomainPayload {
    /// Which domain this payload belongs to.
    pub fn domain(&self) -> DomainKey {
        match self {
            DomainPayload::System(_) => DomainKey::SystemStatus,
            DomainPayload::Network(_) => DomainKey::NetworkStatus,
            DomainPayload::Threats(_) => DomainKey::ThreatData,
            DomainPayload::Logs(_) => DomainKey::ActivityLog,
        }
    }

    /// Validate a raw backend response body into the typed payload for
    /// `domain`. This is the single place duck-typed JSON becomes a struct.
    pub fn from_value(domain: DomainKey, value: serde_json::Value) -> ClientResult<Self> {
        let map_err = |source| ClientError::Payload {
            domain: domain.as_str(),
            source,
        };
        Ok(match domain {
            DomainKey::SystemStatus => {
                DomainPayload::System(serde_json::from_value(value).map_err(map_err)?)
            }
            DomainKey::NetworkStatus => {
                DomainPayload::Network(serde_json::from_value(value).map_err(map_err)?)
            }
            DomainKey::ThreatData => {
                DomainPayload::Threats(serde_json::from_value(value).map_err(map_err)?)
            }
            DomainKey::ActivityLog => {
                DomainPayload::Logs(serde_json::from_value(value).map_err(map_err)?)
            }
        })
    }

    /// Synthetic offline payload for `domain`, clearly marked as simulated.
    pub fn fallback(domain: DomainKey) -> Self {
        match domain {
            DomainKey::SystemStatus => DomainPayload::System(SystemStatus {
                overall: ComponentStatus {
                    status: "warning".into(),
                    message: "System running in offline mode".into(),
                },
                selinux: None,
                firewall: None,
                apparmor: None,
                permissions: None,
                environment: None,
            }),
            DomainKey::NetworkStatus => DomainPayload::Network(NetworkStatus {
                status: "warning".into(),
                message: "Network monitoring unavailable".into(),
                connections: Vec::new(),
            }),
            DomainKey::ThreatData => DomainPayload::Threats(ThreatData {
                level: 1,
                status: "warning".into(),
                active_threats: None,
                last_update: None,
                items: Vec::new(),
            }),
            DomainKey::ActivityLog => DomainPayload::Logs(ActivityLog {
                logs: vec![
                    LogEntry {
                        level: "warning".into(),
                        message: "Backend connectivity issue".into(),
                        timestamp: Utc::now().to_rfc3339(),
                        details: Some(
                            "Unable to connect to backend services. Showing simulated data."
                                .into(),
                        ),
                    },
                    LogEntry {
                        level: "info".into(),
                        message: "System running in offline mode".into(),
                        timestamp: Utc::now().to_rfc3339(),
                        details: Some(
                            "Dashboard is displaying simulated data for demonstration purposes."
                                .into(),
                        ),
                    },
                ],
            }),
        }
    }
}

/// Result of asking the cache for a domain.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// New data just retrieved from the backend
    Fresh(DomainPayload),
    /// Cached data reused: within TTL, or force-stale because the backend
    /// is unreachable. Age is disclosed, never hidden.
    Stale { payload: DomainPayload, age_ms: u64 },
    /// Synthetic offline payload; no real data exists for this domain
    Fallback(DomainPayload),
    /// Retries exhausted with no cache and offline fallback disabled
    Failed { reason: String },
}

impl FetchOutcome {
    /// The payload, if this outcome carries one.
    pub fn payload(&self) -> Option<&DomainPayload> {
        match self {
            FetchOutcome::Fresh(p) => Some(p),
            FetchOutcome::Stale { payload, .. } => Some(payload),
            FetchOutcome::Fallback(p) => Some(p),
            FetchOutcome::Failed { .. } => None,
        }
    }

    /// True when the renderer should show a "simulated/offline" indicator.
    pub fn is_simulated(&self) -> bool {
        matches!(self, FetchOutcome::Fallback(_))
    }

    /// True when the payload came from the backend this call (not cache).
    pub fn is_fresh(&self) -> bool {
        matches!(self, FetchOutcome::Fresh(_))
    }
}
