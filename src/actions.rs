//! Side-effecting action commands.
//!
//! These are the dashboard's buttons: run a scan, update the threat
//! database, run setup tasks, toggle named security tools. Each fires one
//! backend request and, on success, invalidates the cache domains the
//! action can have changed so the next read re-fetches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::backend::DataBackend;
use crate::cache::FreshnessCache;
use crate::domain::DomainKey;

/// Named security tools the backend can run or toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityTool {
    AppArmor,
    Aide,
    Fail2Ban,
    Firejail,
    RkHunter,
}

impl SecurityTool {
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityTool::AppArmor => "apparmor",
            SecurityTool::Aide => "aide",
            SecurityTool::Fail2Ban => "fail2ban",
            SecurityTool::Firejail => "firejail",
            SecurityTool::RkHunter => "rkhunter",
        }
    }
}

/// What to do with a security tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolOperation {
    Run,
    Enable,
    Disable,
}

impl ToolOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOperation::Run => "run",
            ToolOperation::Enable => "enable",
            ToolOperation::Disable => "disable",
        }
    }
}

/// Per-component setup checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupCheck {
    Selinux,
    Firewall,
    AppArmor,
    Permissions,
}

impl SetupCheck {
    pub fn action(&self) -> &'static str {
        match self {
            SetupCheck::Selinux => "check_selinux",
            SetupCheck::Firewall => "check_firewall",
            SetupCheck::AppArmor => "check_apparmor",
            SetupCheck::Permissions => "check_permissions",
        }
    }
}

/// One side-effecting backend command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RunSecurityScan,
    UpdateThreatDatabase,
    RunNetworkAnalysis,
    RunSetup,
    RunPackages,
    SetupCheck(SetupCheck),
    Tool {
        tool: SecurityTool,
        operation: ToolOperation,
    },
}

impl Action {
    /// Wire action name.
    pub fn action_name(&self) -> &'static str {
        match self {
            Action::RunSecurityScan => "run_security_scan",
            Action::UpdateThreatDatabase => "update_threat_db",
            Action::RunNetworkAnalysis => "run_network_analysis",
            Action::RunSetup => "run_setup",
            Action::RunPackages => "run_packages",
            Action::SetupCheck(check) => check.action(),
            Action::Tool { .. } => "run_tool",
        }
    }

    /// Request body sent to the backend.
    pub fn request_body(&self) -> serde_json::Value {
        match self {
            Action::Tool { tool, operation } => json!({
                "action": self.action_name(),
                "tool": tool.as_str(),
                "operation": operation.as_str(),
            }),
            _ => json!({ "action": self.action_name() }),
        }
    }

    /// Cache domains whose data this action can change.
    pub fn affected_domains(&self) -> &'static [DomainKey] {
        match self {
            Action::RunSecurityScan => &[DomainKey::ThreatData, DomainKey::ActivityLog],
            Action::UpdateThreatDatabase => &[DomainKey::ThreatData],
            Action::RunNetworkAnalysis => &[DomainKey::NetworkStatus, DomainKey::ActivityLog],
            Action::RunSetup
            | Action::RunPackages
            | Action::SetupCheck(_)
            | Action::Tool { .. } => &[DomainKey::SystemStatus, DomainKey::ActivityLog],
        }
    }
}

/// Backend response to an action command.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Executes actions and keeps the cache honest afterwards.
pub struct ActionRunner {
    backend: Arc<dyn DataBackend>,
    cache: Arc<FreshnessCache>,
}

impl ActionRunner {
    pub fn new(backend: Arc<dyn DataBackend>, cache: Arc<FreshnessCache>) -> Self {
        Self { backend, cache }
    }

    /// Fire one action. Failures are absorbed into an unsuccessful
    /// [`ActionResult`], never raised — the renderer turns them into a
    /// toast, not a crash.
    pub async fn run(&self, action: Action) -> ActionResult {
        match self.backend.execute(&action).await {
            Ok(result) => {
                if result.success {
                    info!(action = action.action_name(), "action completed");
                    // The action reached the backend, so it is reachable
                    self.cache.monitor().report_success();
                    for domain in action.affected_domains() {
                        self.cache.invalidate(*domain);
                    }
                } else {
                    warn!(
                        action = action.action_name(),
                        message = result.message.as_deref().unwrap_or(""),
                        "action reported failure"
                    );
                }
                result
            }
            Err(e) => {
                warn!(action = action.action_name(), error = %e, "action request failed");
                ActionResult {
                    success: false,
                    message: Some(e.to_string()),
                }
            }
        }
    }
}
