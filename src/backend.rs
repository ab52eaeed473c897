//! The Data Backend seam.
//!
//! Everything the client knows about the outside world goes through
//! [`DataBackend`]: four domain queries, a liveness ping, and the
//! side-effecting action commands. The production implementation speaks the
//! dashboard wire protocol — a single `POST /api` endpoint with an
//! `{action, ...}` JSON body; tests substitute a mock.

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::actions::{Action, ActionResult};
use crate::config::ClientConfig;
use crate::domain::{DomainKey, DomainPayload};
use crate::error::{ClientError, ClientResult};

/// Backend collaborator answering domain queries and action commands.
#[async_trait]
pub trait DataBackend: Send + Sync {
    /// Fetch one domain's payload. Transport errors, non-2xx statuses, and
    /// backend-reported errors all surface as `Err`.
    async fn fetch_domain(&self, domain: DomainKey) -> ClientResult<DomainPayload>;

    /// Minimal liveness request; any non-error response counts as reachable.
    async fn ping(&self) -> ClientResult<()>;

    /// Fire a side-effecting action command.
    async fn execute(&self, action: &Action) -> ClientResult<ActionResult>;
}

/// HTTP implementation of [`DataBackend`].
pub struct HttpBackend {
    http: reqwest::Client,
    endpoint: String,
    log_limit: u32,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(
                config.retry.attempt_timeout_ms,
            ))
            .user_agent("HARDN-Dashboard/1.0")
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            log_limit: config.log_limit,
        })
    }

    /// POST one `{action, ...}` request and return the parsed body.
    ///
    /// A payload carrying an `error` field is a backend-reported application
    /// error and is treated the same as a transport failure.
    async fn send(&self, body: serde_json::Value) -> ClientResult<serde_json::Value> {
        let resp = self.http.post(&self.endpoint).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let value: serde_json::Value = resp.json().await?;
        if let Some(err) = value.get("error").and_then(|v| v.as_str()) {
            return Err(ClientError::Backend(err.to_string()));
        }
        Ok(value)
    }
}

#[async_trait]
impl DataBackend for HttpBackend {
    async fn fetch_domain(&self, domain: DomainKey) -> ClientResult<DomainPayload> {
        let body = match domain {
            DomainKey::ActivityLog => json!({
                "action": domain.action(),
                "limit": self.log_limit,
            }),
            _ => json!({ "action": domain.action() }),
        };

        debug!(domain = %domain, "requesting domain payload");
        let value = self.send(body).await?;
        DomainPayload::from_value(domain, value)
    }

    async fn ping(&self) -> ClientResult<()> {
        self.send(json!({ "action": "ping" })).await.map(|_| ())
    }

    async fn execute(&self, action: &Action) -> ClientResult<ActionResult> {
        debug!(action = action.action_name(), "dispatching action");
        let value = self.send(action.request_body()).await?;
        Ok(serde_json::from_value(value)?)
    }
}
