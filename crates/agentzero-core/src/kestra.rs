//! Thin client for the Kestra REST API plus the dashboard summaries built
//! from its execution list.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{KestraConfig, WebhookTarget};
use crate::error::{AgentZeroError, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionState {
    #[serde(default)]
    pub current: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
}

/// One execution as returned by `/api/v1/executions`. Unknown fields are
/// kept in `extra` so the executions view can pass them through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: String,
    #[serde(default)]
    pub state: ExecutionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ExecutionPage {
    #[serde(default)]
    results: Vec<Execution>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub level: String,
    #[serde(default)]
    pub message: String,
}

impl LogEntry {
    pub fn line(&self) -> String {
        format!("[{}] [{}] {}", self.timestamp, self.level, self.message)
    }
}

#[derive(Debug, Deserialize)]
struct WebhookAck {
    id: String,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Activity {
    pub id: String,
    pub state: String,
    pub date: Option<String>,
    pub trigger: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KestraStats {
    pub active_requests: usize,
    pub latest_score: Value,
    pub latest_status: Value,
    pub recent_activity: Vec<Activity>,
}

const ACTIVE_STATES: &[&str] = &["RUNNING", "CREATED"];

/// Summarize executions, newest first, for the dashboard header.
///
/// The latest MCS comes from the first execution whose
/// `outputs.calculate_mcs.vars` is present.
pub fn summarize(executions: &[Execution]) -> KestraStats {
    let active_requests = executions
        .iter()
        .filter(|e| ACTIVE_STATES.contains(&e.state.current.as_str()))
        .count();

    let mut latest_score = Value::from(0);
    let mut latest_status = Value::from("UNKNOWN");
    for exec in executions {
        if let Some(vars) = exec
            .outputs
            .as_ref()
            .and_then(|o| o.pointer("/calculate_mcs/vars"))
        {
            latest_score = vars
                .get("mcs")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::from(0));
            latest_status = vars
                .get("status")
                .filter(|v| !v.is_null())
                .cloned()
                .unwrap_or_else(|| Value::from("UNKNOWN"));
            break;
        }
    }

    let recent_activity = executions
        .iter()
        .map(|e| Activity {
            id: e.id.clone(),
            state: e.state.current.clone(),
            date: e.state.start_date.clone(),
            trigger: e
                .trigger
                .as_ref()
                .and_then(|t| t.pointer("/variables/body/sender/login"))
                .and_then(|v| v.as_str())
                .unwrap_or("System")
                .to_string(),
        })
        .collect();

    KestraStats {
        active_requests,
        latest_score,
        latest_status,
        recent_activity,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct KestraClient {
    http: reqwest::Client,
    config: KestraConfig,
}

impl KestraClient {
    pub fn new(http: reqwest::Client, config: KestraConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &KestraConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.username {
            Some(user) => req.basic_auth(user, self.config.password.as_deref()),
            None => req,
        }
    }

    /// Newest `size` executions of the configured flow.
    pub async fn executions(&self, size: usize) -> Result<Vec<Execution>> {
        let url = format!("{}/api/v1/executions", self.base());
        let size = size.to_string();
        let req = self.http.get(&url).query(&[
            ("namespace", self.config.namespace.as_str()),
            ("flowId", self.config.flow_id.as_str()),
            ("sort", "startDate:desc"),
            ("size", size.as_str()),
        ]);
        let resp = self.with_auth(req).send().await?;
        if !resp.status().is_success() {
            return Err(AgentZeroError::Kestra(format!(
                "Kestra API error: {}",
                resp.status().as_u16()
            )));
        }
        let page: ExecutionPage = resp.json().await?;
        Ok(page.results)
    }

    pub async fn logs(&self, execution_id: &str) -> Result<Vec<LogEntry>> {
        let url = format!("{}/api/v1/logs/{}", self.base(), execution_id);
        let resp = self.with_auth(self.http.get(&url)).send().await?;
        if !resp.status().is_success() {
            return Err(AgentZeroError::Kestra(format!(
                "Kestra logs error: {}",
                resp.status().as_u16()
            )));
        }
        Ok(resp.json().await?)
    }

    /// POST `payload` to a webhook trigger and return the new execution id.
    ///
    /// A non-success upstream status is reported with its body so callers
    /// can relay it verbatim.
    pub async fn trigger(&self, target: &WebhookTarget, payload: &Value) -> Result<String> {
        let url = target.url(self.base());
        tracing::info!(flow = %target.flow_id, "triggering kestra webhook");
        let resp = self
            .with_auth(self.http.post(&url))
            .json(payload)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AgentZeroError::KestraStatus {
                status: status.as_u16(),
                body,
            });
        }
        let ack: WebhookAck = resp.json().await?;
        Ok(ack.id)
    }

    /// POST a raw JSON payload to an absolute webhook URL.
    pub async fn forward(&self, url: &str, payload: &Value) -> Result<u16> {
        let resp = self
            .with_auth(self.http.post(url))
            .json(payload)
            .send()
            .await?;
        Ok(resp.status().as_u16())
    }
}
