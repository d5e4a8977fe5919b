use agentzero_core::models::NewHistory;
use agentzero_core::types::AiTask;
use serde_json::{json, Value};

use crate::error::RelayError;
use crate::settings::Settings;
use crate::Result;

/// HTTP client for the dashboard API at `Settings::dashboard_url`.
#[derive(Clone)]
pub struct DashboardClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl DashboardClient {
    pub fn new(http: reqwest::Client, settings: &Settings) -> Self {
        Self {
            http,
            base_url: settings.dashboard_url.trim_end_matches('/').to_string(),
            token: settings.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.post(format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.http.get(format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// POST `/ai/{analyze|explain|scan}`.
    pub async fn ai(&self, task: AiTask, code: &str, model: Option<&str>) -> Result<Value> {
        let resp = self
            .post(&format!("/ai/{task}"))
            .json(&json!({ "code": code, "model": model }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Upstream(format!(
                "AI API failed ({}): {text}",
                status.as_u16()
            )));
        }
        Ok(resp.json().await?)
    }

    /// POST `/mcs-score` with the scraped PR data.
    pub async fn mcs_score(&self, data: &Value) -> Result<Value> {
        let resp = self.post("/mcs-score").json(data).send().await?;
        if !resp.status().is_success() {
            return Err(RelayError::Upstream("Failed to fetch MCS score".to_string()));
        }
        Ok(resp.json().await?)
    }

    /// POST `/history`.
    pub async fn record_history(&self, entry: &NewHistory) -> Result<()> {
        let resp = self.post("/history").json(entry).send().await?;
        if !resp.status().is_success() {
            return Err(RelayError::Upstream(format!(
                "history write rejected: {}",
                resp.status().as_u16()
            )));
        }
        Ok(())
    }

    /// GET `/auth/status`. `None` when the dashboard does not report a session.
    pub async fn auth_status(&self) -> Result<Option<Value>> {
        let resp = self.get("/auth/status").send().await?;
        if !resp.status().is_success() {
            return Ok(None);
        }
        Ok(Some(resp.json().await?))
    }
}
