use std::time::Duration;

use agentzero_core::config::{KestraConfig, WebhookTarget};
use agentzero_core::kestra::KestraClient;
use agentzero_core::models::NewHistory;
use agentzero_core::parse::with_success;
use agentzero_core::types::{AiTask, McsBadge, McsData};
use agentzero_core::AgentZeroError;
use serde_json::{json, Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::DashboardClient;
use crate::error::RelayError;
use crate::framing;
use crate::message::{AnalysisTrigger, AutoFixTrigger, RelayMessage};
use crate::normalize::normalize;
use crate::settings::{Settings, SettingsStore};
use crate::Result;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);
const EXTENSION_LOGIN: &str = "chrome-extension-user";
const SNIPPET_REPO: &str = "Unknown (Snippet)";
const SNIPPET_FILE: &str = "Snippet";

fn failure(error: impl Into<String>) -> Value {
    json!({ "success": false, "error": error.into() })
}

/// Routes extension messages to the dashboard API or Kestra.
pub struct Relay {
    store: SettingsStore,
    http: reqwest::Client,
}

impl Relay {
    pub fn new(store: SettingsStore) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self { store, http })
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Answer one message. Always returns an object carrying `success`.
    pub async fn handle(&self, raw: Value) -> Value {
        if raw.get("type").and_then(Value::as_str).is_none() {
            return failure("Unknown message type");
        }
        let msg: RelayMessage = match serde_json::from_value(raw) {
            Ok(m) => m,
            Err(e) => return failure(format!("invalid message: {e}")),
        };
        match self.dispatch(msg).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("relay message failed: {e}");
                failure(e.to_string())
            }
        }
    }

    async fn dispatch(&self, msg: RelayMessage) -> Result<Value> {
        match msg {
            RelayMessage::GetConfig => {
                let config = self.store.settings()?;
                Ok(json!({ "success": true, "config": config }))
            }
            RelayMessage::UpdateConfig { config } => {
                let merged = self.store.update_settings(config)?;
                Ok(json!({ "success": true, "config": merged }))
            }
            RelayMessage::TriggerAnalysis { data } => self.trigger_analysis(data).await,
            RelayMessage::GetMcsScore { data } => self.mcs_score(&data).await,
            RelayMessage::TriggerAutoFix { data } => self.trigger_auto_fix(data).await,
            RelayMessage::CheckAuth => Ok(self.check_auth().await),
            RelayMessage::AnalyzeCode { code, model } => {
                self.ai(AiTask::Analyze, code, model).await
            }
            RelayMessage::ExplainCode { code, model } => {
                self.ai(AiTask::Explain, code, model).await
            }
            RelayMessage::SecurityScan { code, model } => self.ai(AiTask::Scan, code, model).await,
            RelayMessage::Unknown => Ok(failure("Unknown message type")),
        }
    }

    fn dashboard(&self, settings: &Settings) -> DashboardClient {
        DashboardClient::new(self.http.clone(), settings)
    }

    fn kestra(&self, settings: &Settings) -> KestraClient {
        let config = KestraConfig {
            base_url: settings.kestra_url.clone(),
            ..KestraConfig::default()
        };
        KestraClient::new(self.http.clone(), config)
    }

    async fn post_flow(
        &self,
        settings: &Settings,
        target: &WebhookTarget,
        payload: &Value,
        failed: impl FnOnce(u16) -> String,
    ) -> Result<Value> {
        match self.kestra(settings).trigger(target, payload).await {
            Ok(id) => Ok(json!({ "success": true, "executionId": id })),
            Err(AgentZeroError::KestraStatus { status, .. }) => {
                Err(RelayError::Upstream(failed(status)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn trigger_analysis(&self, data: AnalysisTrigger) -> Result<Value> {
        let settings = self.store.settings()?;
        let payload = json!({
            "repository": { "full_name": data.repository },
            "sender": { "login": EXTENSION_LOGIN },
            "pull_request": data.pull_request,
            "trigger_source": "chrome_extension",
        });
        let target = KestraConfig::default().analysis;
        self.post_flow(&settings, &target, &payload, |status| {
            format!("Kestra API failed: {status}")
        })
        .await
    }

    async fn trigger_auto_fix(&self, data: AutoFixTrigger) -> Result<Value> {
        let settings = self.store.settings()?;
        let payload = json!({
            "repository": data.repository,
            "issue": data.issue,
            "model": settings.selected_models.auto_fix,
        });
        let target = KestraConfig::default().auto_fix;
        self.post_flow(&settings, &target, &payload, |_| "Auto-fix failed".to_string())
            .await
    }

    async fn mcs_score(&self, data: &Value) -> Result<Value> {
        let settings = self.store.settings()?;
        let result = self.dashboard(&settings).mcs_score(data).await?;
        let mcs = McsData::from_response(&result);
        let badge = McsBadge::from_data(mcs.as_ref());
        Ok(json!({
            "success": true,
            "mcsScore": mcs.as_ref().map(|m| m.score),
            "status": mcs.as_ref().map(|m| m.status),
            "reasoning": result.get("reasoning"),
            "risks": result.get("risks"),
            "lastUpdated": mcs.as_ref().map(|m| m.last_updated),
            "badge": badge,
        }))
    }

    async fn check_auth(&self) -> Value {
        let settings = match self.store.settings() {
            Ok(s) => s,
            Err(e) => return failure(e.to_string()),
        };
        match self.dashboard(&settings).auth_status().await {
            Ok(Some(status)) => json!({
                "success": true,
                "authenticated": status.get("authenticated").cloned().unwrap_or(Value::Bool(false)),
                "user": status.get("user"),
            }),
            Ok(None) => failure("Auth check failed"),
            Err(e) => {
                tracing::debug!("auth check error: {e}");
                failure("Auth check error")
            }
        }
    }

    async fn ai(&self, task: AiTask, code: String, model: Option<String>) -> Result<Value> {
        let settings = self.store.settings()?;
        let dashboard = self.dashboard(&settings);
        let data = dashboard.ai(task, &code, model.as_deref()).await?;

        let result = normalize(task, &code, &data);
        self.store.set_last_analysis(&result)?;

        let entry = NewHistory {
            repo: Some(SNIPPET_REPO.to_string()),
            file: Some(SNIPPET_FILE.to_string()),
            kind: Some(task.to_string()),
            summary: Some(if result.summary.is_empty() {
                "AI Analysis".to_string()
            } else {
                result.summary.clone()
            }),
        };
        tokio::spawn(async move {
            if let Err(e) = dashboard.record_history(&entry).await {
                tracing::warn!("failed to save history: {e}");
            }
        });

        let fields = match data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(with_success(fields))
    }

    /// Serve native-messaging frames until the extension closes the pipe.
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        loop {
            let msg = match framing::read_frame(&mut reader).await {
                Ok(Some(msg)) => msg,
                Ok(None) => break,
                Err(RelayError::Json(e)) => {
                    framing::write_frame(&mut writer, &failure(format!("invalid JSON: {e}")))
                        .await?;
                    continue;
                }
                Err(e) => return Err(e),
            };
            let reply = self.handle(msg).await;
            match framing::write_frame(&mut writer, &reply).await {
                Ok(()) => {}
                Err(RelayError::FrameTooLarge { size, limit }) => {
                    tracing::warn!(size, limit, "reply too large for native messaging");
                    let msg = format!("response of {size} bytes exceeds the {limit} byte limit");
                    framing::write_frame(&mut writer, &failure(msg)).await?;
                }
                Err(e) => return Err(e),
            }
        }
        tracing::info!("extension closed the channel");
        Ok(())
    }
}
