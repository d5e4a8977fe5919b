use agentzero_core::kestra::{self, Execution, KestraStats};
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::error::AppError;
use crate::state::AppState;

const EXECUTIONS_PAGE: usize = 20;
const STATS_WINDOW: usize = 5;

/// GET /api/kestra/executions: newest executions of the configured flow.
pub async fn list_executions(
    State(app): State<AppState>,
) -> Result<Json<Vec<Execution>>, AppError> {
    Ok(Json(app.kestra.executions(EXECUTIONS_PAGE).await?))
}

/// GET /api/kestra/stats: dashboard header counters.
pub async fn stats(State(app): State<AppState>) -> Result<Json<KestraStats>, AppError> {
    let executions = app.kestra.executions(STATS_WINDOW).await?;
    Ok(Json(kestra::summarize(&executions)))
}

/// GET /api/kestra/logs: log lines of the newest execution.
pub async fn logs(State(app): State<AppState>) -> Result<Json<serde_json::Value>, AppError> {
    let executions = app.kestra.executions(1).await?;
    let Some(latest) = executions.first() else {
        return Ok(Json(json!({ "logs": ["No executions found."] })));
    };
    let lines: Vec<String> = app
        .kestra
        .logs(&latest.id)
        .await?
        .iter()
        .map(|entry| entry.line())
        .collect();
    Ok(Json(json!({ "executionId": latest.id, "logs": lines })))
}

#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub pr_number: Option<u64>,
}

/// POST /api/kestra/trigger: start the demo analysis flow.
///
/// The body is optional; without one the configured demo repository is used.
pub async fn trigger(
    State(app): State<AppState>,
    body: Option<Json<TriggerRequest>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    let config = app.kestra.config();
    let payload = json!({
        "repository": req.repository.unwrap_or_else(|| config.demo_repository.clone()),
        "pr_number": req.pr_number.unwrap_or(config.demo_pr_number),
    });
    let target = config.trigger.clone();
    let id = app.kestra.trigger(&target, &payload).await?;
    tracing::info!(execution_id = %id, "demo flow triggered");
    Ok(Json(json!({ "success": true, "executionId": id })))
}
