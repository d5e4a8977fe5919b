use agentzero_core::models::ReportPatch;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::{ApiJson, AppError};
use crate::state::AppState;

const REPORT_LIMIT: usize = 50;

/// GET /api/reports: newest reports by timestamp.
pub async fn list_reports(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let reports = tokio::task::spawn_blocking(move || store.list_reports(REPORT_LIMIT))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    Ok(Json(json!({ "success": true, "data": reports })))
}

/// GET /api/reports/{execution_id}
pub async fn get_report(
    State(app): State<AppState>,
    Path(execution_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let report = tokio::task::spawn_blocking(move || store.get_report(&execution_id))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(json!({ "success": true, "data": report })))
}

/// POST /api/reports: upsert by `executionId`. Posting the same execution
/// again updates the stored report.
pub async fn upsert_report(
    State(app): State<AppState>,
    ApiJson(patch): ApiJson<ReportPatch>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let (report, outcome) = tokio::task::spawn_blocking(move || store.upsert_report(patch))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(|e| AppError::bad_request(e.to_string()))?;
    tracing::info!(execution_id = %report.execution_id, ?outcome, "report stored");
    Ok(Json(json!({ "success": true, "data": report })))
}
