use agentzero_core::models::{HistoryRecord, NewHistory};
use axum::extract::State;
use axum::Json;

use crate::auth::CurrentUser;
use crate::error::{ApiJson, AppError};
use crate::state::AppState;

const HISTORY_LIMIT: usize = 10;

/// GET /api/history: the caller's newest records.
pub async fn list_history(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<HistoryRecord>>, AppError> {
    let store = app.store.clone();
    let records = tokio::task::spawn_blocking(move || {
        store.list_history(&user.email, HISTORY_LIMIT)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(records))
}

/// POST /api/history: record an analysis for the caller.
pub async fn create_history(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(body): ApiJson<NewHistory>,
) -> Result<Json<HistoryRecord>, AppError> {
    let store = app.store.clone();
    let record = tokio::task::spawn_blocking(move || store.insert_history(&user.email, body))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(record))
}
