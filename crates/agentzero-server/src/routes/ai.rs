use agentzero_core::ai::{self, CodeRequest};
use agentzero_core::types::AiTask;
use axum::extract::State;
use axum::Json;

use crate::auth::MaybeUser;
use crate::error::{ApiJson, AppError};
use crate::state::AppState;

async fn run(
    app: AppState,
    user: MaybeUser,
    req: CodeRequest,
    task: AiTask,
) -> Result<Json<serde_json::Value>, AppError> {
    req.validate()?;
    let key = super::user_gemini_key(&app, user.0.as_ref()).await?;
    let model = req.model_or(app.gemini.default_model()).to_string();
    let raw = app
        .gemini
        .generate(&req.prompt(task), Some(&model), key.as_deref())
        .await?;
    tracing::info!(%task, model = %model, code_len = req.code.len(), "ai request complete");
    Ok(Json(ai::interpret_response(task, &raw)))
}

/// POST /api/ai/analyze
pub async fn analyze(
    State(app): State<AppState>,
    user: MaybeUser,
    ApiJson(req): ApiJson<CodeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    run(app, user, req, AiTask::Analyze).await
}

/// POST /api/ai/explain
pub async fn explain(
    State(app): State<AppState>,
    user: MaybeUser,
    ApiJson(req): ApiJson<CodeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    run(app, user, req, AiTask::Explain).await
}

/// POST /api/ai/scan
pub async fn scan(
    State(app): State<AppState>,
    user: MaybeUser,
    ApiJson(req): ApiJson<CodeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    run(app, user, req, AiTask::Scan).await
}
