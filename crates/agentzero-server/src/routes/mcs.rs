use agentzero_core::aggregate::{self, AggregateScore, Signals};
use agentzero_core::types::McsRequest;
use agentzero_core::{mcs, prompt};
use axum::extract::State;
use axum::Json;

use crate::auth::MaybeUser;
use crate::error::{ApiJson, AppError};
use crate::state::AppState;

/// POST /api/mcs-score: LLM-scored merge readiness of a pull request.
pub async fn score(
    State(app): State<AppState>,
    MaybeUser(user): MaybeUser,
    ApiJson(req): ApiJson<McsRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let key = super::user_gemini_key(&app, user.as_ref()).await?;
    let prompt = prompt::mcs_prompt(&req);
    let raw = app.gemini.generate(&prompt, None, key.as_deref()).await?;
    tracing::info!(title = %req.title, "mcs score computed");
    Ok(Json(mcs::interpret_response(&raw, &req.description)))
}

/// POST /api/mcs/aggregate: weighted score from CI and review signals.
pub async fn aggregate(ApiJson(signals): ApiJson<Signals>) -> Json<AggregateScore> {
    Json(aggregate::compute(&signals))
}
