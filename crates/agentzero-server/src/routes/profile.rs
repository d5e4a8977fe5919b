use agentzero_core::models::{ProfileUpdate, User};
use axum::extract::State;
use axum::Json;

use crate::auth::CurrentUser;
use crate::error::{ApiJson, AppError};
use crate::state::AppState;

/// GET /api/user/profile: create the profile from the session on first access.
pub async fn get_profile(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<User>, AppError> {
    let store = app.store.clone();
    let profile = tokio::task::spawn_blocking(move || {
        store.get_or_create_user(&user.email, user.name, user.image)
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(profile))
}

/// POST /api/user/profile: update integrations and per-user API keys.
pub async fn update_profile(
    State(app): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    let store = app.store.clone();
    let profile = tokio::task::spawn_blocking(move || store.update_profile(&user.email, update))
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(Json(profile))
}
