use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{self, MaybeUser, SessionUser, SESSION_COOKIE};
use crate::error::{ApiJson, AppError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignIn {
    #[serde(default)]
    pub username: String,
}

/// POST /api/auth/signin: demo credentials. Any non-empty username signs in
/// as the shared demo account.
pub async fn sign_in(
    State(app): State<AppState>,
    ApiJson(body): ApiJson<SignIn>,
) -> Result<Response, AppError> {
    if !app.config.auth.demo || body.username.trim().is_empty() {
        return Err(AppError::unauthorized());
    }
    let user = SessionUser::demo();
    let token = auth::new_token();
    app.sessions
        .write()
        .await
        .insert(token.clone(), user.clone());
    tracing::info!(username = %body.username, "demo sign-in");

    let cookie = format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/");
    let body = json!({ "success": true, "token": token, "user": user });
    Ok(([(SET_COOKIE, cookie)], Json(body)).into_response())
}

/// POST /api/auth/signout: drop the caller's session if it was issued here.
pub async fn sign_out(State(app): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = auth::session_token(&headers) {
        app.sessions.write().await.remove(&token);
    }
    let cookie = format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0");
    ([(SET_COOKIE, cookie)], Json(json!({ "success": true }))).into_response()
}

/// GET /api/auth/status
pub async fn status(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(user) => Json(json!({ "authenticated": true, "user": user })).into_response(),
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response(),
    }
}
