use agentzero_core::kestra::KestraClient;
use agentzero_core::webhook::{self, EVENT_HEADER, MAX_BODY_BYTES, SIGNATURE_HEADER};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// POST /webhook: GitHub event receiver.
///
/// Verifies `X-Hub-Signature-256`, acknowledges with 202 and forwards the
/// payload to the Kestra webhook in the background. `ping` events are
/// answered with 200 and not forwarded.
pub async fn github_webhook(
    State(app): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let (Some(secret), Some(forward_url)) = (
        app.secrets.github_webhook_secret.clone(),
        app.config.webhook.forward_url.clone(),
    ) else {
        return Err(AppError::unavailable("GitHub webhook receiver is not configured"));
    };

    let headers = request.headers().clone();
    let Some(signature) = headers
        .get(SIGNATURE_HEADER)
        .map(|h| h.to_str().unwrap_or("").to_string())
    else {
        tracing::warn!("missing {SIGNATURE_HEADER} header");
        return Ok((StatusCode::UNAUTHORIZED, "Missing signature").into_response());
    };

    let body = match axum::body::to_bytes(request.into_body(), MAX_BODY_BYTES).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("failed to read webhook body: {e}");
            return Ok((StatusCode::BAD_REQUEST, "Failed to read body").into_response());
        }
    };

    if let Err(e) = webhook::verify(secret.as_bytes(), &body, &signature) {
        tracing::error!("signature verification failed: {e}");
        return Ok((StatusCode::UNAUTHORIZED, "Invalid signature").into_response());
    }

    if headers.get(EVENT_HEADER).is_some_and(|e| e == "ping") {
        tracing::info!("received ping event");
        return Ok(StatusCode::OK.into_response());
    }

    let kestra = app.kestra.clone();
    tokio::spawn(async move {
        forward(kestra, forward_url, body.to_vec()).await;
    });

    Ok(StatusCode::ACCEPTED.into_response())
}

async fn forward(kestra: KestraClient, url: String, body: Vec<u8>) {
    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("webhook body is not JSON: {e}");
            return;
        }
    };
    match kestra.forward(&url, &payload).await {
        Ok(status) if (200..300).contains(&status) => {
            tracing::info!(status, "forwarded webhook to kestra");
        }
        Ok(status) => tracing::error!(status, "kestra rejected forwarded webhook"),
        Err(e) => tracing::error!("failed to call kestra: {e}"),
    }
}
