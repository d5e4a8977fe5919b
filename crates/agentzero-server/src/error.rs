use agentzero_core::error::AgentZeroError;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gemini_client::GeminiError;
use serde::de::DeserializeOwned;

// ---------------------------------------------------------------------------
// Internal sentinel for explicit status codes
// ---------------------------------------------------------------------------

/// Carries an explicit HTTP status through the `anyhow::Error` chain.
#[derive(Debug)]
struct StatusError(StatusCode, String);

impl std::fmt::Display for StatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.1)
    }
}

impl std::error::Error for StatusError {}

// ---------------------------------------------------------------------------
// AppError: unified error type for HTTP responses
// ---------------------------------------------------------------------------

/// Unified error type for HTTP responses. Every error body has the shape
/// `{"success": false, "error": "...", "details"?: "..."}`.
#[derive(Debug)]
pub struct AppError(pub anyhow::Error);

impl AppError {
    /// Construct a 400 Bad Request error with the given message.
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(AgentZeroError::Validation(msg.into()).into())
    }

    /// Construct a 401 with the fixed `Unauthorized` message.
    pub fn unauthorized() -> Self {
        Self(StatusError(StatusCode::UNAUTHORIZED, "Unauthorized".into()).into())
    }

    /// Construct a 503 for features that are not configured.
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self(StatusError(StatusCode::SERVICE_UNAVAILABLE, msg.into()).into())
    }

    fn parts(&self) -> (StatusCode, String, Option<String>) {
        if let Some(StatusError(status, msg)) = self.0.downcast_ref::<StatusError>() {
            return (*status, msg.clone(), None);
        }
        if let Some(e) = self.0.downcast_ref::<GeminiError>() {
            return match e {
                GeminiError::MissingApiKey => {
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), None)
                }
                GeminiError::Http(_) | GeminiError::Api { .. } => (
                    StatusCode::BAD_GATEWAY,
                    "Analysis failed".to_string(),
                    Some(e.to_string()),
                ),
            };
        }
        if let Some(e) = self.0.downcast_ref::<AgentZeroError>() {
            let status = match e {
                AgentZeroError::Validation(_) => StatusCode::BAD_REQUEST,
                AgentZeroError::Signature(_) => StatusCode::UNAUTHORIZED,
                AgentZeroError::UserNotFound(_) | AgentZeroError::ReportNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                AgentZeroError::KestraStatus { status, body } => {
                    let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                    return (status, body.clone(), None);
                }
                AgentZeroError::Http(_) => StatusCode::BAD_GATEWAY,
                AgentZeroError::MissingApiKey
                | AgentZeroError::Kestra(_)
                | AgentZeroError::Db(_)
                | AgentZeroError::Io(_)
                | AgentZeroError::Yaml(_)
                | AgentZeroError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            let msg = match e {
                AgentZeroError::Validation(m) => m.clone(),
                other => other.to_string(),
            };
            return (status, msg, None);
        }
        (StatusCode::INTERNAL_SERVER_ERROR, self.0.to_string(), None)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{:#}", self.0);
        }
        let mut body = serde_json::json!({ "success": false, "error": error });
        if let Some(details) = details {
            body["details"] = serde_json::Value::String(details);
        }
        (status, axum::Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

// ---------------------------------------------------------------------------
// ApiJson: JSON extractor whose rejections use the AppError body
// ---------------------------------------------------------------------------

/// `axum::Json` with rejections reported as 400 `{success:false, error}`.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(rejection_error(rejection)),
        }
    }
}

fn rejection_error(rejection: JsonRejection) -> AppError {
    AppError::bad_request(rejection.body_text())
}
