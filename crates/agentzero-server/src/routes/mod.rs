pub mod ai;
pub mod auth;
pub mod cline;
pub mod history;
pub mod kestra;
pub mod mcs;
pub mod profile;
pub mod reports;
pub mod webhook;

use crate::auth::SessionUser;
use crate::error::AppError;
use crate::state::AppState;

/// Gemini key stored on the caller's profile, if they are signed in and
/// have set one.
pub(crate) async fn user_gemini_key(
    app: &AppState,
    user: Option<&SessionUser>,
) -> Result<Option<String>, AppError> {
    let Some(user) = user else {
        return Ok(None);
    };
    let store = app.store.clone();
    let email = user.email.clone();
    let key = tokio::task::spawn_blocking(move || {
        let user = store.get_user(&email)?;
        Ok::<_, agentzero_core::AgentZeroError>(
            user.and_then(|u| u.api_keys.gemini).filter(|k| !k.is_empty()),
        )
    })
    .await
    .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))??;
    Ok(key)
}
