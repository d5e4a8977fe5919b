use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "agentzero_session";
const TOKEN_LEN: usize = 48;

pub const DEMO_EMAIL: &str = "user@agentzero.dev";
pub const DEMO_NAME: &str = "Agent Zero User";
pub const DEMO_IMAGE: &str = "https://github.com/agent-zero.png";

/// Identity attached to a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

impl SessionUser {
    /// The shared account every demo sign-in resolves to.
    pub fn demo() -> Self {
        Self {
            email: DEMO_EMAIL.to_string(),
            name: Some(DEMO_NAME.to_string()),
            image: Some(DEMO_IMAGE.to_string()),
        }
    }
}

pub fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Session token from `Authorization: Bearer <token>` or the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_string());
    }
    let cookies = headers.get("cookie").and_then(|v| v.to_str().ok())?;
    cookies.split(';').find_map(|part| {
        part.trim()
            .strip_prefix(SESSION_COOKIE)
            .and_then(|rest| rest.strip_prefix('='))
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    })
}

/// Resolve the caller against issued sessions, then configured static tokens.
pub async fn resolve(state: &AppState, headers: &HeaderMap) -> Option<SessionUser> {
    let token = session_token(headers)?;
    {
        let sessions = state.sessions.read().await;
        if let Some(user) = sessions.get(&token) {
            return Some(user.clone());
        }
    }
    state
        .config
        .auth
        .tokens
        .iter()
        .find(|t| t.token == token)
        .map(|t| SessionUser {
            email: t.email.clone(),
            name: t.name.clone(),
            image: t.image.clone(),
        })
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// Signed-in caller. Rejects with 401 `{success:false, error:"Unauthorized"}`.
pub struct CurrentUser(pub SessionUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        resolve(state, &parts.headers)
            .await
            .map(CurrentUser)
            .ok_or_else(AppError::unauthorized)
    }
}

/// Caller identity on routes where signing in is optional.
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve(state, &parts.headers).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.insert(*k, HeaderValue::from_str(v).unwrap());
        }
        h
    }

    #[test]
    fn bearer_token_is_read() {
        let h = headers(&[("authorization", "Bearer abc123")]);
        assert_eq!(session_token(&h).as_deref(), Some("abc123"));
    }

    #[test]
    fn cookie_token_is_read() {
        let h = headers(&[("cookie", "theme=dark; agentzero_session=tok; other=1")]);
        assert_eq!(session_token(&h).as_deref(), Some("tok"));
    }

    #[test]
    fn similar_cookie_names_are_ignored() {
        let h = headers(&[("cookie", "agentzero_session_old=tok")]);
        assert_eq!(session_token(&h), None);
        assert_eq!(session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn tokens_are_random_alphanumeric() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn resolves_issued_and_static_tokens() {
        use agentzero_core::config::{Config, Secrets, StaticToken};

        let dir = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.auth.tokens.push(StaticToken {
            token: "ci-token".into(),
            email: "ci@example.com".into(),
            name: None,
            image: None,
        });
        let state =
            AppState::with_config(dir.path().to_path_buf(), config, Secrets::default()).unwrap();
        state
            .sessions
            .write()
            .await
            .insert("issued".into(), SessionUser::demo());

        let user = resolve(&state, &headers(&[("authorization", "Bearer issued")]))
            .await
            .unwrap();
        assert_eq!(user.email, DEMO_EMAIL);

        let user = resolve(&state, &headers(&[("cookie", "agentzero_session=ci-token")]))
            .await
            .unwrap();
        assert_eq!(user.email, "ci@example.com");

        assert!(resolve(&state, &headers(&[("authorization", "Bearer nope")]))
            .await
            .is_none());
    }
}
