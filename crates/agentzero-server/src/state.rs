use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agentzero_core::config::{Config, Secrets};
use agentzero_core::db::Store;
use agentzero_core::kestra::KestraClient;
use agentzero_core::paths;
use gemini_client::{GeminiClient, KeyPool};
use tokio::sync::RwLock;

use crate::auth::SessionUser;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    pub config: Arc<Config>,
    pub secrets: Arc<Secrets>,
    pub store: Arc<Store>,
    pub gemini: GeminiClient,
    pub kestra: KestraClient,
    /// Issued session tokens. Lost on restart.
    pub sessions: Arc<RwLock<HashMap<String, SessionUser>>>,
}

impl AppState {
    /// Load `.agentzero/config.yaml` and secrets from the environment.
    pub fn new(root: PathBuf) -> anyhow::Result<Self> {
        let config = Config::load(&root)?;
        Self::with_config(root, config, Secrets::from_env())
    }

    pub fn with_config(root: PathBuf, config: Config, secrets: Secrets) -> anyhow::Result<Self> {
        let store = Store::open(&paths::db_path(&root))?;
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        let gemini = GeminiClient::new(http.clone(), KeyPool::new(secrets.gemini_keys.clone()))
            .with_base_url(config.gemini.base_url.clone())
            .with_model(config.gemini.model.clone());
        let kestra = KestraClient::new(http, config.kestra.clone());
        tracing::debug!(
            gemini_keys = secrets.gemini_keys.len(),
            kestra = %config.kestra.base_url,
            "app state ready"
        );
        Ok(Self {
            root,
            config: Arc::new(config),
            secrets: Arc::new(secrets),
            store: Arc::new(store),
            gemini,
            kestra,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_opens_store_under_root() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::with_config(
            dir.path().to_path_buf(),
            Config::default(),
            Secrets::default(),
        )
        .unwrap();
        assert_eq!(state.root, dir.path());
        assert!(paths::db_path(dir.path()).exists());
        assert!(!state.gemini.has_keys());
    }
}
