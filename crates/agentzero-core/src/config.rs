use crate::error::Result;
use crate::{io, paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// GeminiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-pro".to_string()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
        }
    }
}

// ---------------------------------------------------------------------------
// KestraConfig
// ---------------------------------------------------------------------------

/// One Kestra webhook trigger: `{base}/api/v1/executions/webhook/{namespace}/{flow_id}/{key}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookTarget {
    pub namespace: String,
    pub flow_id: String,
    pub key: String,
}

impl WebhookTarget {
    pub fn new(namespace: &str, flow_id: &str, key: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            flow_id: flow_id.to_string(),
            key: key.to_string(),
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/api/v1/executions/webhook/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.namespace,
            self.flow_id,
            self.key
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KestraConfig {
    #[serde(default = "default_kestra_base_url")]
    pub base_url: String,
    /// Namespace and flow whose executions back the dashboard views.
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_flow_id")]
    pub flow_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_trigger_target")]
    pub trigger: WebhookTarget,
    #[serde(default = "default_analysis_target")]
    pub analysis: WebhookTarget,
    #[serde(default = "default_auto_fix_target")]
    pub auto_fix: WebhookTarget,
    #[serde(default = "default_demo_repository")]
    pub demo_repository: String,
    #[serde(default = "default_demo_pr_number")]
    pub demo_pr_number: u64,
}

fn default_kestra_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_namespace() -> String {
    "com.agentzero".to_string()
}

fn default_flow_id() -> String {
    "github-events".to_string()
}

fn default_trigger_target() -> WebhookTarget {
    WebhookTarget::new("com.agentzero", "agent_zero_lite", "github-trigger")
}

fn default_analysis_target() -> WebhookTarget {
    WebhookTarget::new("com.agentzero", "github-events", "github-trigger")
}

fn default_auto_fix_target() -> WebhookTarget {
    WebhookTarget::new("com.agentzero", "auto-fix", "trigger")
}

fn default_demo_repository() -> String {
    "agent-zero-demo/vulnerable-app".to_string()
}

fn default_demo_pr_number() -> u64 {
    1
}

impl Default for KestraConfig {
    fn default() -> Self {
        Self {
            base_url: default_kestra_base_url(),
            namespace: default_namespace(),
            flow_id: default_flow_id(),
            username: None,
            password: None,
            trigger: default_trigger_target(),
            analysis: default_analysis_target(),
            auto_fix: default_auto_fix_target(),
            demo_repository: default_demo_repository(),
            demo_pr_number: default_demo_pr_number(),
        }
    }
}

// ---------------------------------------------------------------------------
// WebhookConfig / AuthConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Kestra webhook that receives forwarded GitHub events.
    /// `KESTRA_WEBHOOK_URL` overrides this at load time.
    #[serde(default)]
    pub forward_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticToken {
    pub token: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Accept any non-empty username at `/api/auth/signin` as the demo account.
    #[serde(default = "default_demo")]
    pub demo: bool,
    #[serde(default)]
    pub tokens: Vec<StaticToken>,
}

fn default_demo() -> bool {
    true
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            demo: default_demo(),
            tokens: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub kestra: KestraConfig,
    #[serde(default)]
    pub webhook: WebhookConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            server: ServerConfig::default(),
            gemini: GeminiConfig::default(),
            kestra: KestraConfig::default(),
            webhook: WebhookConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    /// Load `.agentzero/config.yaml` under `root`, falling back to defaults
    /// when the file does not exist. Environment overrides are applied last.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let mut config = if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            serde_yaml::from_str(&data)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        io::atomic_write(&paths::config_path(root), data.as_bytes())
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("KESTRA_WEBHOOK_URL").filter(|s| !s.trim().is_empty()) {
            self.webhook.forward_url = Some(url);
        }
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Credentials that only ever come from the environment.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub gemini_keys: Vec<String>,
    pub github_webhook_secret: Option<String>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `GEMINI_KEYS` (comma separated) takes precedence over the single-key
    /// variables `GEMINI_API_KEY` and `GOOGLE_API_KEY`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut gemini_keys: Vec<String> = lookup("GEMINI_KEYS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if gemini_keys.is_empty() {
            if let Some(key) = lookup("GEMINI_API_KEY")
                .or_else(|| lookup("GOOGLE_API_KEY"))
                .filter(|s| !s.trim().is_empty())
            {
                gemini_keys.push(key);
            }
        }
        let github_webhook_secret = lookup("GITHUB_WEBHOOK_SECRET").filter(|s| !s.is_empty());
        Self {
            gemini_keys,
            github_webhook_secret,
        }
    }
}
