//! Local key-value store standing in for the extension's `chrome.storage`.
//!
//! All keys live in one JSON object on disk; every write replaces the file
//! atomically.

use std::path::{Path, PathBuf};

use agentzero_core::io::atomic_write;
use agentzero_core::types::AnalysisResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RelayError;
use crate::Result;

pub const CONFIG_KEY: &str = "config";
pub const LAST_ANALYSIS_KEY: &str = "lastAnalysis";
const STORAGE_FILE: &str = "storage.json";

pub const DEFAULT_KESTRA_URL: &str = "http://localhost:8080";
pub const DEFAULT_DASHBOARD_URL: &str = "http://localhost:3000/api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectedModels {
    pub code_analysis: String,
    pub security_scan: String,
    pub auto_fix: String,
    pub documentation: String,
}

impl Default for SelectedModels {
    fn default() -> Self {
        Self {
            code_analysis: "gemini-pro".to_string(),
            security_scan: "gemini-pro".to_string(),
            auto_fix: "cline".to_string(),
            documentation: "claude-3.5".to_string(),
        }
    }
}

/// Extension settings stored under `config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Dashboard session token, sent as a bearer token when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_kestra_url")]
    pub kestra_url: String,
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
    #[serde(default = "default_true")]
    pub enable_notifications: bool,
    #[serde(default)]
    pub selected_models: SelectedModels,
}

fn default_kestra_url() -> String {
    DEFAULT_KESTRA_URL.to_string()
}

fn default_dashboard_url() -> String {
    DEFAULT_DASHBOARD_URL.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            kestra_url: default_kestra_url(),
            dashboard_url: default_dashboard_url(),
            enable_notifications: true,
            selected_models: SelectedModels::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(STORAGE_FILE),
        }
    }

    /// `~/.agentzero/relay`
    pub fn default_dir() -> Result<PathBuf> {
        let home = home::home_dir().ok_or(RelayError::HomeNotFound)?;
        Ok(home.join(".agentzero").join("relay"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Map<String, Value>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, all: &Map<String, Value>) -> Result<()> {
        let data = serde_json::to_vec_pretty(all)?;
        atomic_write(&self.path, &data)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read_all()?.remove(key))
    }

    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), value);
        self.write_all(&all)
    }

    /// Current settings. Defaults are written on first access.
    pub fn settings(&self) -> Result<Settings> {
        match self.get(CONFIG_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => {
                let settings = Settings::default();
                self.set(CONFIG_KEY, serde_json::to_value(&settings)?)?;
                Ok(settings)
            }
        }
    }

    /// Shallow-merge `patch` over the stored settings and return the result.
    /// A merge that no longer reads back as [`Settings`] is rejected and the
    /// stored settings are left untouched.
    pub fn update_settings(&self, patch: Map<String, Value>) -> Result<Value> {
        let mut current = match self.get(CONFIG_KEY)? {
            Some(Value::Object(map)) => map,
            _ => match serde_json::to_value(Settings::default())? {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        };
        for (k, v) in patch {
            current.insert(k, v);
        }
        let merged = Value::Object(current);
        serde_json::from_value::<Settings>(merged.clone())
            .map_err(RelayError::InvalidSettings)?;
        self.set(CONFIG_KEY, merged.clone())?;
        Ok(merged)
    }

    pub fn last_analysis(&self) -> Result<Option<AnalysisResult>> {
        match self.get(LAST_ANALYSIS_KEY)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn set_last_analysis(&self, result: &AnalysisResult) -> Result<()> {
        self.set(LAST_ANALYSIS_KEY, serde_json::to_value(result)?)
    }
}
