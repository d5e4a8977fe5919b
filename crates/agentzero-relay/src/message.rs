use serde::Deserialize;
use serde_json::{Map, Value};

/// Messages the extension sends to the relay, tagged by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayMessage {
    GetConfig,
    UpdateConfig {
        #[serde(default)]
        config: Map<String, Value>,
    },
    TriggerAnalysis {
        data: AnalysisTrigger,
    },
    /// `data` is the scraped PR (`title`, `description`, counts) and is
    /// forwarded to `/mcs-score` untouched.
    GetMcsScore {
        data: Value,
    },
    TriggerAutoFix {
        data: AutoFixTrigger,
    },
    CheckAuth,
    AnalyzeCode {
        #[serde(default)]
        code: String,
        #[serde(default)]
        model: Option<String>,
    },
    ExplainCode {
        #[serde(default)]
        code: String,
        #[serde(default)]
        model: Option<String>,
    },
    SecurityScan {
        #[serde(default)]
        code: String,
        #[serde(default)]
        model: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisTrigger {
    pub repository: String,
    #[serde(default)]
    pub pull_request: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoFixTrigger {
    pub repository: Value,
    #[serde(default)]
    pub issue: Value,
}
