use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentZeroError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("API Key not found. Please set GEMINI_API_KEY in .env")]
    MissingApiKey,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("report not found: {0}")]
    ReportNotFound(String),

    #[error("webhook signature rejected: {0}")]
    Signature(String),

    #[error("kestra request failed: {0}")]
    Kestra(String),

    #[error("kestra returned {status}: {body}")]
    KestraStatus { status: u16, body: String },

    #[error("database error: {0}")]
    Db(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AgentZeroError>;
