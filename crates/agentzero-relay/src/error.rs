use agentzero_core::AgentZeroError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Message returned to the extension as-is.
    #[error("{0}")]
    Upstream(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Core(#[from] AgentZeroError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid settings: {0}")]
    InvalidSettings(serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    FrameTooLarge { size: usize, limit: usize },

    #[error("home directory not found")]
    HomeNotFound,
}
