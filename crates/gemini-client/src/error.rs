use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API Key not found. Please set GEMINI_API_KEY in .env")]
    MissingApiKey,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {message}")]
    Api { status: u16, message: String },
}
