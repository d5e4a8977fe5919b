//! `gemini-client`: minimal async client for Google's Gemini
//! `generateContent` REST endpoint.
//!
//! ```rust,ignore
//! use gemini_client::{GeminiClient, KeyPool};
//!
//! let client = GeminiClient::new(reqwest::Client::new(), KeyPool::new(["key-a", "key-b"]));
//! let text = client.generate("Summarize this diff", None, None).await?;
//! ```

pub mod client;
pub mod error;
pub mod types;


pub use client::{GeminiClient, KeyPool, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::GeminiError;
pub use types::{Candidate, Content, GenerateContentRequest, GenerateContentResponse, Part};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GeminiError>;
