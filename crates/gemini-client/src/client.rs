use rand::seq::SliceRandom;

use crate::error::GeminiError;
use crate::types::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse};
use crate::Result;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro";

/// API keys the server may call Gemini with. Each call picks one at random
/// so quota spreads across keys.
#[derive(Debug, Clone, Default)]
pub struct KeyPool {
    keys: Vec<String>,
}

impl KeyPool {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .filter(|k: &String| !k.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn pick(&self) -> Option<&str> {
        self.keys
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    keys: KeyPool,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, keys: KeyPool) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            keys,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.model
    }

    /// True when a call without a caller-supplied key would fail.
    pub fn has_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Send `prompt` as a single-turn `generateContent` call and return the
    /// first candidate's text, which may be empty.
    ///
    /// `model` overrides the default model, `api_key` overrides the pool.
    pub async fn generate(
        &self,
        prompt: &str,
        model: Option<&str>,
        api_key: Option<&str>,
    ) -> Result<String> {
        let key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| self.keys.pick())
            .ok_or(GeminiError::MissingApiKey)?;
        let model = model.unwrap_or(&self.model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );

        tracing::debug!(model, prompt_len = prompt.len(), "gemini generateContent");
        let resp = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .json(&GenerateContentRequest::from_prompt(prompt))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), "gemini request failed");
            return Err(GeminiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = resp.json().await?;
        let text = parsed.text();
        if text.is_empty() {
            tracing::warn!(
                finish_reason = parsed.finish_reason(),
                "gemini candidate carried no text"
            );
        }
        Ok(text)
    }
}
