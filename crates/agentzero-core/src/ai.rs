//! Code-level AI requests (analyze, explain, scan) and their degraded answers.

use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{AgentZeroError, Result};
use crate::parse;
use crate::prompt;
use crate::types::AiTask;

pub const UNSTRUCTURED_SUMMARY: &str = "Analysis completed but format was unstructured.";
pub const UNSTRUCTURED_SCORE: u32 = 70;

#[derive(Debug, Clone, Deserialize)]
pub struct CodeRequest {
    pub code: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl CodeRequest {
    pub fn validate(&self) -> Result<()> {
        if self.code.is_empty() {
            return Err(AgentZeroError::Validation(
                "code must contain at least 1 character".to_string(),
            ));
        }
        Ok(())
    }

    /// The Gemini model to call: the requested one when it names a Gemini
    /// model, otherwise `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.model.as_deref() {
            Some(m) if m.starts_with("gemini") => m,
            _ => default,
        }
    }

    pub fn prompt(&self, task: AiTask) -> String {
        match task {
            AiTask::Analyze => prompt::analyze_prompt(&self.code, self.context.as_deref()),
            AiTask::Explain => prompt::explain_prompt(&self.code),
            AiTask::Scan => prompt::scan_prompt(&self.code),
        }
    }
}

/// Shape the raw model text into the endpoint's response body.
pub fn interpret_response(task: AiTask, raw: &str) -> Value {
    match task {
        AiTask::Explain => json!({ "success": true, "explanation": raw }),
        AiTask::Analyze => parse::interpret(raw, analyze_fallback),
        AiTask::Scan => parse::interpret(raw, scan_fallback),
    }
}

fn analyze_fallback(cleaned: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("summary".into(), Value::from(UNSTRUCTURED_SUMMARY));
    m.insert("rawDetails".into(), Value::from(cleaned));
    m.insert("score".into(), Value::from(UNSTRUCTURED_SCORE));
    m.insert("issues".into(), Value::Array(Vec::new()));
    m
}

fn scan_fallback(cleaned: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("isSecure".into(), Value::Bool(false));
    m.insert(
        "vulnerabilities".into(),
        json!([{
            "severity": "LOW",
            "type": "Parse Error",
            "description": "Could not parse AI response",
            "fix": "Check raw logs"
        }]),
    );
    m.insert("raw".into(), Value::from(cleaned));
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(code: &str, model: Option<&str>) -> CodeRequest {
        CodeRequest {
            code: code.into(),
            model: model.map(str::to_string),
            context: None,
        }
    }

    #[test]
    fn empty_code_is_rejected() {
        assert!(req("", None).validate().is_err());
        assert!(req(" ", None).validate().is_ok());
    }

    #[test]
    fn non_gemini_model_uses_default() {
        assert_eq!(req("x", Some("claude-3.5")).model_or("gemini-pro"), "gemini-pro");
        assert_eq!(
            req("x", Some("gemini-1.5-flash")).model_or("gemini-pro"),
            "gemini-1.5-flash"
        );
        assert_eq!(req("x", None).model_or("gemini-pro"), "gemini-pro");
    }

    #[test]
    fn explain_returns_raw_text() {
        let body = interpret_response(AiTask::Explain, "```rust\n**Purpose**\n```");
        assert_eq!(body["explanation"], "```rust\n**Purpose**\n```");
        assert_eq!(body["success"], true);
    }

    #[test]
    fn analyze_fallback_keeps_raw_details() {
        let body = interpret_response(AiTask::Analyze, "looks ok to me");
        assert_eq!(body["summary"], UNSTRUCTURED_SUMMARY);
        assert_eq!(body["rawDetails"], "looks ok to me");
        assert_eq!(body["score"], 70);
        assert_eq!(body["issues"], json!([]));
    }

    #[test]
    fn scan_fallback_reports_parse_error() {
        let body = interpret_response(AiTask::Scan, "{broken");
        assert_eq!(body["isSecure"], false);
        assert_eq!(body["vulnerabilities"][0]["type"], "Parse Error");
        assert_eq!(body["raw"], "{broken");
    }

    #[test]
    fn scan_json_passes_through() {
        let body = interpret_response(AiTask::Scan, "{\"isSecure\": true, \"vulnerabilities\": []}");
        assert_eq!(
            body,
            json!({"success": true, "isSecure": true, "vulnerabilities": []})
        );
    }
}
