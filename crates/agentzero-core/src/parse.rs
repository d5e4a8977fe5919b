//! Post-processing of free-form model output.
//!
//! Models are asked for bare JSON but routinely wrap it in Markdown fences.
//! Fences are removed wherever they appear, then the remainder must parse as
//! a JSON object; anything else is treated as unstructured text.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

static FENCE_RE: OnceLock<Regex> = OnceLock::new();

fn fence_re() -> &'static Regex {
    FENCE_RE.get_or_init(|| Regex::new(r"```(?:json)?").unwrap())
}

/// Remove every ```` ```json ```` and ```` ``` ```` marker and trim.
pub fn strip_code_fences(raw: &str) -> String {
    fence_re().replace_all(raw, "").trim().to_string()
}

/// Parse cleaned model output as a JSON object.
///
/// Arrays, scalars and invalid JSON all yield `None`: only an object can be
/// merged into a response body.
pub fn parse_object(cleaned: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Build `{ "success": true, ...fields }`.
///
/// Keys supplied by the model win, `success` included.
pub fn with_success(fields: Map<String, Value>) -> Value {
    let mut out = Map::with_capacity(fields.len() + 1);
    out.insert("success".to_string(), Value::Bool(true));
    out.extend(fields);
    Value::Object(out)
}

/// Turn raw model output into a response body, or fall back.
///
/// `fallback` receives the cleaned text and must return the replacement
/// fields; `success: true` is added either way.
pub fn interpret<F>(raw: &str, fallback: F) -> Value
where
    F: FnOnce(&str) -> Map<String, Value>,
{
    let cleaned = strip_code_fences(raw);
    match parse_object(&cleaned) {
        Some(fields) => with_success(fields),
        None => {
            tracing::warn!(
                len = cleaned.len(),
                "model output was not a JSON object; using fallback"
            );
            with_success(fallback(&cleaned))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn strips_fences_anywhere() {
        let raw = "Here you go:\n```\n{}\n``` done";
        assert_eq!(strip_code_fences(raw), "Here you go:\n\n{}\n done");
    }

    #[test]
    fn parse_object_rejects_non_objects() {
        assert!(parse_object("[1,2]").is_none());
        assert!(parse_object("42").is_none());
        assert!(parse_object("not json").is_none());
        assert!(parse_object("{\"k\": true}").is_some());
    }

    #[test]
    fn well_formed_object_is_merged_unmodified() {
        let body = interpret("```json\n{\"score\": 91, \"extra\": [1]}\n```", |_| {
            panic!("fallback must not run")
        });
        assert_eq!(body, json!({"success": true, "score": 91, "extra": [1]}));
    }

    #[test]
    fn model_keys_win_over_success() {
        let body = interpret("{\"success\": false, \"x\": 1}", |_| Map::new());
        assert_eq!(body, json!({"success": false, "x": 1}));

        let body = interpret("{\"x\": 1}", |_| Map::new());
        assert_eq!(body["success"], true);
    }

    #[test]
    fn fallback_receives_cleaned_text() {
        let body = interpret("```\nplain words\n```", |cleaned| {
            let mut m = Map::new();
            m.insert("raw".into(), Value::String(cleaned.to_string()));
            m
        });
        assert_eq!(body, json!({"success": true, "raw": "plain words"}));
    }
}
