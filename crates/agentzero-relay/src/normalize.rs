//! Folds dashboard AI responses into the side panel's `AnalysisResult`.

use agentzero_core::types::{AiTask, AnalysisResult};
use serde_json::Value;

const SUGGESTED_FIX: &str = "**Suggested Fix Available**";
const NO_VULNERABILITIES: &str = "No significant vulnerabilities found.";

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn message_of(item: &Value) -> String {
    match item.get("message").or_else(|| item.get("description")) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

pub fn normalize(task: AiTask, code: &str, data: &Value) -> AnalysisResult {
    let code = Some(code.to_string());
    match task {
        AiTask::Explain => {
            let explanation = str_field(data, "explanation");
            AnalysisResult {
                code,
                summary: if explanation.is_some() {
                    "Explanation Ready".to_string()
                } else {
                    "No explanation returned.".to_string()
                },
                details: explanation.unwrap_or_default().to_string(),
                risks: Vec::new(),
            }
        }
        AiTask::Analyze => {
            let risks = data
                .get("issues")
                .and_then(Value::as_array)
                .map(|issues| {
                    issues
                        .iter()
                        .map(|i| {
                            let severity = i
                                .get("severity")
                                .and_then(Value::as_str)
                                .map(str::to_uppercase)
                                .unwrap_or_else(|| "ISSUE".to_string());
                            format!("{severity}: {}", message_of(i))
                        })
                        .collect()
                })
                .unwrap_or_default();
            let score = match data.get("score") {
                Some(Value::Number(n)) => n.to_string(),
                Some(Value::String(s)) => s.clone(),
                _ => "N/A".to_string(),
            };
            let fix = if data.get("improvedCode").is_some_and(|v| !v.is_null()) {
                SUGGESTED_FIX
            } else {
                ""
            };
            AnalysisResult {
                code,
                summary: str_field(data, "summary")
                    .unwrap_or("Analysis Complete")
                    .to_string(),
                details: format!("Score: {score}/100\n\n{fix}"),
                risks,
            }
        }
        AiTask::Scan => {
            // The scan route reports `vulnerabilities`; `issues` is accepted too.
            let risks = data
                .get("issues")
                .or_else(|| data.get("vulnerabilities"))
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .map(|i| format!("High Risk: {}", message_of(i)))
                        .collect()
                })
                .unwrap_or_default();
            AnalysisResult {
                code,
                summary: str_field(data, "summary")
                    .unwrap_or("Security Scan Complete")
                    .to_string(),
                details: str_field(data, "details")
                    .unwrap_or(NO_VULNERABILITIES)
                    .to_string(),
                risks,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn explain_uses_explanation_as_details() {
        let r = normalize(
            AiTask::Explain,
            "x",
            &json!({"success": true, "explanation": "## Purpose"}),
        );
        assert_eq!(r.summary, "Explanation Ready");
        assert_eq!(r.details, "## Purpose");
        assert!(r.risks.is_empty());
        assert_eq!(r.code.as_deref(), Some("x"));

        let r = normalize(AiTask::Explain, "x", &json!({"success": true}));
        assert_eq!(r.summary, "No explanation returned.");
        assert_eq!(r.details, "");
    }

    #[test]
    fn analyze_formats_issues_and_score() {
        let data = json!({
            "summary": "Mostly fine",
            "score": 85,
            "issues": [
                {"severity": "high", "message": "unchecked unwrap"},
                {"message": "long function"}
            ],
            "improvedCode": "fn main() {}"
        });
        let r = normalize(AiTask::Analyze, "code", &data);
        assert_eq!(r.summary, "Mostly fine");
        assert_eq!(r.risks, vec!["HIGH: unchecked unwrap", "ISSUE: long function"]);
        assert_eq!(r.details, "Score: 85/100\n\n**Suggested Fix Available**");
    }

    #[test]
    fn analyze_defaults() {
        let r = normalize(AiTask::Analyze, "code", &json!({}));
        assert_eq!(r.summary, "Analysis Complete");
        assert_eq!(r.details, "Score: N/A/100\n\n");
        assert!(r.risks.is_empty());
    }

    #[test]
    fn scan_reads_vulnerabilities() {
        let data = json!({
            "isSecure": false,
            "vulnerabilities": [{"severity": "HIGH", "type": "XSS", "description": "unescaped html", "fix": "escape"}]
        });
        let r = normalize(AiTask::Scan, "code", &data);
        assert_eq!(r.summary, "Security Scan Complete");
        assert_eq!(r.risks, vec!["High Risk: unescaped html"]);
        assert_eq!(r.details, "No significant vulnerabilities found.");
    }
}
