//! Prompt templates sent to the generative model.

use serde_json::Value;

use crate::types::McsRequest;

/// Missing and zero counts both render as `Unknown`.
fn count_or_unknown(n: Option<u64>) -> String {
    n.filter(|v| *v > 0)
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Unknown".to_string())
}

pub fn mcs_prompt(req: &McsRequest) -> String {
    format!(
        r#"
You are Agent Zero, an expert software architect.
Calculate a "Merge Candidate Score" (0-100) for this Pull Request.

Parameters:
- Title: "{title}"
- Description: "{description}"
- Files Changed: {files}
- Additions: {additions}
- Deletions: {deletions}

Scoring Criteria:
- Clarity: Is the intent clear? (Description length/quality)
- Size: Is it too big? (Over 1000 lines is risky)
- Risk: Vague title? "Fix bug" is bad. "Fix NPE in UserAuth" is good.

Return JSON:
{{
  "score": number,
  "status": "MERGE_CANDIDATE" | "NEEDS_REVIEW" | "AUTOCORRECT",
  "reasoning": "One sentence explanation."
}}

Return ONLY valid JSON.
"#,
        title = req.title,
        description = req.description,
        files = count_or_unknown(req.files_changed_count),
        additions = count_or_unknown(req.additions),
        deletions = count_or_unknown(req.deletions),
    )
}

pub fn analyze_prompt(code: &str, context: Option<&str>) -> String {
    let context = context
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("No specific context provided.");
    format!(
        r#"
You are Agent Zero, an advanced AI coding assistant.

Analyze the following code snippet for potential bugs, performance issues, security vulnerabilities, and code quality improvements.

Context: {context}

Code:
```
{code}
```

Provide your response in the following JSON format:
{{
  "summary": "Brief summary of findings",
  "score": 0-100 (Code Quality Score),
  "issues": [
    {{
       "type": "bug" | "security" | "performance" | "style",
       "severity": "high" | "medium" | "low",
       "message": "Description of the issue",
       "suggestion": "How to fix it",
       "line": number (approximate line number if possible, else 0)
    }}
  ],
  "improvedCode": "The fixed version of the code (optional, only if significant changes needed)"
}}

Return ONLY valid JSON. Do not include markdown formatting like ```json.
"#
    )
}

pub fn explain_prompt(code: &str) -> String {
    format!(
        r#"
You are Agent Zero. Explain the following code snippet clearly and concisely for a developer.

Code:
```
{code}
```

Format your response using Markdown. Include:
1. **Purpose**: What does this code do?
2. **Logic Flow**: How does it work?
3. **Key Concepts**: Any specific patterns or libraries used.
"#
    )
}

pub fn scan_prompt(code: &str) -> String {
    format!(
        r#"
You are Agent Zero Security Auditor. Scan the following code for security vulnerabilities.

Code:
```
{code}
```

Provide your response in JSON format:
{{
  "isSecure": boolean,
  "vulnerabilities": [
     {{
       "severity": "CRITICAL" | "HIGH" | "MEDIUM" | "LOW",
       "type": "SQL Injection" | "XSS" | "Auth" | "Other",
       "description": "What is the risk?",
       "fix": "How to fix it"
     }}
  ]
}}

Return ONLY valid JSON.
"#
    )
}

/// Ask for a merge verdict on a pipeline's Git/CI context.
pub fn failure_analysis_prompt(context: &Value) -> String {
    let context = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    format!(
        r#"
You are Agent Zero, an autonomous code quality AI.
Analyze the following Git/CI context and determine if the code is safe to merge, needs human review, or needs an autonomous fix.

CONTEXT:
{context}

RULES:
1. If there are critical failures (build broke, tests failed), score < 50 and status = AUTOCORRECT.
2. If code quality is low but passing, score 50-79 and status = NEEDS_REVIEW.
3. If everything looks good, score >= 80 and status = MERGE_CANDIDATE.

OUTPUT FORMAT:
Return ONLY a raw JSON object (no markdown formatting) with these fields:
- "mcs": integer (0-100)
- "status": string ("AUTOCORRECT", "NEEDS_REVIEW", "MERGE_CANDIDATE")
- "reasoning": string (concise explanation)
- "suggested_fix": string (shell command or "N/A")
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> McsRequest {
        McsRequest {
            title: "Fix NPE in UserAuth".into(),
            description: "Guards the session lookup".into(),
            files_changed_count: Some(3),
            additions: None,
            deletions: Some(0),
        }
    }

    #[test]
    fn mcs_prompt_interpolates_fields() {
        let p = mcs_prompt(&request());
        assert!(p.contains("- Title: \"Fix NPE in UserAuth\""));
        assert!(p.contains("- Files Changed: 3"));
        assert!(p.contains("- Additions: Unknown"));
        assert!(p.contains("- Deletions: Unknown"));
        assert!(!p.contains("- Deletions: 0"));
        assert!(p.contains("\"status\": \"MERGE_CANDIDATE\" | \"NEEDS_REVIEW\" | \"AUTOCORRECT\""));
    }

    #[test]
    fn zero_counts_render_as_unknown() {
        let req = McsRequest {
            files_changed_count: Some(0),
            additions: Some(12),
            ..request()
        };
        let p = mcs_prompt(&req);
        assert!(p.contains("- Files Changed: Unknown"));
        assert!(p.contains("- Additions: 12"));
    }

    #[test]
    fn analyze_prompt_defaults_context() {
        let p = analyze_prompt("fn main() {}", None);
        assert!(p.contains("Context: No specific context provided."));
        assert!(p.contains("fn main() {}"));
        let p = analyze_prompt("x", Some("payment service"));
        assert!(p.contains("Context: payment service"));
    }

    #[test]
    fn failure_analysis_prompt_embeds_pretty_context() {
        let ctx = serde_json::json!({"build": "failed", "tests": {"passed": 10}});
        let p = failure_analysis_prompt(&ctx);
        assert!(p.contains("CONTEXT:\n{\n  \"build\": \"failed\""));
        assert!(p.contains("score < 50 and status = AUTOCORRECT"));
        assert!(p.contains("\"suggested_fix\": string"));
    }

    #[test]
    fn explain_and_scan_embed_code() {
        assert!(explain_prompt("SELECT 1").contains("SELECT 1"));
        assert!(scan_prompt("eval(input)").contains("eval(input)"));
        assert!(scan_prompt("x").contains("\"isSecure\": boolean"));
    }
}
