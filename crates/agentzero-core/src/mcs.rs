//! Merge Candidate Score: model response handling and the length heuristic
//! used when the model does not answer with a JSON object.

use serde_json::{json, Map, Value};

use crate::parse;
use crate::types::McsStatus;

pub const FALLBACK_REASONING: &str =
    "Analysis format error, using heuristic based on description length.";

/// Descriptions longer than this many characters count as "clear intent".
pub const CLEAR_DESCRIPTION_LEN: usize = 50;

const CLEAR_SCORE: u32 = 80;
const VAGUE_SCORE: u32 = 40;
const CANDIDATE_ABOVE: u32 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackScore {
    pub score: u32,
    pub status: McsStatus,
}

pub fn fallback_score(description: &str) -> FallbackScore {
    let score = if description.chars().count() > CLEAR_DESCRIPTION_LEN {
        CLEAR_SCORE
    } else {
        VAGUE_SCORE
    };
    let status = if score > CANDIDATE_ABOVE {
        McsStatus::MergeCandidate
    } else {
        McsStatus::NeedsReview
    };
    FallbackScore { score, status }
}

fn fallback_fields(description: &str) -> Map<String, Value> {
    let FallbackScore { score, status } = fallback_score(description);
    let mut m = Map::new();
    m.insert("score".into(), Value::from(score));
    m.insert("status".into(), Value::from(status.as_str()));
    m.insert("reasoning".into(), Value::from(FALLBACK_REASONING));
    m
}

/// Build the `/api/mcs-score` response body from raw model output.
pub fn interpret_response(raw: &str, description: &str) -> Value {
    parse::interpret(raw, |_| fallback_fields(description))
}

// ---------------------------------------------------------------------------
// CI context analysis
// ---------------------------------------------------------------------------

pub const ANALYSIS_FAILED_PREFIX: &str = "AI Analysis Failed: ";

/// Verdict reported when the model could not be asked or did not answer
/// with a JSON object.
pub fn failure_analysis_fallback(reason: impl std::fmt::Display) -> Value {
    json!({
        "mcs": 0,
        "status": McsStatus::NeedsReview.as_str(),
        "reasoning": format!("{ANALYSIS_FAILED_PREFIX}{reason}"),
        "suggested_fix": "N/A",
    })
}

/// Read the model's `{mcs, status, reasoning, suggested_fix}` verdict on a
/// CI context. The object is passed through as-is.
pub fn interpret_failure_analysis(raw: &str) -> Value {
    let cleaned = parse::strip_code_fences(raw);
    match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(_) => failure_analysis_fallback("expected a JSON object"),
        Err(e) => failure_analysis_fallback(e),
    }
}
