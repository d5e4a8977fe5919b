use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// McsStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum McsStatus {
    MergeCandidate,
    NeedsReview,
    Autocorrect,
}

impl McsStatus {
    /// Dashboard thresholds: `>= 80` merge candidate, `>= 50` needs review,
    /// anything lower needs an autonomous fix.
    pub fn from_score(score: u32) -> Self {
        if score >= 80 {
            McsStatus::MergeCandidate
        } else if score >= 50 {
            McsStatus::NeedsReview
        } else {
            McsStatus::Autocorrect
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            McsStatus::MergeCandidate => "MERGE_CANDIDATE",
            McsStatus::NeedsReview => "NEEDS_REVIEW",
            McsStatus::Autocorrect => "AUTOCORRECT",
        }
    }
}

impl fmt::Display for McsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for McsStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MERGE_CANDIDATE" => Ok(McsStatus::MergeCandidate),
            "NEEDS_REVIEW" => Ok(McsStatus::NeedsReview),
            "AUTOCORRECT" => Ok(McsStatus::Autocorrect),
            other => Err(format!("unknown MCS status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// McsRequest
// ---------------------------------------------------------------------------

/// Pull-request metadata scraped by the content script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McsRequest {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files_changed_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additions: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deletions: Option<u64>,
}

// ---------------------------------------------------------------------------
// McsData
// ---------------------------------------------------------------------------

/// A scored pull request as shown in the badge. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McsData {
    pub score: u32,
    pub status: McsStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risks: Option<Vec<String>>,
    pub last_updated: DateTime<Utc>,
}

impl McsData {
    /// Read a `/api/mcs-score` body. Scores are clamped to 0..=100; a missing
    /// or unrecognised status is derived from the score.
    pub fn from_response(value: &serde_json::Value) -> Option<Self> {
        let raw = value.get("score")?.as_f64()?;
        let score = raw.clamp(0.0, 100.0).round() as u32;
        let status = value
            .get("status")
            .and_then(|s| s.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| McsStatus::from_score(score));
        let reasoning = value
            .get("reasoning")
            .and_then(|r| r.as_str())
            .map(str::to_string);
        let risks = value.get("risks").and_then(|r| r.as_array()).map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        });
        Some(Self {
            score,
            status,
            reasoning,
            risks,
            last_updated: Utc::now(),
        })
    }
}

// ---------------------------------------------------------------------------
// McsBadge
// ---------------------------------------------------------------------------

const EMERALD: &str = "#10b981";
const AMBER: &str = "#f59e0b";
const BLUE: &str = "#3b82f6";
const GRAY: &str = "#6b7280";
const RED: &str = "#ef4444";

/// Everything the content script needs to draw the MCS badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McsBadge {
    pub score: u32,
    pub label: String,
    pub status_color: String,
    pub bar_color: String,
}

impl McsBadge {
    pub fn from_data(data: Option<&McsData>) -> Self {
        let score = data.map(|d| d.score).unwrap_or(0).min(100);
        let (label, status_color) = match data.map(|d| d.status) {
            Some(status) => {
                let color = match status {
                    McsStatus::MergeCandidate => EMERALD,
                    McsStatus::NeedsReview => AMBER,
                    McsStatus::Autocorrect => BLUE,
                };
                (status.as_str().replace('_', " "), color)
            }
            None => ("ANALYZING".to_string(), GRAY),
        };
        let bar_color = if score >= 80 {
            EMERALD
        } else if score >= 50 {
            AMBER
        } else {
            RED
        };
        Self {
            score,
            label,
            status_color: status_color.to_string(),
            bar_color: bar_color.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Normalized result of an analyze/explain/scan request, as shown in the side panel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub summary: String,
    pub details: String,
    pub risks: Vec<String>,
}

// ---------------------------------------------------------------------------
// AiTask
// ---------------------------------------------------------------------------

/// The three code-level AI endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiTask {
    Analyze,
    Explain,
    Scan,
}

impl AiTask {
    pub fn as_str(self) -> &'static str {
        match self {
            AiTask::Analyze => "analyze",
            AiTask::Explain => "explain",
            AiTask::Scan => "scan",
        }
    }
}

impl fmt::Display for AiTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
