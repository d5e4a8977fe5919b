//! Weighted Merge Candidate Score computed from CI and review signals.
//!
//! | signal        | weight | rule                                              |
//! |---------------|--------|---------------------------------------------------|
//! | CodeRabbit    | 40     | approvable 40, changes_requested 0, otherwise 20  |
//! | Vercel build  | 30     | ready/succeeded 30, error/failed 0 and -20, else 10 |
//! | Coverage      | 20     | `min(20, floor(coverage * 0.2))`                   |
//! | Shadow agent  | 10     | 10 when there are no critical issues              |

use serde::{Deserialize, Serialize};

use crate::types::McsStatus;

const MAX_SCORE: i64 = 100;
const BUILD_FAILURE_PENALTY: i64 = 20;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSignal {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageSignal {
    #[serde(default)]
    pub coverage: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShadowAgentSignal {
    #[serde(default)]
    pub critical_issues: u64,
}

/// Signals gathered by the metrics flow. Every section may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Signals {
    #[serde(default)]
    pub coderabbit: Option<StatusSignal>,
    #[serde(default)]
    pub vercel: Option<StatusSignal>,
    #[serde(default)]
    pub codecov: Option<CoverageSignal>,
    #[serde(default)]
    pub shadow_agent: Option<ShadowAgentSignal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateScore {
    pub mcs: u32,
    pub breakdown: Vec<String>,
    pub status: McsStatus,
}

fn status_of(signal: &Option<StatusSignal>) -> &str {
    signal
        .as_ref()
        .and_then(|s| s.status.as_deref())
        .unwrap_or("unknown")
}

pub fn compute(signals: &Signals) -> AggregateScore {
    let mut score: i64 = 0;
    let mut breakdown = Vec::new();

    match status_of(&signals.coderabbit) {
        "approvable" => {
            score += 40;
            breakdown.push("CodeRabbit: +40 (Approvable)".to_string());
        }
        "changes_requested" => {
            breakdown.push("CodeRabbit: +0 (Changes Requested)".to_string());
        }
        _ => {
            score += 20;
            breakdown.push("CodeRabbit: +20 (Neutral/Unknown)".to_string());
        }
    }

    match status_of(&signals.vercel) {
        "ready" | "succeeded" => {
            score += 30;
            breakdown.push("Vercel: +30 (Build Succeeded)".to_string());
        }
        "error" | "failed" => {
            breakdown.push("Vercel: +0 (Build Failed)".to_string());
            score = (score - BUILD_FAILURE_PENALTY).max(0);
            breakdown.push("Penalty: -20 (Critical Build Failure)".to_string());
        }
        other => {
            score += 10;
            breakdown.push(format!("Vercel: +10 (Status: {other})"));
        }
    }

    let coverage = signals.codecov.as_ref().map(|c| c.coverage).unwrap_or(0.0);
    let cov_points = ((coverage * 0.2).floor() as i64).clamp(0, 20);
    score += cov_points;
    breakdown.push(format!("Coverage: +{cov_points} ({coverage}%)"));

    let critical = signals
        .shadow_agent
        .as_ref()
        .map(|s| s.critical_issues)
        .unwrap_or(0);
    if critical == 0 {
        score += 10;
        breakdown.push("Shadow Agent: +10 (No Critical Issues)".to_string());
    } else {
        breakdown.push(format!("Shadow Agent: +0 ({critical} Critical Issues)"));
    }

    let mcs = score.clamp(0, MAX_SCORE) as u32;
    AggregateScore {
        mcs,
        breakdown,
        status: McsStatus::from_score(mcs),
    }
}
