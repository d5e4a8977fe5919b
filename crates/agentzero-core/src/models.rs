//! Persisted documents: users, history records and pipeline reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgentZeroError, Result};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackNotifications {
    #[serde(default = "default_true")]
    pub high_risk: bool,
    #[serde(default = "default_true")]
    pub success: bool,
}

impl Default for SlackNotifications {
    fn default() -> Self {
        Self {
            high_risk: true,
            success: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackIntegration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub notifications: SlackNotifications,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestFrequency {
    #[default]
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDigest {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: DigestFrequency,
    #[serde(default = "default_digest_time")]
    pub time: String,
}

impl Default for EmailDigest {
    fn default() -> Self {
        Self {
            enabled: false,
            frequency: DigestFrequency::Daily,
            time: default_digest_time(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integrations {
    #[serde(default)]
    pub slack: SlackIntegration,
    #[serde(default)]
    pub email_digest: EmailDigest,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiKeys {
    /// Per-user override of the server's Gemini key pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoNotifications {
    #[serde(default = "default_true")]
    pub slack: bool,
    #[serde(default)]
    pub email: bool,
}

impl Default for RepoNotifications {
    fn default() -> Self {
        Self {
            slack: true,
            email: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoredRepo {
    /// `owner/repo`
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default)]
    pub notifications: RepoNotifications,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scanned: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub integrations: Integrations,
    #[serde(default)]
    pub api_keys: ApiKeys,
    #[serde(default)]
    pub monitored_repos: Vec<MonitoredRepo>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, name: Option<String>, image: Option<String>) -> Result<Self> {
        if email.trim().is_empty() {
            return Err(AgentZeroError::Validation(
                "Please provide an email for this user.".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            email: email.to_string(),
            name,
            image,
            integrations: Integrations::default(),
            api_keys: ApiKeys::default(),
            monitored_repos: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Body of `POST /api/user/profile`. Absent sections are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub slack: Option<SlackIntegration>,
    #[serde(default)]
    pub email_digest: Option<EmailDigest>,
    /// Keys present here are set; an empty string clears the stored key.
    #[serde(default)]
    pub api_keys: Option<ApiKeys>,
}

impl ProfileUpdate {
    pub fn apply(self, user: &mut User) {
        if let Some(slack) = self.slack {
            user.integrations.slack = slack;
        }
        if let Some(digest) = self.email_digest {
            user.integrations.email_digest = digest;
        }
        if let Some(keys) = self.api_keys {
            if let Some(gemini) = keys.gemini {
                user.api_keys.gemini = Some(gemini).filter(|k| !k.trim().is_empty());
            }
            if let Some(openai) = keys.openai {
                user.api_keys.openai = Some(openai).filter(|k| !k.trim().is_empty());
            }
        }
        user.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

pub const DEFAULT_HISTORY_KIND: &str = "explanation";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: Uuid,
    pub user_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// explanation, security, diff, or the relay's endpoint name.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewHistory {
    #[serde(default)]
    pub repo: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
}

impl HistoryRecord {
    pub fn new(user_email: &str, input: NewHistory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_email: user_email.to_string(),
            repo: input.repo,
            file: input.file,
            kind: input
                .kind
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| DEFAULT_HISTORY_KIND.to_string()),
            summary: input.summary,
            timestamp: now,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(
        default,
        deserialize_with = "lenient::opt_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verdict: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JiraTicket {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrDetails {
    #[serde(
        default,
        deserialize_with = "lenient::opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Outcome of one Kestra pipeline execution, posted back by the flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "executionId")]
    pub execution_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: String,
    #[serde(default = "empty_object")]
    pub metrics: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_ticket: Option<JiraTicket>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_details: Option<PrDetails>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/reports`. Fields present overwrite the stored report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportPatch {
    #[serde(default, rename = "executionId")]
    pub execution_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_datetime")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub metrics: Option<serde_json::Value>,
    #[serde(default)]
    pub ai_analysis: Option<AiAnalysis>,
    #[serde(default)]
    pub jira_ticket: Option<JiraTicket>,
    #[serde(default)]
    pub pr_details: Option<PrDetails>,
}

impl ReportPatch {
    pub fn execution_id(&self) -> Result<&str> {
        self.execution_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AgentZeroError::Validation("executionId is required".to_string()))
    }

    /// Merge onto `existing`, or build a new report when there is none.
    pub fn apply(self, existing: Option<Report>) -> Result<Report> {
        let execution_id = self.execution_id()?.to_string();
        let now = Utc::now();
        let mut report = match existing {
            Some(r) => r,
            None => {
                let status = self
                    .status
                    .clone()
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| AgentZeroError::Validation("status is required".to_string()))?;
                Report {
                    execution_id,
                    timestamp: now,
                    status,
                    metrics: empty_object(),
                    ai_analysis: None,
                    jira_ticket: None,
                    pr_details: None,
                    created_at: now,
                    updated_at: now,
                }
            }
        };
        if let Some(ts) = self.timestamp {
            report.timestamp = ts;
        }
        if let Some(status) = self.status.filter(|s| !s.is_empty()) {
            report.status = status;
        }
        if let Some(metrics) = self.metrics {
            report.metrics = metrics;
        }
        if self.ai_analysis.is_some() {
            report.ai_analysis = self.ai_analysis;
        }
        if self.jira_ticket.is_some() {
            report.jira_ticket = self.jira_ticket;
        }
        if self.pr_details.is_some() {
            report.pr_details = self.pr_details;
        }
        report.updated_at = now;
        Ok(report)
    }
}

fn default_true() -> bool {
    true
}

fn default_digest_time() -> String {
    "09:00".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

// ---------------------------------------------------------------------------
// Lenient scalars
// ---------------------------------------------------------------------------

/// Kestra flows post numbers and strings interchangeably. These accept
/// either form and cast to the declared type.
mod lenient {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(Value::Number(n)) => Ok(Some(n.to_string())),
            Some(other) => Err(D::Error::custom(format!(
                "expected a string or number, found {other}"
            ))),
        }
    }

    pub fn opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => Ok(n.as_f64()),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("cannot cast \"{s}\" to a number"))),
            Some(other) => Err(D::Error::custom(format!("expected a number, found {other}"))),
        }
    }

    /// RFC 3339 strings or epoch milliseconds.
    pub fn opt_datetime<'de, D>(d: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Some(dt.with_timezone(&Utc)))
                .map_err(|_| D::Error::custom(format!("cannot cast \"{s}\" to a date"))),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("cannot cast {n} to a date"))),
            Some(other) => Err(D::Error::custom(format!("expected a date, found {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_user_has_integration_defaults() {
        let user = User::new("a@b.dev", None, None).unwrap();
        let v = serde_json::to_value(&user).unwrap();
        assert_eq!(v["integrations"]["slack"]["enabled"], false);
        assert_eq!(v["integrations"]["slack"]["notifications"]["highRisk"], true);
        assert_eq!(v["integrations"]["emailDigest"]["frequency"], "daily");
        assert_eq!(v["integrations"]["emailDigest"]["time"], "09:00");
        assert_eq!(v["monitoredRepos"], json!([]));
    }

    #[test]
    fn user_requires_email() {
        assert!(User::new("  ", None, None).is_err());
    }

    #[test]
    fn profile_update_rejects_unknown_frequency() {
        let bad = serde_json::from_value::<ProfileUpdate>(
            json!({"emailDigest": {"frequency": "hourly"}}),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn profile_update_leaves_absent_sections() {
        let mut user = User::new("a@b.dev", None, None).unwrap();
        let update: ProfileUpdate = serde_json::from_value(json!({
            "slack": {"webhookUrl": "https://hooks.slack.com/x", "enabled": true}
        }))
        .unwrap();
        update.apply(&mut user);
        assert!(user.integrations.slack.enabled);
        assert!(user.integrations.slack.notifications.success);
        assert_eq!(user.integrations.email_digest, EmailDigest::default());
    }

    #[test]
    fn history_kind_defaults_to_explanation() {
        let rec = HistoryRecord::new("a@b.dev", NewHistory::default());
        assert_eq!(rec.kind, "explanation");
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["type"], "explanation");
        assert_eq!(v["userEmail"], "a@b.dev");
    }

    #[test]
    fn history_id_is_a_hyphenated_uuid_string() {
        let rec = HistoryRecord::new("a@b.dev", NewHistory::default());
        let v = serde_json::to_value(&rec).unwrap();
        assert_eq!(v["id"], rec.id.to_string());
        assert_eq!(v["id"].as_str().unwrap().len(), 36);

        let back: HistoryRecord = serde_json::from_value(v).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn report_patch_requires_execution_id_and_status() {
        let patch: ReportPatch = serde_json::from_value(json!({"status": "SUCCESS"})).unwrap();
        assert!(patch.apply(None).is_err());
        let patch: ReportPatch = serde_json::from_value(json!({"executionId": "e1"})).unwrap();
        assert!(patch.apply(None).is_err());
    }

    #[test]
    fn report_patch_merges_onto_existing() {
        let first: ReportPatch = serde_json::from_value(json!({
            "executionId": "e1",
            "status": "RUNNING",
            "pr_details": {"number": "7", "url": "https://github.com/o/r/pull/7"}
        }))
        .unwrap();
        let report = first.apply(None).unwrap();
        assert_eq!(report.metrics, json!({}));

        let second: ReportPatch = serde_json::from_value(json!({
            "executionId": "e1",
            "status": "SUCCESS",
            "ai_analysis": {"score": 88, "verdict": "MERGE_CANDIDATE"}
        }))
        .unwrap();
        let merged = second.apply(Some(report.clone())).unwrap();
        assert_eq!(merged.status, "SUCCESS");
        assert_eq!(merged.pr_details, report.pr_details);
        assert_eq!(merged.created_at, report.created_at);
        assert_eq!(merged.ai_analysis.unwrap().score, Some(88.0));
    }

    #[test]
    fn report_patch_casts_numbers_and_strings() {
        let patch: ReportPatch = serde_json::from_value(json!({
            "executionId": "e1",
            "status": "SUCCESS",
            "timestamp": 1_700_000_000_000i64,
            "pr_details": {"number": 7},
            "ai_analysis": {"score": "91.5"}
        }))
        .unwrap();
        let report = patch.apply(None).unwrap();
        assert_eq!(report.pr_details.unwrap().number.as_deref(), Some("7"));
        assert_eq!(report.ai_analysis.unwrap().score, Some(91.5));
        assert_eq!(report.timestamp.timestamp_millis(), 1_700_000_000_000);

        let patch: ReportPatch = serde_json::from_value(json!({
            "executionId": "e2",
            "timestamp": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(patch.timestamp.unwrap().to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[test]
    fn report_patch_rejects_uncastable_values() {
        let bad = serde_json::from_value::<ReportPatch>(json!({
            "executionId": "e1",
            "ai_analysis": {"score": "high"}
        }));
        assert!(bad.is_err());
        let bad = serde_json::from_value::<ReportPatch>(json!({
            "executionId": "e1",
            "timestamp": "yesterday"
        }));
        assert!(bad.is_err());
    }

    #[test]
    fn stored_report_round_trips_through_lenient_fields() {
        let patch: ReportPatch = serde_json::from_value(json!({
            "executionId": "e1",
            "status": "SUCCESS",
            "pr_details": {"number": 12}
        }))
        .unwrap();
        let report = patch.apply(None).unwrap();
        let bytes = serde_json::to_vec(&report).unwrap();
        let back: Report = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn profile_update_sets_and_clears_api_keys() {
        let mut user = User::new("a@b.dev", None, None).unwrap();
        let update: ProfileUpdate =
            serde_json::from_value(json!({"apiKeys": {"gemini": "user-key"}})).unwrap();
        update.apply(&mut user);
        assert_eq!(user.api_keys.gemini.as_deref(), Some("user-key"));

        let update: ProfileUpdate =
            serde_json::from_value(json!({"apiKeys": {"openai": "sk-1"}})).unwrap();
        update.apply(&mut user);
        assert_eq!(user.api_keys.gemini.as_deref(), Some("user-key"));
        assert_eq!(user.api_keys.openai.as_deref(), Some("sk-1"));

        let update: ProfileUpdate =
            serde_json::from_value(json!({"apiKeys": {"gemini": ""}})).unwrap();
        update.apply(&mut user);
        assert!(user.api_keys.gemini.is_none());
    }
}
