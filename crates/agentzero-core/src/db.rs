//! Document store for users, history records and reports using redb.
//!
//! # Table design
//!
//! | table     | key                                        | value |
//! |-----------|--------------------------------------------|-------|
//! | `users`   | email                                      | JSON `User` |
//! | `history` | `timestamp_ms` big-endian (8) ++ uuid (16) | JSON `HistoryRecord` |
//! | `reports` | executionId                                | JSON `Report` |
//!
//! Uniqueness of `email` and `executionId` is the table key itself, so every
//! upsert is a single read-modify-write inside one write transaction.

use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, TableDefinition};
use uuid::Uuid;

use crate::error::{AgentZeroError, Result};
use crate::models::{HistoryRecord, NewHistory, ProfileUpdate, Report, ReportPatch, User};

const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");
const HISTORY: TableDefinition<&[u8], &[u8]> = TableDefinition::new("history");
const REPORTS: TableDefinition<&str, &[u8]> = TableDefinition::new("reports");

fn db_err<E: Display>(e: E) -> AgentZeroError {
    AgentZeroError::Db(e.to_string())
}

fn history_key(ts: DateTime<Utc>, id: Uuid) -> [u8; 24] {
    let mut key = [0u8; 24];
    let ms = ts.timestamp_millis().max(0) as u64;
    key[..8].copy_from_slice(&ms.to_be_bytes());
    key[8..].copy_from_slice(id.as_bytes());
    key
}

/// Whether an upsert created the document or updated an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

pub struct Store {
    db: Database,
}

impl Store {
    /// Open or create the database at `path`, creating all tables.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        wt.open_table(USERS).map_err(db_err)?;
        wt.open_table(HISTORY).map_err(db_err)?;
        wt.open_table(REPORTS).map_err(db_err)?;
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn get_user(&self, email: &str) -> Result<Option<User>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(USERS).map_err(db_err)?;
        let user = match table.get(email).map_err(db_err)? {
            Some(v) => Some(serde_json::from_slice(v.value())?),
            None => None,
        };
        Ok(user)
    }

    /// Return the user for `email`, creating it from the session identity on
    /// first access.
    pub fn get_or_create_user(
        &self,
        email: &str,
        name: Option<String>,
        image: Option<String>,
    ) -> Result<User> {
        let wt = self.db.begin_write().map_err(db_err)?;
        let user = {
            let mut table = wt.open_table(USERS).map_err(db_err)?;
            let existing = table
                .get(email)
                .map_err(db_err)?
                .map(|g| g.value().to_vec());
            match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => {
                    let user = User::new(email, name, image)?;
                    let value = serde_json::to_vec(&user)?;
                    table.insert(email, value.as_slice()).map_err(db_err)?;
                    tracing::info!(email, "created user profile");
                    user
                }
            }
        };
        wt.commit().map_err(db_err)?;
        Ok(user)
    }

    /// Apply integration settings to `email`, creating the user if needed.
    pub fn update_profile(&self, email: &str, update: ProfileUpdate) -> Result<User> {
        let wt = self.db.begin_write().map_err(db_err)?;
        let user = {
            let mut table = wt.open_table(USERS).map_err(db_err)?;
            let existing = table
                .get(email)
                .map_err(db_err)?
                .map(|g| g.value().to_vec());
            let mut user = match existing {
                Some(bytes) => serde_json::from_slice(&bytes)?,
                None => User::new(email, None, None)?,
            };
            update.apply(&mut user);
            let value = serde_json::to_vec(&user)?;
            table.insert(email, value.as_slice()).map_err(db_err)?;
            user
        };
        wt.commit().map_err(db_err)?;
        Ok(user)
    }

    /// Replace a stored user document wholesale.
    pub fn put_user(&self, user: &User) -> Result<()> {
        let value = serde_json::to_vec(user)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(USERS).map_err(db_err)?;
            table
                .insert(user.email.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub fn insert_history(&self, user_email: &str, input: NewHistory) -> Result<HistoryRecord> {
        let record = HistoryRecord::new(user_email, input);
        self.put_history(&record)?;
        Ok(record)
    }

    pub fn put_history(&self, record: &HistoryRecord) -> Result<()> {
        let key = history_key(record.timestamp, record.id);
        let value = serde_json::to_vec(record)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(HISTORY).map_err(db_err)?;
            table
                .insert(key.as_slice(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    /// Most recent `limit` records for `user_email`, newest first.
    ///
    /// Keys sort by timestamp, so a reverse scan yields newest first.
    pub fn list_history(&self, user_email: &str, limit: usize) -> Result<Vec<HistoryRecord>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(HISTORY).map_err(db_err)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(db_err)?.rev() {
            if out.len() >= limit {
                break;
            }
            let (_, v) = entry.map_err(db_err)?;
            let record: HistoryRecord = serde_json::from_slice(v.value())?;
            if record.user_email == user_email {
                out.push(record);
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Insert or update the report keyed by the patch's `executionId`.
    pub fn upsert_report(&self, patch: ReportPatch) -> Result<(Report, Upsert)> {
        let id = patch.execution_id()?.to_string();
        let wt = self.db.begin_write().map_err(db_err)?;
        let result = {
            let mut table = wt.open_table(REPORTS).map_err(db_err)?;
            let existing: Option<Report> = match table
                .get(id.as_str())
                .map_err(db_err)?
                .map(|g| g.value().to_vec())
            {
                Some(bytes) => Some(serde_json::from_slice(&bytes)?),
                None => None,
            };
            let outcome = if existing.is_some() {
                Upsert::Updated
            } else {
                Upsert::Created
            };
            let report = patch.apply(existing)?;
            let value = serde_json::to_vec(&report)?;
            table
                .insert(id.as_str(), value.as_slice())
                .map_err(db_err)?;
            (report, outcome)
        };
        wt.commit().map_err(db_err)?;
        tracing::debug!(execution_id = %id, outcome = ?result.1, "report upserted");
        Ok(result)
    }

    pub fn get_report(&self, execution_id: &str) -> Result<Report> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(REPORTS).map_err(db_err)?;
        let report = match table.get(execution_id).map_err(db_err)? {
            Some(v) => serde_json::from_slice(v.value())?,
            None => return Err(AgentZeroError::ReportNotFound(execution_id.to_string())),
        };
        Ok(report)
    }

    /// Most recent `limit` reports by `timestamp`, newest first.
    pub fn list_reports(&self, limit: usize) -> Result<Vec<Report>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(REPORTS).map_err(db_err)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            let report: Report = serde_json::from_slice(v.value())?;
            out.push(report);
        }
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out.truncate(limit);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;
    use tempfile::TempDir;

    fn open_tmp() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(&dir.path().join("test.db")).unwrap();
        (dir, store)
    }

    fn patch(v: serde_json::Value) -> ReportPatch {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn get_or_create_user_is_lazy_and_stable() {
        let (_dir, store) = open_tmp();
        assert!(store.get_user("dev@agentzero.dev").unwrap().is_none());

        let created = store
            .get_or_create_user("dev@agentzero.dev", Some("Dev".into()), None)
            .unwrap();
        let again = store
            .get_or_create_user("dev@agentzero.dev", Some("Other".into()), None)
            .unwrap();
        assert_eq!(created, again);
        assert_eq!(again.name.as_deref(), Some("Dev"));
    }

    #[test]
    fn update_profile_upserts() {
        let (_dir, store) = open_tmp();
        let update: ProfileUpdate =
            serde_json::from_value(json!({"emailDigest": {"enabled": true, "frequency": "weekly"}}))
                .unwrap();
        let user = store.update_profile("new@agentzero.dev", update).unwrap();
        assert!(user.integrations.email_digest.enabled);
        assert_eq!(
            store.get_user("new@agentzero.dev").unwrap().unwrap(),
            user
        );
    }

    #[test]
    fn history_is_per_user_newest_first_and_limited() {
        let (_dir, store) = open_tmp();
        let base = Utc::now() - Duration::minutes(30);
        for i in 0..12 {
            let mut rec = HistoryRecord::new(
                "a@x.dev",
                NewHistory {
                    summary: Some(format!("s{i}")),
                    ..Default::default()
                },
            );
            rec.timestamp = base + Duration::minutes(i);
            store.put_history(&rec).unwrap();
        }
        store
            .insert_history("b@x.dev", NewHistory::default())
            .unwrap();

        let list = store.list_history("a@x.dev", 10).unwrap();
        assert_eq!(list.len(), 10);
        assert_eq!(list[0].summary.as_deref(), Some("s11"));
        assert_eq!(list[9].summary.as_deref(), Some("s2"));
        assert!(list.iter().all(|r| r.user_email == "a@x.dev"));

        let other = store.list_history("b@x.dev", 10).unwrap();
        assert_eq!(other.len(), 1);
    }

    #[test]
    fn report_upsert_is_idempotent() {
        let (_dir, store) = open_tmp();
        let body = json!({"executionId": "exec-1", "status": "SUCCESS"});

        let (_, first) = store.upsert_report(patch(body.clone())).unwrap();
        let (_, second) = store.upsert_report(patch(body)).unwrap();
        assert_eq!(first, Upsert::Created);
        assert_eq!(second, Upsert::Updated);
        assert_eq!(store.list_reports(50).unwrap().len(), 1);
    }

    #[test]
    fn report_update_overwrites_fields() {
        let (_dir, store) = open_tmp();
        store
            .upsert_report(patch(json!({"executionId": "exec-1", "status": "RUNNING"})))
            .unwrap();
        store
            .upsert_report(patch(json!({
                "executionId": "exec-1",
                "status": "SUCCESS",
                "metrics": {"coverage": 91}
            })))
            .unwrap();
        let report = store.get_report("exec-1").unwrap();
        assert_eq!(report.status, "SUCCESS");
        assert_eq!(report.metrics["coverage"], 91);
    }

    #[test]
    fn reports_are_listed_newest_first() {
        let (_dir, store) = open_tmp();
        store
            .upsert_report(patch(json!({
                "executionId": "old", "status": "SUCCESS",
                "timestamp": "2024-01-01T00:00:00Z"
            })))
            .unwrap();
        store
            .upsert_report(patch(json!({
                "executionId": "new", "status": "SUCCESS",
                "timestamp": "2025-01-01T00:00:00Z"
            })))
            .unwrap();
        let list = store.list_reports(1).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].execution_id, "new");
    }

    #[test]
    fn missing_report_is_not_found() {
        let (_dir, store) = open_tmp();
        assert!(matches!(
            store.get_report("nope"),
            Err(AgentZeroError::ReportNotFound(_))
        ));
    }

    #[test]
    fn invalid_report_leaves_store_untouched() {
        let (_dir, store) = open_tmp();
        assert!(store
            .upsert_report(patch(json!({"executionId": "e"})))
            .is_err());
        assert!(store.list_reports(50).unwrap().is_empty());
    }
}
