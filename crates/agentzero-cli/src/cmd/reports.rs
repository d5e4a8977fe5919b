use crate::output::{print_json, print_table};
use agentzero_core::{db::Store, paths};
use anyhow::Context;
use std::path::Path;

/// List stored analysis reports, newest first. Fails while `serve` holds
/// the database open.
pub fn run(root: &Path, limit: usize, json: bool) -> anyhow::Result<()> {
    let db = paths::db_path(root);
    let store = Store::open(&db).with_context(|| format!("failed to open {}", db.display()))?;
    let reports = store.list_reports(limit)?;

    if json {
        return print_json(&reports);
    }

    if reports.is_empty() {
        println!("No reports.");
        return Ok(());
    }

    let rows = reports
        .iter()
        .map(|r| {
            vec![
                r.execution_id.clone(),
                r.status.clone(),
                r.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                r.pr_details
                    .as_ref()
                    .and_then(|pr| pr.number.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["EXECUTION", "STATUS", "TIMESTAMP", "PR"], rows);
    Ok(())
}
