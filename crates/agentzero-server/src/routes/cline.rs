use axum::Json;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Default, Deserialize)]
pub struct ClineTask {
    #[serde(default)]
    pub task: Option<String>,
}

/// POST /api/cline: acknowledge a Cline CLI task. Nothing is executed.
pub async fn queue_task(body: Option<Json<ClineTask>>) -> Json<serde_json::Value> {
    let task = body.and_then(|Json(b)| b.task).unwrap_or_default();
    let task_id = format!("cline-{}", chrono::Utc::now().timestamp_millis());
    tracing::info!(%task_id, task = %task, "cline task queued");
    Json(json!({
        "success": true,
        "message": "Cline CLI task queued",
        "taskId": task_id,
    }))
}
