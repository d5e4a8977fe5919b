pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Scoring
        .route("/api/mcs-score", post(routes::mcs::score))
        .route("/api/mcs/aggregate", post(routes::mcs::aggregate))
        // AI
        .route("/api/ai/analyze", post(routes::ai::analyze))
        .route("/api/ai/explain", post(routes::ai::explain))
        .route("/api/ai/scan", post(routes::ai::scan))
        // History / profile
        .route(
            "/api/history",
            get(routes::history::list_history).post(routes::history::create_history),
        )
        .route(
            "/api/user/profile",
            get(routes::profile::get_profile).post(routes::profile::update_profile),
        )
        // Reports
        .route(
            "/api/reports",
            get(routes::reports::list_reports).post(routes::reports::upsert_report),
        )
        .route(
            "/api/reports/{execution_id}",
            get(routes::reports::get_report),
        )
        // Kestra
        .route(
            "/api/kestra/executions",
            get(routes::kestra::list_executions),
        )
        .route("/api/kestra/stats", get(routes::kestra::stats))
        .route("/api/kestra/logs", get(routes::kestra::logs))
        .route("/api/kestra/trigger", post(routes::kestra::trigger))
        // Cline
        .route("/api/cline", post(routes::cline::queue_task))
        // Auth
        .route("/api/auth/signin", post(routes::auth::sign_in))
        .route("/api/auth/signout", post(routes::auth::sign_out))
        .route("/api/auth/status", get(routes::auth::status))
        // GitHub
        .route("/webhook", post(routes::webhook::github_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

/// Start the dashboard API server.
pub async fn serve(root: PathBuf, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve_on(root, listener).await
}

/// Start the dashboard API server on a pre-bound listener.
///
/// Unlike `serve`, this accepts a `TcpListener` that was already bound so the
/// caller can read the actual port before starting (useful when `port = 0` and
/// the OS picks a free port).
pub async fn serve_on(
    root: PathBuf,
    listener: tokio::net::TcpListener,
) -> anyhow::Result<()> {
    let actual_port = listener.local_addr()?.port();
    let app = build_router(AppState::new(root)?);

    tracing::info!("Agent Zero API listening on http://localhost:{actual_port}");

    axum::serve(listener, app).await?;
    Ok(())
}
