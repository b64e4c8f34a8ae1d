pub mod api;

use crate::config::ServerConfig;
use crate::dashboard::Dashboard;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(api::index_handler))
        .route("/health", get(api::health_handler))
        .route("/api/options", get(api::options_handler))
        .route("/api/render", get(api::render_handler))
        .route("/api/preview", post(api::preview_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the axum server and run until Ctrl-C.
pub async fn serve(dashboard: Arc<Dashboard>, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    info!("Registering routes:");
    info!("  GET  /");
    info!("  GET  /api/options");
    info!("  GET  /api/render?days=50&ymin=0&ymax=3500&companies=apple,google");
    info!("  POST /api/preview");
    info!("  GET  /health");

    let app = router(AppState { dashboard }, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Dashboard listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
