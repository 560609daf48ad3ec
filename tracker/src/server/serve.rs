//! HTTP server setup

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::options::ServerOptions;
use crate::errors::TrackerError;
use crate::server::handlers::{
    auto_refresh_handler, clear_credential_handler, close_logs_handler, health_handler,
    open_logs_handler, projects_handler, refresh_handler, select_handler, set_credential_handler,
    stats_handler, version_handler,
};
use crate::server::state::ServerState;

/// Build the router exposing the tracker's inbound operations
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        // Health and version
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        // Hierarchy
        .route("/projects", get(projects_handler))
        .route("/refresh", post(refresh_handler))
        .route("/select", post(select_handler))
        .route("/stats", get(stats_handler))
        // Log view
        .route("/logs", post(open_logs_handler).delete(close_logs_handler))
        .route("/logs/auto-refresh", post(auto_refresh_handler))
        // Credential
        .route(
            "/credential",
            put(set_credential_handler).delete(clear_credential_handler),
        )
        // State and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server
pub async fn serve(
    options: &ServerOptions,
    state: Arc<ServerState>,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<JoinHandle<Result<(), TrackerError>>, TrackerError> {
    let app = router(state);

    let addr = format!("{}:{}", options.host, options.port);
    info!("Starting HTTP server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| TrackerError::ServerError(e.to_string()))?;

    let handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| TrackerError::ServerError(e.to_string()))
    });

    Ok(handle)
}
