use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use super::api::{get_status, health_check, trigger_scan, AppState};

/// Start the control server with the given shared state.
pub async fn run_server(
    state: Arc<AppState>,
    listen: &str,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), std::io::Error> {
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/status", get(get_status))
        .route("/scan", post(trigger_scan))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!("Control server listening on {}", listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|&stop| stop).await;
            tracing::info!("Control server shutting down gracefully");
        })
        .await
}
