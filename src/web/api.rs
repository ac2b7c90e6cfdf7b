use crate::pipeline::coordinator::{ScanCoordinator, ScanReport};
use crate::sink::traits::Sink;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state for the control API
pub struct AppState {
    pub coordinator: Arc<ScanCoordinator>,
    pub sink: Arc<dyn Sink>,
    pub instance_id: String,
    pub start_time: std::time::Instant,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub instance_id: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub watermark: Option<DateTime<Utc>>,
    pub last_scan: Option<ScanReport>,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// GET /status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        instance_id: state.instance_id.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        watermark: state.coordinator.watermark().await,
        last_scan: state.coordinator.last_report().await,
    })
}

/// POST /scan — the manual trigger.
///
/// Runs a scan (or reports the skip), returns the report, and posts a
/// human-readable confirmation to the chat channel. Timer-driven scans
/// never post confirmations; manual ones always do.
pub async fn trigger_scan(State(state): State<Arc<AppState>>) -> Json<ScanReport> {
    info!("Manual scan triggered");
    let report = state.coordinator.run_scan().await;

    let confirmation = summarize(&report);
    if let Err(e) = state.sink.send(&confirmation).await {
        warn!(error = %e, "Failed to post scan confirmation to channel");
    }

    Json(report)
}

fn summarize(report: &ScanReport) -> String {
    match report {
        ScanReport::Skipped => "Scan skipped: another scan is already in progress.".to_string(),
        ScanReport::NoSourceFile => "Scan complete: no matching log file found.".to_string(),
        ScanReport::Failed { error } => format!("Scan failed: {}.", error),
        ScanReport::NoNewRecords { .. } => "Scan complete: no new messages.".to_string(),
        ScanReport::Delivered {
            accepted, delivery, ..
        } => {
            if delivery.units_failed > 0 {
                format!(
                    "Scan complete: {} new messages, {} of {} batches sent before a send failure.",
                    accepted,
                    delivery.units_sent,
                    delivery.units_sent + delivery.units_failed
                )
            } else {
                format!(
                    "Scan complete: relayed {} new messages in {} batch(es).",
                    accepted, delivery.units_sent
                )
            }
        }
    }
}
