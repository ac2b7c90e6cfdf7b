use crate::pipeline::coordinator::{ScanCoordinator, ScanReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Drive the coordinator on a fixed interval until shutdown.
///
/// The first tick fires immediately, so startup gets a scan without waiting
/// a full interval. A failed scan neither delays nor accelerates the next
/// tick. Timer-driven outcomes go to the operational log only; the chat
/// channel is reserved for records and manual-trigger confirmations.
pub async fn run_scheduler(
    coordinator: Arc<ScanCoordinator>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval_secs = interval.as_secs(), "Scan scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let report = coordinator.run_scan().await;
                log_report(&report);
            }
            _ = async { let _ = shutdown_rx.wait_for(|&stop| stop).await; } => {
                info!("Scan scheduler shutting down");
                return;
            }
        }
    }
}

fn log_report(report: &ScanReport) {
    match report {
        ScanReport::Skipped => {
            info!("Scheduled scan skipped, another scan in flight");
        }
        ScanReport::NoSourceFile => {
            warn!("Scheduled scan found no matching log file");
        }
        ScanReport::Failed { error } => {
            warn!(error = %error, "Scheduled scan failed");
        }
        ScanReport::NoNewRecords { parsed } => {
            info!(parsed, "Scheduled scan found no new records");
        }
        ScanReport::Delivered {
            parsed,
            accepted,
            delivery,
        } => {
            info!(
                parsed,
                accepted,
                units_sent = delivery.units_sent,
                units_failed = delivery.units_failed,
                truncated = delivery.truncated_lines,
                "Scheduled scan delivered records"
            );
        }
    }
}
