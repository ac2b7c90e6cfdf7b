use crate::config::types::Config;
use crate::pipeline::dispatcher::{DeliveryReport, Dispatcher};
use crate::pipeline::watermark::Watermark;
use crate::remote::traits::{RemoteStore, TransportError};
use crate::sink::traits::Sink;
use crate::source::fetcher::{FetchError, LogFetcher};
use crate::source::locator::FileLocator;
use crate::source::record::{PatternError, RecordParser};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Outcome of one scan.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScanReport {
    /// Another scan was already in flight.
    Skipped,
    /// No file in the remote directory matched the locator rules.
    NoSourceFile,
    /// Locate or fetch failed; the watermark was not touched.
    Failed { error: String },
    /// The file parsed but everything was already delivered.
    NoNewRecords { parsed: usize },
    Delivered {
        parsed: usize,
        accepted: usize,
        delivery: DeliveryReport,
    },
}

/// Runs one scan end to end: Locate -> Fetch -> Parse -> Watermark ->
/// Dispatch. At most one scan runs at a time; overlapping triggers get a
/// `Skipped` report instead of interleaving watermark mutations.
pub struct ScanCoordinator {
    store: Arc<dyn RemoteStore>,
    sink: Arc<dyn Sink>,
    locator: FileLocator,
    fetcher: LogFetcher,
    parser: RecordParser,
    dispatcher: Dispatcher,
    watermark: Mutex<Watermark>,
    running: AtomicBool,
    last_report: RwLock<Option<ScanReport>>,
}

/// Clears the single-flight flag on every exit path.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScanCoordinator {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        sink: Arc<dyn Sink>,
        watermark: Watermark,
        config: &Config,
    ) -> Result<Self, PatternError> {
        let unit_limit = config.sink.payload_margin.min(sink.max_payload_len());
        let dispatcher = Dispatcher::new(unit_limit, config.sink.pacing);

        Ok(Self {
            locator: FileLocator::new(&config.remote),
            fetcher: LogFetcher::new(&config.remote),
            parser: RecordParser::new()?,
            dispatcher,
            store,
            sink,
            watermark: Mutex::new(watermark),
            running: AtomicBool::new(false),
            last_report: RwLock::new(None),
        })
    }

    /// Run one scan, or report a skip if one is already in flight.
    pub async fn run_scan(&self) -> ScanReport {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Scan already in progress, skipping");
            return ScanReport::Skipped;
        }
        let _guard = RunningGuard(&self.running);

        let scan_id = Uuid::new_v4();
        let report = match self.scan_once(scan_id).await {
            Ok(report) => report,
            Err(e) => {
                warn!(scan_id = %scan_id, error = %e, "Scan failed");
                ScanReport::Failed {
                    error: e.to_string(),
                }
            }
        };

        *self.last_report.write().await = Some(report.clone());
        report
    }

    async fn scan_once(&self, scan_id: Uuid) -> Result<ScanReport, ScanError> {
        let Some(file_name) = self.locator.locate(self.store.as_ref()).await? else {
            info!(scan_id = %scan_id, "No matching log file in remote directory");
            return Ok(ScanReport::NoSourceFile);
        };

        let text = self.fetcher.fetch(self.store.as_ref(), &file_name).await?;

        let parsed = self.parser.parse(&text);
        let parsed_count = parsed.records.len();

        let accepted = self.watermark.lock().await.accept(parsed.records);
        if accepted.is_empty() {
            info!(
                scan_id = %scan_id,
                parsed = parsed_count,
                "No new records since last scan"
            );
            return Ok(ScanReport::NoNewRecords {
                parsed: parsed_count,
            });
        }

        info!(
            scan_id = %scan_id,
            file = %file_name,
            accepted = accepted.len(),
            "Delivering new records"
        );
        let delivery = self.dispatcher.deliver(self.sink.as_ref(), &accepted).await;

        Ok(ScanReport::Delivered {
            parsed: parsed_count,
            accepted: accepted.len(),
            delivery,
        })
    }

    /// Highest delivered timestamp, absent before the first successful scan.
    pub async fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark.lock().await.last()
    }

    /// The most recent scan's report, absent before the first scan.
    pub async fn last_report(&self) -> Option<ScanReport> {
        self.last_report.read().await.clone()
    }
}
