use async_trait::async_trait;
use chatrelay::config::types::{Config, RemoteConfig, ScanConfig, SinkConfig, WebConfig};
use chatrelay::pipeline::coordinator::{ScanCoordinator, ScanReport};
use chatrelay::pipeline::watermark::Watermark;
use chatrelay::remote::traits::{RemoteEntry, RemoteStore, TransportError};
use chatrelay::sink::traits::{Sink, SinkError};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

struct MemoryStore {
    entries: Vec<RemoteEntry>,
    files: std::sync::Mutex<HashMap<String, Vec<u8>>>,
    list_delay: Duration,
    downloads: AtomicUsize,
}

impl MemoryStore {
    fn new(names: &[&str]) -> Self {
        Self {
            entries: names
                .iter()
                .map(|n| RemoteEntry {
                    name: n.to_string(),
                    size: 0,
                })
                .collect(),
            files: std::sync::Mutex::new(HashMap::new()),
            list_delay: Duration::ZERO,
            downloads: AtomicUsize::new(0),
        }
    }

    fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.set_file(path, content);
        self
    }

    fn with_list_delay(mut self, delay: Duration) -> Self {
        self.list_delay = delay;
        self
    }

    fn set_file(&self, path: &str, content: impl Into<Vec<u8>>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.into());
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list(&self, _directory: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        Ok(self.entries.clone())
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 404,
                message: format!("no such file: {}", path),
            })
    }
}

struct FailingStore;

#[async_trait]
impl RemoteStore for FailingStore {
    async fn list(&self, _directory: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        Err(TransportError::Status {
            status: 503,
            message: "store offline".to_string(),
        })
    }

    async fn download(&self, _path: &str) -> Result<Vec<u8>, TransportError> {
        Err(TransportError::Status {
            status: 503,
            message: "store offline".to_string(),
        })
    }
}

struct RecordingSink {
    sent: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingSink {
    fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(&self, content: &str) -> Result<(), SinkError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SinkError::Status {
                status: 429,
                message: "rate limited".to_string(),
            });
        }
        self.sent.lock().await.push(content.to_string());
        Ok(())
    }

    fn max_payload_len(&self) -> usize {
        2000
    }

    fn supports_markup(&self) -> bool {
        false
    }
}

fn test_config(payload_margin: usize) -> Config {
    Config {
        remote: RemoteConfig {
            url: "http://files.test".to_string(),
            username: "relay".to_string(),
            secret: "secret".to_string(),
            directory: "/server-data/Logs/".to_string(),
            file_marker: "chat".to_string(),
            file_extension: ".txt".to_string(),
            timeout: Duration::from_secs(5),
        },
        scan: ScanConfig::default(),
        sink: SinkConfig {
            url: "http://chat.test".to_string(),
            token: "token".to_string(),
            channel_id: "42".to_string(),
            max_payload_len: 2000,
            payload_margin,
            pacing: Duration::ZERO,
            author_markup: false,
        },
        web: WebConfig::default(),
    }
}

fn chat_line(ts: &str, author: &str, text: &str) -> String {
    format!(
        "[{}][info] Got message:ChatMessage{{chat=General, author='{}', text='{}'}}.",
        ts, author, text
    )
}

fn coordinator(
    store: Arc<dyn RemoteStore>,
    sink: Arc<RecordingSink>,
    payload_margin: usize,
) -> Arc<ScanCoordinator> {
    Arc::new(
        ScanCoordinator::new(store, sink, Watermark::new(), &test_config(payload_margin)).unwrap(),
    )
}

#[tokio::test]
async fn test_first_scan_delivers_and_rescan_is_idempotent() {
    let store = Arc::new(
        MemoryStore::new(&["server.log", "chatlog.txt"]).with_file(
            "/server-data/Logs/chatlog.txt",
            chat_line("06-01-24 09:15:00.000", "Ann", "hi"),
        ),
    );
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store, sink.clone(), 1900);

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Delivered {
            parsed,
            accepted,
            ref delivery,
        } => {
            assert_eq!(parsed, 1);
            assert_eq!(accepted, 1);
            assert_eq!(delivery.units_sent, 1);
            assert_eq!(delivery.records_delivered, 1);
        }
        other => panic!("expected Delivered, got {:?}", other),
    }

    {
        let sent = sink.sent.lock().await;
        assert_eq!(sent.as_slice(), ["09:15 - Ann: hi"]);
    }

    // Same remote content, second scan: nothing new
    let report = coordinator.run_scan().await;
    assert!(matches!(report, ScanReport::NoNewRecords { parsed: 1 }));
    assert_eq!(sink.sent.lock().await.len(), 1);
}

#[tokio::test]
async fn test_only_appended_records_are_delivered() {
    let first = chat_line("06-01-24 09:15:00.000", "Ann", "hi");
    let grown = format!(
        "{}\n{}\n",
        first,
        chat_line("06-01-24 09:16:00.000", "Bob", "hello")
    );

    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"]).with_file("/server-data/Logs/chatlog.txt", first),
    );
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store.clone(), sink.clone(), 1900);

    coordinator.run_scan().await;

    // The remote file grew; the next scan re-reads it in full but must only
    // deliver the appended record
    store.set_file("/server-data/Logs/chatlog.txt", grown);

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Delivered { parsed, accepted, .. } => {
            assert_eq!(parsed, 2);
            assert_eq!(accepted, 1);
        }
        other => panic!("expected Delivered, got {:?}", other),
    }

    let sent = sink.sent.lock().await;
    assert_eq!(
        sent.as_slice(),
        ["09:15 - Ann: hi", "09:16 - Bob: hello"]
    );
}

#[tokio::test]
async fn test_no_matching_file_reports_no_source_and_skips_download() {
    let store = Arc::new(MemoryStore::new(&["server.log", "metrics.csv"]));
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store.clone(), sink.clone(), 1900);

    let report = coordinator.run_scan().await;
    assert!(matches!(report, ScanReport::NoSourceFile));
    assert_eq!(store.downloads.load(Ordering::SeqCst), 0);
    assert!(sink.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_transport_failure_reports_failed_and_leaves_watermark_untouched() {
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(Arc::new(FailingStore), sink.clone(), 1900);

    let report = coordinator.run_scan().await;
    assert!(matches!(report, ScanReport::Failed { .. }));
    assert!(coordinator.watermark().await.is_none());
    assert!(sink.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_invalid_utf8_reports_failed() {
    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"])
            .with_file("/server-data/Logs/chatlog.txt", vec![0xff, 0xfe, 0xfd]),
    );
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store, sink.clone(), 1900);

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Failed { error } => assert!(error.contains("UTF-8")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(coordinator.watermark().await.is_none());
}

#[tokio::test]
async fn test_concurrent_scans_are_single_flight() {
    let content = chat_line("06-01-24 09:15:00.000", "Ann", "hi");
    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"])
            .with_file("/server-data/Logs/chatlog.txt", content)
            .with_list_delay(Duration::from_millis(200)),
    );
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store, sink.clone(), 1900);

    let background = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move { coordinator.run_scan().await })
    };

    // Let the background scan reach the slow listing call, then race it
    tokio::time::sleep(Duration::from_millis(50)).await;
    let overlapping = coordinator.run_scan().await;
    assert!(matches!(overlapping, ScanReport::Skipped));

    let report = background.await.unwrap();
    assert!(matches!(report, ScanReport::Delivered { .. }));

    // Exactly one delivery, one watermark mutation
    assert_eq!(sink.sent.lock().await.len(), 1);
    assert!(coordinator.watermark().await.is_some());

    // The guard was released: a later scan runs normally again
    let rescan = coordinator.run_scan().await;
    assert!(matches!(rescan, ScanReport::NoNewRecords { .. }));
}

#[tokio::test]
async fn test_send_failure_loses_batch_without_requeue() {
    let content = format!(
        "{}\n{}\n",
        chat_line("06-01-24 09:15:00.000", "Ann", "first message"),
        chat_line("06-01-24 09:16:00.000", "Bob", "second message"),
    );
    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"]).with_file("/server-data/Logs/chatlog.txt", content),
    );
    let sink = Arc::new(RecordingSink::new());
    sink.fail.store(true, Ordering::SeqCst);

    // Margin small enough that each record becomes its own unit
    let coordinator = coordinator(store, sink.clone(), 40);

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Delivered {
            accepted,
            ref delivery,
            ..
        } => {
            assert_eq!(accepted, 2);
            assert_eq!(delivery.units_sent, 0);
            assert_eq!(delivery.units_failed, 2);
            assert!(delivery.error.is_some());
        }
        other => panic!("expected Delivered, got {:?}", other),
    }

    // The records stay accepted in the watermark: the failed batch is lost,
    // never re-delivered
    sink.fail.store(false, Ordering::SeqCst);
    let rescan = coordinator.run_scan().await;
    assert!(matches!(rescan, ScanReport::NoNewRecords { .. }));
    assert!(sink.sent.lock().await.is_empty());
}

#[tokio::test]
async fn test_fabricated_watermark_skips_history() {
    let content = format!(
        "{}\n{}\n",
        chat_line("06-01-24 09:10:00.000", "Ann", "ancient history"),
        chat_line("06-01-24 09:16:00.000", "Bob", "fresh"),
    );
    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"]).with_file("/server-data/Logs/chatlog.txt", content),
    );
    let sink = Arc::new(RecordingSink::new());

    let watermark = Watermark::starting_at(Utc.with_ymd_and_hms(2024, 6, 1, 9, 15, 0).unwrap());
    let coordinator =
        Arc::new(ScanCoordinator::new(store, sink.clone(), watermark, &test_config(1900)).unwrap());

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Delivered { parsed, accepted, .. } => {
            assert_eq!(parsed, 2);
            assert_eq!(accepted, 1);
        }
        other => panic!("expected Delivered, got {:?}", other),
    }

    let sent = sink.sent.lock().await;
    assert_eq!(sent.as_slice(), ["09:16 - Bob: fresh"]);
}

#[tokio::test]
async fn test_noise_lines_do_not_reach_the_sink() {
    let content = format!(
        "[06-01-24 09:14:00.000][info] Server started\njunk\n{}\n",
        chat_line("06-01-24 09:15:00.000", "Ann", "hi")
    );
    let store = Arc::new(
        MemoryStore::new(&["chatlog.txt"]).with_file("/server-data/Logs/chatlog.txt", content),
    );
    let sink = Arc::new(RecordingSink::new());
    let coordinator = coordinator(store, sink.clone(), 1900);

    let report = coordinator.run_scan().await;
    match report {
        ScanReport::Delivered { parsed, accepted, .. } => {
            assert_eq!(parsed, 1);
            assert_eq!(accepted, 1);
        }
        other => panic!("expected Delivered, got {:?}", other),
    }
}
