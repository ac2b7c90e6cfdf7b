use crate::config::parse::load_config;
use crate::pipeline::coordinator::ScanCoordinator;
use crate::pipeline::scheduler::run_scheduler;
use crate::pipeline::watermark::Watermark;
use crate::remote::http::HttpFileStore;
use crate::remote::traits::{RemoteStore, TransportError};
use crate::sink::http::ChannelSink;
use crate::sink::traits::Sink;
use crate::source::record::PatternError;
use crate::web::api::AppState;
use crate::web::server::run_server;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::parse::ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("record pattern error: {0}")]
    Pattern(#[from] PatternError),

    #[error("control server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match config_path {
        Some(path) => path,
        None => {
            eprintln!("Error: config not found");
            eprintln!("Searched locations:");
            eprintln!("  ~/.config/chatrelay/config.yml");
            eprintln!("  /etc/chatrelay/config.yml");
            eprintln!("\nUse --config <path> to specify a config file, or run 'chatrelay config init' to generate one.");
            std::process::exit(1);
        }
    };

    run_relay(&config_path).await.map_err(|e| e.into())
}

async fn run_relay(config_path: &Path) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;

    let store: Arc<dyn RemoteStore> = Arc::new(HttpFileStore::new(&config.remote)?);
    let sink: Arc<dyn Sink> = Arc::new(ChannelSink::new(&config.sink));

    let coordinator = Arc::new(ScanCoordinator::new(
        store,
        sink.clone(),
        Watermark::new(),
        &config,
    )?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    info!(
        interval_secs = config.scan.interval.as_secs(),
        directory = %config.remote.directory,
        "Starting scan scheduler"
    );
    let scheduler_handle = tokio::spawn(run_scheduler(
        coordinator.clone(),
        config.scan.interval,
        shutdown_rx.clone(),
    ));

    let instance_id = hostname::get()
        .ok()
        .and_then(|h| h.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "chatrelay".to_string());

    let state = Arc::new(AppState {
        coordinator,
        sink,
        instance_id,
        start_time: std::time::Instant::now(),
    });

    info!("Starting control server on {}", config.web.listen);
    let listen = config.web.listen.clone();
    let server_handle = tokio::spawn(async move { run_server(state, &listen, shutdown_rx).await });

    info!("Relay started, press Ctrl+C to shutdown");

    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);

    scheduler_handle.await?;
    match server_handle.await? {
        Ok(()) => info!("Control server stopped"),
        Err(e) => error!(error = %e, "Control server error"),
    }

    info!("Relay shutdown complete");

    Ok(())
}
