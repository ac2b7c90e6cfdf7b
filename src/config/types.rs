use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub remote: RemoteConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    pub sink: SinkConfig,
    #[serde(default)]
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the remote file store.
    pub url: String,
    pub username: String,
    pub secret: String,
    #[serde(default = "default_directory")]
    pub directory: String,
    /// Case-insensitive substring a log file name must contain.
    #[serde(default = "default_file_marker")]
    pub file_marker: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_directory() -> String {
    "/server-data/Logs/".to_string()
}

fn default_file_marker() -> String {
    "chat".to_string()
}

fn default_file_extension() -> String {
    ".txt".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
        }
    }
}

fn default_interval() -> Duration {
    Duration::from_secs(180)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Base URL of the chat platform API.
    pub url: String,
    pub token: String,
    pub channel_id: String,
    /// Hard payload cap enforced by the platform.
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,
    /// Working limit used when packing delivery units. Must not exceed
    /// max_payload_len.
    #[serde(default = "default_payload_margin")]
    pub payload_margin: usize,
    /// Delay between consecutive unit sends.
    #[serde(default = "default_pacing", with = "humantime_serde")]
    pub pacing: Duration,
    /// Render author names with the platform's bold markup.
    #[serde(default = "default_author_markup")]
    pub author_markup: bool,
}

fn default_max_payload_len() -> usize {
    2000
}

fn default_payload_margin() -> usize {
    1900
}

fn default_pacing() -> Duration {
    Duration::from_millis(500)
}

fn default_author_markup() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub listen: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:7140".to_string(),
        }
    }
}
