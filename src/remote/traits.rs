use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

/// File-listing and download capability of the remote log store.
///
/// Implementations open whatever session they need per call and release it
/// before returning; no session state is shared between operations.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// List the entries of a remote directory, in directory order.
    async fn list(&self, directory: &str) -> Result<Vec<RemoteEntry>, TransportError>;

    /// Download the full current content of the named file.
    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError>;
}
