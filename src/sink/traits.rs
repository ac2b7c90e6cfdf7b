use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("send request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sink returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Send capability of the downstream notification channel.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Post one payload to the channel.
    async fn send(&self, content: &str) -> Result<(), SinkError>;

    /// Hard payload cap enforced by the platform, in characters.
    fn max_payload_len(&self) -> usize;

    /// Whether the platform renders `**bold**` emphasis markup.
    fn supports_markup(&self) -> bool;
}
