use crate::config::types::SinkConfig;
use crate::sink::traits::{Sink, SinkError};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct MessageBody<'a> {
    content: &'a str,
}

/// HTTP client posting messages to one chat channel.
#[derive(Debug)]
pub struct ChannelSink {
    base_url: String,
    channel_id: String,
    token: String,
    max_payload_len: usize,
    author_markup: bool,
    client: reqwest::Client,
}

impl ChannelSink {
    pub fn new(config: &SinkConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            channel_id: config.channel_id.clone(),
            token: config.token.clone(),
            max_payload_len: config.max_payload_len,
            author_markup: config.author_markup,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Sink for ChannelSink {
    async fn send(&self, content: &str) -> Result<(), SinkError> {
        let url = format!(
            "{}/api/channels/{}/messages",
            self.base_url, self.channel_id
        );
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&MessageBody { content })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SinkError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }

    fn max_payload_len(&self) -> usize {
        self.max_payload_len
    }

    fn supports_markup(&self) -> bool {
        self.author_markup
    }
}
