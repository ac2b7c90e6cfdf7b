use crate::config::types::RemoteConfig;
use crate::remote::traits::{RemoteEntry, RemoteStore, TransportError};
use async_trait::async_trait;

/// HTTP client for a remote file store.
///
/// Each operation is a single authenticated request; nothing is held open
/// between a listing and a download.
#[derive(Debug)]
pub struct HttpFileStore {
    base_url: String,
    username: String,
    secret: String,
    client: reqwest::Client,
}

impl HttpFileStore {
    pub fn new(config: &RemoteConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            secret: config.secret.clone(),
            client,
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteStore for HttpFileStore {
    async fn list(&self, directory: &str) -> Result<Vec<RemoteEntry>, TransportError> {
        let url = format!("{}/api/files", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.secret))
            .query(&[("dir", directory)])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let entries = response.json().await?;
        Ok(entries)
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/api/files/content", self.base_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.secret))
            .query(&[("path", path)])
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
