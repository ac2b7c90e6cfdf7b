use crate::config::types::RemoteConfig;
use crate::remote::traits::{RemoteStore, TransportError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("log content is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
}

/// Downloads and decodes the located log file.
///
/// The file is always re-read from the start; incrementality comes from the
/// watermark filter, not from byte-range fetching.
pub struct LogFetcher {
    directory: String,
}

impl LogFetcher {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            directory: config.directory.clone(),
        }
    }

    pub async fn fetch(
        &self,
        store: &dyn RemoteStore,
        file_name: &str,
    ) -> Result<String, FetchError> {
        let path = join_remote_path(&self.directory, file_name);
        let bytes = store.download(&path).await?;
        Ok(String::from_utf8(bytes)?)
    }
}

fn join_remote_path(directory: &str, file_name: &str) -> String {
    if directory.ends_with('/') {
        format!("{}{}", directory, file_name)
    } else {
        format!("{}/{}", directory, file_name)
    }
}
