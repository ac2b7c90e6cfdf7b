use crate::config::types::RemoteConfig;
use crate::remote::traits::{RemoteStore, TransportError};
use tracing::debug;

/// Finds the current log file in the remote directory.
pub struct FileLocator {
    directory: String,
    marker: String,
    extension: String,
}

impl FileLocator {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            directory: config.directory.clone(),
            marker: config.file_marker.to_lowercase(),
            extension: config.file_extension.to_lowercase(),
        }
    }

    /// List the remote directory and return the first entry whose name
    /// contains the marker substring (case-insensitive) and ends with the
    /// configured extension. `Ok(None)` when nothing matches.
    pub async fn locate(&self, store: &dyn RemoteStore) -> Result<Option<String>, TransportError> {
        let entries = store.list(&self.directory).await?;

        for entry in &entries {
            let name = entry.name.to_lowercase();
            if name.contains(&self.marker) && name.ends_with(&self.extension) {
                debug!(file = %entry.name, "Located log file");
                return Ok(Some(entry.name.clone()));
            }
        }

        Ok(None)
    }
}
