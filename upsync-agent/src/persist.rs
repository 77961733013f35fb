//! Persistence of the applied upstreams for proxy reloads.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};
use upsync_core::{Snapshot, UpstreamTemplate};

use crate::error::PersistError;

/// Writes the full upstream configuration file from a snapshot.
#[derive(Debug, Clone)]
pub struct UpstreamWriter {
    path: PathBuf,
    template: UpstreamTemplate,
}

impl UpstreamWriter {
    /// Create a writer for the file at `path`.
    pub fn new(path: impl Into<PathBuf>, template: UpstreamTemplate) -> Self {
        Self {
            path: path.into(),
            template,
        }
    }

    /// Location of the upstream file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the upstream file with the rendering of `snapshot`.
    ///
    /// The content is staged next to the target and renamed over it, so a
    /// reloading proxy sees either the old or the new file. A failed rename
    /// removes the staged file again.
    pub async fn persist(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        info!(
            "persisting {} upstreams into {}",
            snapshot.len(),
            self.path.display()
        );

        let staging = self.staging_path();
        fs::write(&staging, self.template.render(snapshot))
            .await
            .map_err(|e| PersistError::Io("failed to write staged upstream file", e))?;

        if let Err(e) = fs::rename(&staging, &self.path).await {
            if let Err(cleanup) = fs::remove_file(&staging).await {
                warn!(
                    "failed to remove staged upstream file {}: {}",
                    staging.display(),
                    cleanup
                );
            }
            return Err(PersistError::Io("failed to replace upstream file", e));
        }

        info!("persisting upstreams finished");
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}
