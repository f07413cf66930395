//! # JSON Snapshot File
//!
//! Full-pull source reading a JSON array of `ReplicatedEntry` from disk.
//! The file is re-read on every pull, so a resync after reconnect sees
//! whatever the storage collaborator last dumped.

use async_trait::async_trait;
use ob_01_offer_book::{OfferSnapshotSource, SnapshotSourceError};
use shared_types::ReplicatedEntry;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Snapshot source backed by a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotSource {
    path: PathBuf,
}

impl JsonFileSnapshotSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OfferSnapshotSource for JsonFileSnapshotSource {
    async fn fetch_all(&self) -> Result<Vec<ReplicatedEntry>, SnapshotSourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            SnapshotSourceError::Unavailable(format!("{}: {}", self.path.display(), e))
        })?;

        // Entries are decoded as-is; validation happens in the rebuild,
        // which skips and reports malformed ones.
        let entries: Vec<ReplicatedEntry> = serde_json::from_slice(&bytes).map_err(|e| {
            SnapshotSourceError::Decode(format!("{}: {}", self.path.display(), e))
        })?;

        debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "Read snapshot file"
        );
        Ok(entries)
    }
}
