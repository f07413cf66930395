//! In-memory full-pull source.

use crate::domain::errors::SnapshotSourceError;
use crate::ports::outbound::OfferSnapshotSource;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::ReplicatedEntry;

/// Snapshot source serving a fixed, replaceable set of entries.
#[derive(Default)]
pub struct StaticSnapshotSource {
    entries: RwLock<Vec<ReplicatedEntry>>,
}

impl StaticSnapshotSource {
    pub fn new(entries: Vec<ReplicatedEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Replace the served entries.
    pub fn replace(&self, entries: Vec<ReplicatedEntry>) {
        *self.entries.write() = entries;
    }
}

#[async_trait]
impl OfferSnapshotSource for StaticSnapshotSource {
    async fn fetch_all(&self) -> Result<Vec<ReplicatedEntry>, SnapshotSourceError> {
        Ok(self.entries.read().clone())
    }
}
