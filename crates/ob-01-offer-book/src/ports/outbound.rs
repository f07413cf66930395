//! Outbound Ports (Driven Ports / SPI)

use crate::domain::errors::SnapshotSourceError;
use async_trait::async_trait;
use shared_bus::OfferBookEvent;
use shared_types::ReplicatedEntry;

/// Change-notification sink
///
/// Called while the service still holds its write lock, so it must not
/// block and must not call back into the service.
pub trait OfferBookEventPublisher: Send + Sync {
    /// Publish one event.
    fn publish(&self, event: OfferBookEvent);
}

/// Full-pull primitive of the storage collaborator
///
/// Used at startup and after reconnect to rebuild the live set.
#[async_trait]
pub trait OfferSnapshotSource: Send + Sync {
    /// Every entry the collaborator currently holds, in delivery order.
    async fn fetch_all(&self) -> Result<Vec<ReplicatedEntry>, SnapshotSourceError>;
}
