//! Inbound Ports (Driving Ports / API)

use crate::domain::aggregates::OfferCounts;
use crate::domain::entities::LiveSet;
use crate::domain::filter::OfferFilter;
use crate::domain::value_objects::RebuildReport;
use shared_types::{
    AcceptanceOutcome, OfferId, PayloadFingerprint, ReplicatedEntry, SequenceNumber,
    StorageNotification,
};
use std::sync::Arc;

/// Primary Offer Book API
///
/// Every mutation is all-or-nothing and returns its outcome; none of them
/// fail. Implementations serialize mutations behind one exclusion boundary.
pub trait OfferBookApi: Send + Sync {
    /// Fold an `Added` notification.
    fn on_added(&self, entry: ReplicatedEntry) -> AcceptanceOutcome;

    /// Fold a `Removed` notification.
    fn on_removed(
        &self,
        offer_id: &OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> AcceptanceOutcome;

    /// Point-in-time view of the live set.
    fn snapshot(&self) -> LiveSet;

    /// Replace the live set with a replay of a full pull.
    ///
    /// Readers keep seeing the previous live set until the swap.
    fn rebuild(&self, entries: Vec<ReplicatedEntry>) -> RebuildReport;

    /// Per-currency, per-direction counts.
    fn counts(&self) -> OfferCounts;

    /// Recompute the counts from the live set.
    fn recount(&self) -> OfferCounts;

    /// Replace the suppression predicate, prospectively.
    fn set_filter(&self, filter: Arc<dyn OfferFilter>);

    /// Dispatch a storage notification to `on_added` / `on_removed`.
    fn apply(&self, notification: StorageNotification) -> AcceptanceOutcome {
        match notification {
            StorageNotification::Added {
                offer,
                fingerprint,
                sequence,
            } => self.on_added(ReplicatedEntry {
                offer_id: offer.offer_id.clone(),
                offer,
                fingerprint,
                sequence,
            }),
            StorageNotification::Removed {
                offer_id,
                fingerprint,
                sequence,
            } => self.on_removed(&offer_id, fingerprint, sequence),
        }
    }
}
