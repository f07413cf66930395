//! Offer Book Service
//!
//! Main service implementing `OfferBookApi`. Wraps the reconciliation store
//! in a single lock and turns every fold into change notifications.

use crate::config::OfferBookConfig;
use crate::domain::aggregates::OfferCounts;
use crate::domain::entities::{Fold, LiveChange, LiveSet};
use crate::domain::errors::OfferBookError;
use crate::domain::filter::OfferFilter;
use crate::domain::store::ReconciliationStore;
use crate::domain::value_objects::RebuildReport;
use crate::ports::inbound::OfferBookApi;
use crate::ports::outbound::{OfferBookEventPublisher, OfferSnapshotSource};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use shared_bus::OfferBookEvent;
use shared_types::{
    AcceptanceOutcome, OfferId, PayloadFingerprint, ReplicatedEntry, SequenceNumber,
};
use std::sync::Arc;
use tracing::info;

/// Offer Book Service
///
/// Locking model:
/// 1. `on_added` / `on_removed` / `set_filter` take the write lock
/// 2. `rebuild` holds an upgradable read while replaying, then upgrades
///    only for the swap; mutators wait, readers do not
/// 3. `snapshot` / `counts` take the read lock and clone
///
/// Events are published before the lock is released, so subscribers see
/// them in fold order.
pub struct OfferBookService {
    store: RwLock<ReconciliationStore>,
    publisher: Arc<dyn OfferBookEventPublisher>,
}

impl OfferBookService {
    /// Create a service over an empty store.
    pub fn new(config: OfferBookConfig, publisher: Arc<dyn OfferBookEventPublisher>) -> Self {
        Self::with_store(ReconciliationStore::new(config), publisher)
    }

    /// Create a service over an existing store.
    pub fn with_store(
        store: ReconciliationStore,
        publisher: Arc<dyn OfferBookEventPublisher>,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            publisher,
        }
    }

    /// Pull every entry from `source` and rebuild from it.
    ///
    /// The pull happens without holding any lock; a failed pull leaves the
    /// live set untouched.
    pub async fn resync(
        &self,
        source: &dyn OfferSnapshotSource,
    ) -> Result<RebuildReport, OfferBookError> {
        let entries = source.fetch_all().await?;
        info!(entries = entries.len(), "Resyncing offer book from full pull");
        Ok(self.rebuild(entries))
    }

    /// Number of live offers.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// True if no offer is live.
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Live entry for `offer_id`.
    pub fn get(&self, offer_id: &OfferId) -> Option<ReplicatedEntry> {
        self.store.read().get(offer_id).cloned()
    }

    /// Number of remembered removals.
    pub fn tombstone_count(&self) -> usize {
        self.store.read().tombstones().len()
    }

    fn publish_fold(
        &self,
        store: &ReconciliationStore,
        fold: Fold,
        offer_id: OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> AcceptanceOutcome {
        let event = match fold.change {
            Some(LiveChange::Inserted(entry)) => Some(OfferBookEvent::OfferAdded { entry }),
            Some(LiveChange::Replaced { previous, current }) => {
                Some(OfferBookEvent::OfferReplaced {
                    previous,
                    entry: current,
                })
            }
            Some(LiveChange::Removed(entry)) => {
                Some(OfferBookEvent::OfferRemoved { entry, sequence })
            }
            None if store.config().publish_ignored && fold.outcome.is_ignored() => {
                Some(OfferBookEvent::MutationIgnored {
                    offer_id,
                    fingerprint,
                    sequence,
                    outcome: fold.outcome.clone(),
                })
            }
            None => None,
        };

        if let Some(event) = event {
            self.publisher.publish(event);
        }
        fold.outcome
    }
}

impl OfferBookApi for OfferBookService {
    fn on_added(&self, entry: ReplicatedEntry) -> AcceptanceOutcome {
        let (offer_id, fingerprint, sequence) =
            (entry.offer_id.clone(), entry.fingerprint, entry.sequence);

        let mut store = self.store.write();
        let fold = store.fold_added(entry);
        self.publish_fold(&store, fold, offer_id, fingerprint, sequence)
    }

    fn on_removed(
        &self,
        offer_id: &OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> AcceptanceOutcome {
        let mut store = self.store.write();
        let fold = store.fold_removed(offer_id, fingerprint, sequence);
        self.publish_fold(&store, fold, offer_id.clone(), fingerprint, sequence)
    }

    fn snapshot(&self) -> LiveSet {
        self.store.read().snapshot()
    }

    fn rebuild(&self, entries: Vec<ReplicatedEntry>) -> RebuildReport {
        let current = self.store.upgradable_read();
        let (fresh, report) = current.rebuilt(entries);

        let mut current = RwLockUpgradableReadGuard::upgrade(current);
        *current = fresh;

        self.publisher.publish(OfferBookEvent::BookRebuilt {
            live_offers: report.snapshot.len(),
            skipped: report.skipped.len(),
        });
        report
    }

    fn counts(&self) -> OfferCounts {
        self.store.read().counts().clone()
    }

    fn recount(&self) -> OfferCounts {
        self.store.write().recount()
    }

    fn set_filter(&self, filter: Arc<dyn OfferFilter>) {
        self.store.write().set_filter(filter);
        info!("Suppression filter replaced");
    }
}
