//! # Reconciliation Store
//!
//! Folds `Added` / `Removed` notifications, delivered in any order and any
//! number of times, into the live offer set.
//!
//! ## Acceptance rules
//!
//! Add:
//! 1. Malformed entry: `Rejected`
//! 2. Suppressed by the filter: `IgnoredSuppressed`, nothing recorded
//! 3. No live entry: `IgnoredStale` if a remembered removal buries the add
//!    (the removed entry superseded it, or it is the removed payload at or
//!    before the removal), else `Inserted`
//! 4. Same fingerprint as live: `IgnoredDuplicate`
//! 5. Different fingerprint: `IgnoredDuplicate` if the payload is identical
//!    and the sequence is not newer, `Replaced` if the sequence is newer,
//!    else `IgnoredStale`
//!
//! Remove:
//! 1. No live entry: `IgnoredUnknown`
//! 2. Fingerprint differs from live: `IgnoredStale`
//! 3. Sequence at or after live: `Removed`, tombstone recorded
//! 4. Otherwise: `IgnoredStale`
//!
//! The fingerprint match is consulted before the sequence check.

use super::aggregates::OfferCounts;
use super::entities::{Fold, LiveChange, LiveSet};
use super::filter::{AllowAll, OfferFilter};
use super::invariants::invariant_counts_match;
use super::tombstones::TombstoneLog;
use super::value_objects::{RebuildReport, RebuildTally, SkippedEntry};
use crate::config::OfferBookConfig;
use shared_types::{
    AcceptanceOutcome, OfferId, PayloadFingerprint, ReplicatedEntry, SequenceNumber,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The reconciliation engine.
///
/// Not internally synchronized: drive it from one logical stream, or wrap
/// it the way `OfferBookService` does.
pub struct ReconciliationStore {
    config: OfferBookConfig,
    live: LiveSet,
    counts: OfferCounts,
    tombstones: TombstoneLog,
    filter: Arc<dyn OfferFilter>,
}

impl ReconciliationStore {
    /// Empty store that suppresses nothing.
    pub fn new(config: OfferBookConfig) -> Self {
        Self::with_filter(config, Arc::new(AllowAll))
    }

    /// Empty store with a suppression predicate.
    pub fn with_filter(config: OfferBookConfig, filter: Arc<dyn OfferFilter>) -> Self {
        let tombstones = TombstoneLog::new(config.tombstone_capacity);
        Self {
            config,
            live: LiveSet::new(),
            counts: OfferCounts::default(),
            tombstones,
            filter,
        }
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Fold an `Added` notification.
    pub fn on_added(&mut self, entry: ReplicatedEntry) -> AcceptanceOutcome {
        self.fold_added(entry).outcome
    }

    /// Fold a `Removed` notification.
    pub fn on_removed(
        &mut self,
        offer_id: &OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> AcceptanceOutcome {
        self.fold_removed(offer_id, fingerprint, sequence).outcome
    }

    /// Fold an `Added` notification, returning the concrete change too.
    pub fn fold_added(&mut self, entry: ReplicatedEntry) -> Fold {
        if let Err(reason) = entry.validate() {
            warn!(offer_id = %entry.offer_id, reason = %reason, "Rejected malformed entry");
            return Fold::unchanged(AcceptanceOutcome::Rejected(reason));
        }

        if self.filter.is_suppressed(&entry.offer) {
            debug!(offer_id = %entry.offer_id, "Add suppressed by filter");
            return Fold::unchanged(AcceptanceOutcome::IgnoredSuppressed);
        }

        let fold = match self.live.get(&entry.offer_id) {
            None => self.insert_unless_buried(entry),
            Some(live) if live.fingerprint == entry.fingerprint => {
                Fold::unchanged(AcceptanceOutcome::IgnoredDuplicate)
            }
            Some(live) if live.same_payload(&entry) && entry.sequence <= live.sequence => {
                Fold::unchanged(AcceptanceOutcome::IgnoredDuplicate)
            }
            Some(live) if entry.sequence > live.sequence => {
                let old_fingerprint = live.fingerprint;
                let previous = self.live.put(entry.clone());
                match previous {
                    Some(previous) => Fold::changed(
                        AcceptanceOutcome::Replaced(old_fingerprint),
                        LiveChange::Replaced {
                            previous,
                            current: entry,
                        },
                    ),
                    // Unreachable: the match arm saw a live entry.
                    None => Fold::changed(
                        AcceptanceOutcome::Inserted,
                        LiveChange::Inserted(entry),
                    ),
                }
            }
            Some(live) => {
                debug!(
                    offer_id = %entry.offer_id,
                    sequence = %entry.sequence,
                    live_sequence = %live.sequence,
                    "Superseded edit ignored"
                );
                Fold::unchanged(AcceptanceOutcome::IgnoredStale)
            }
        };

        self.after_fold(&fold);
        fold
    }

    /// Fold a `Removed` notification, returning the concrete change too.
    pub fn fold_removed(
        &mut self,
        offer_id: &OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> Fold {
        let fold = match self.live.get(offer_id) {
            None => Fold::unchanged(AcceptanceOutcome::IgnoredUnknown),
            Some(live) if live.fingerprint != fingerprint => {
                debug!(
                    offer_id = %offer_id,
                    fingerprint = %fingerprint.short(),
                    live_fingerprint = %live.fingerprint.short(),
                    "Removal targets a superseded payload"
                );
                Fold::unchanged(AcceptanceOutcome::IgnoredStale)
            }
            Some(live) if sequence >= live.sequence => match self.live.take(offer_id) {
                Some(removed) => {
                    self.tombstones.record(
                        offer_id.clone(),
                        fingerprint,
                        removed.sequence,
                        sequence,
                    );
                    Fold::changed(AcceptanceOutcome::Removed, LiveChange::Removed(removed))
                }
                None => Fold::unchanged(AcceptanceOutcome::IgnoredUnknown),
            },
            Some(live) => {
                warn!(
                    offer_id = %offer_id,
                    sequence = %sequence,
                    live_sequence = %live.sequence,
                    "Removal sequence behind live entry with same fingerprint"
                );
                Fold::unchanged(AcceptanceOutcome::IgnoredStale)
            }
        };

        self.after_fold(&fold);
        fold
    }

    /// Clear everything and replay `entries` as adds, in order.
    pub fn rebuild<I>(&mut self, entries: I) -> RebuildReport
    where
        I: IntoIterator<Item = ReplicatedEntry>,
    {
        let (fresh, report) = self.rebuilt(entries);
        *self = fresh;
        report
    }

    /// Build a replacement store from `entries` without touching `self`.
    ///
    /// The replacement keeps this store's config and filter. Used by the
    /// service so readers keep seeing the old state until the swap.
    pub fn rebuilt<I>(&self, entries: I) -> (Self, RebuildReport)
    where
        I: IntoIterator<Item = ReplicatedEntry>,
    {
        let mut fresh = Self::with_filter(self.config.clone(), Arc::clone(&self.filter));
        let mut skipped = Vec::new();
        let mut tally = RebuildTally::default();

        for (index, entry) in entries.into_iter().enumerate() {
            let offer_id = entry.offer_id.clone();
            match fresh.fold_added(entry).outcome {
                AcceptanceOutcome::Inserted => tally.inserted += 1,
                AcceptanceOutcome::Replaced(_) => tally.replaced += 1,
                AcceptanceOutcome::IgnoredSuppressed => tally.suppressed += 1,
                AcceptanceOutcome::Rejected(reason) => skipped.push(SkippedEntry {
                    index,
                    offer_id,
                    reason,
                }),
                _ => tally.ignored += 1,
            }
        }

        info!(
            live_offers = fresh.live.len(),
            inserted = tally.inserted,
            replaced = tally.replaced,
            ignored = tally.ignored,
            suppressed = tally.suppressed,
            skipped = skipped.len(),
            "Offer book rebuilt"
        );

        let report = RebuildReport {
            snapshot: fresh.live.clone(),
            skipped,
            tally,
        };
        (fresh, report)
    }

    /// Replace the suppression predicate. Applies to future adds only.
    pub fn set_filter(&mut self, filter: Arc<dyn OfferFilter>) {
        self.filter = filter;
    }

    /// Recompute the counts from the live set, replacing the incremental ones.
    pub fn recount(&mut self) -> OfferCounts {
        self.counts = OfferCounts::recount(&self.live);
        self.counts.clone()
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Point-in-time view of the live set. O(1).
    pub fn snapshot(&self) -> LiveSet {
        self.live.clone()
    }

    /// Incrementally maintained counts.
    pub fn counts(&self) -> &OfferCounts {
        &self.counts
    }

    /// Live entry for `offer_id`.
    pub fn get(&self, offer_id: &OfferId) -> Option<&ReplicatedEntry> {
        self.live.get(offer_id)
    }

    /// Number of live offers.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True if no offer is live.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// True if `offer_id` is live.
    pub fn contains(&self, offer_id: &OfferId) -> bool {
        self.live.contains(offer_id)
    }

    /// Remembered removals.
    pub fn tombstones(&self) -> &TombstoneLog {
        &self.tombstones
    }

    /// Active configuration.
    pub fn config(&self) -> &OfferBookConfig {
        &self.config
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn insert_unless_buried(&mut self, entry: ReplicatedEntry) -> Fold {
        if let Some(tombstone) = self.tombstones.get(&entry.offer_id) {
            if tombstone.buries(&entry.fingerprint, entry.sequence) {
                debug!(
                    offer_id = %entry.offer_id,
                    sequence = %entry.sequence,
                    removed_at = %tombstone.sequence,
                    "Add for removed offer ignored"
                );
                return Fold::unchanged(AcceptanceOutcome::IgnoredStale);
            }
        }
        self.tombstones.clear(&entry.offer_id);
        self.live.put(entry.clone());
        Fold::changed(AcceptanceOutcome::Inserted, LiveChange::Inserted(entry))
    }

    fn after_fold(&mut self, fold: &Fold) {
        debug!(outcome = fold.outcome.label(), "Folded notification");

        let Some(change) = &fold.change else {
            return;
        };
        self.counts.apply(change);

        if self.config.verify_counts_on_mutation && !invariant_counts_match(&self.live, &self.counts)
        {
            warn!("Offer counts drifted from live set, repairing from recount");
            self.counts = OfferCounts::recount(&self.live);
        }
    }
}
