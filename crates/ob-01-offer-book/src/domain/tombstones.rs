//! # Bounded Tombstone Log
//!
//! Remembers recent removals so a late or redelivered add cannot resurrect
//! an offer that was already removed.
//!
//! ## Design
//!
//! - One tombstone per `OfferId`: the removed entry's fingerprint and
//!   sequence, plus the sequence carried by the removal
//! - An add is buried if the removed entry had superseded it, or if it
//!   re-announces the removed payload at or before the removal
//! - FIFO eviction once `capacity` offers are remembered
//! - Evicted ids fall back to plain insert semantics

use shared_types::{OfferId, PayloadFingerprint, SequenceNumber};
use std::collections::{HashMap, VecDeque};

/// A remembered removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tombstone {
    /// Fingerprint of the entry that was removed.
    pub fingerprint: PayloadFingerprint,
    /// Sequence of the entry that was removed.
    pub removed_sequence: SequenceNumber,
    /// Sequence carried by the removal.
    pub sequence: SequenceNumber,
    /// Insertion stamp, used to skip stale queue slots on eviction.
    stamp: u64,
}

impl Tombstone {
    /// True if an add of `fingerprint` at `sequence` must stay removed.
    ///
    /// Any payload at or below the removed entry's sequence was already
    /// superseded by it. The removed payload itself stays buried up to the
    /// removal's sequence. Other payloads newer than the removed entry are
    /// edits the removal never targeted.
    pub fn buries(&self, fingerprint: &PayloadFingerprint, sequence: SequenceNumber) -> bool {
        sequence <= self.removed_sequence
            || (*fingerprint == self.fingerprint && sequence <= self.sequence)
    }
}

/// Bounded FIFO log of removals keyed by offer.
#[derive(Debug, Clone)]
pub struct TombstoneLog {
    by_offer: HashMap<OfferId, Tombstone>,
    /// Insertion order; slots whose stamp no longer matches are stale.
    order: VecDeque<(OfferId, u64)>,
    capacity: usize,
    next_stamp: u64,
}

impl TombstoneLog {
    /// Log remembering at most `capacity` offers. Zero disables the log.
    pub fn new(capacity: usize) -> Self {
        Self {
            by_offer: HashMap::new(),
            order: VecDeque::new(),
            capacity,
            next_stamp: 0,
        }
    }

    /// Record an accepted removal of the entry `(fingerprint, removed_sequence)`
    /// by a removal carrying `sequence`, evicting the oldest tombstone when full.
    pub fn record(
        &mut self,
        offer_id: OfferId,
        fingerprint: PayloadFingerprint,
        removed_sequence: SequenceNumber,
        sequence: SequenceNumber,
    ) {
        if self.capacity == 0 {
            return;
        }

        let stamp = self.next_stamp;
        self.next_stamp += 1;
        self.by_offer.insert(
            offer_id.clone(),
            Tombstone {
                fingerprint,
                removed_sequence,
                sequence,
                stamp,
            },
        );
        self.order.push_back((offer_id, stamp));

        while self.by_offer.len() > self.capacity {
            self.evict_oldest();
        }
        if self.order.len() > self.capacity.saturating_mul(2) {
            self.compact();
        }
    }

    /// Tombstone for `offer_id`, if remembered.
    pub fn get(&self, offer_id: &OfferId) -> Option<&Tombstone> {
        self.by_offer.get(offer_id)
    }

    /// Forget `offer_id` (the offer is live again).
    pub fn clear(&mut self, offer_id: &OfferId) {
        self.by_offer.remove(offer_id);
    }

    /// Number of remembered offers.
    pub fn len(&self) -> usize {
        self.by_offer.len()
    }

    /// True if nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.by_offer.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_oldest(&mut self) {
        while let Some((offer_id, stamp)) = self.order.pop_front() {
            let current = self.by_offer.get(&offer_id).map(|t| t.stamp);
            if current == Some(stamp) {
                self.by_offer.remove(&offer_id);
                return;
            }
        }
    }

    fn compact(&mut self) {
        let by_offer = &self.by_offer;
        self.order
            .retain(|(offer_id, stamp)| by_offer.get(offer_id).map(|t| t.stamp) == Some(*stamp));
    }
}
