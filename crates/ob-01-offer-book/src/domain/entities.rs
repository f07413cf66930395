//! Core entities for the Offer Book
//!
//! The live set and the concrete change a fold applied to it.

use shared_types::{AcceptanceOutcome, OfferDirection, OfferId, ReplicatedEntry};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The authoritative local projection: at most one accepted entry per
/// `OfferId`.
///
/// Cloning is O(1). The store mutates through copy-on-write, so a clone
/// handed out as a snapshot never changes under its holder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveSet {
    entries: Arc<BTreeMap<OfferId, ReplicatedEntry>>,
}

impl LiveSet {
    /// Empty live set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry currently live for `offer_id`.
    pub fn get(&self, offer_id: &OfferId) -> Option<&ReplicatedEntry> {
        self.entries.get(offer_id)
    }

    /// True if `offer_id` is live.
    pub fn contains(&self, offer_id: &OfferId) -> bool {
        self.entries.contains_key(offer_id)
    }

    /// Number of live offers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no offer is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Live entries ordered by `OfferId`.
    pub fn iter(&self) -> impl Iterator<Item = &ReplicatedEntry> {
        self.entries.values()
    }

    /// Live offer ids in order.
    pub fn offer_ids(&self) -> impl Iterator<Item = &OfferId> {
        self.entries.keys()
    }

    /// Live entries whose market currency is `code`.
    pub fn for_currency<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a ReplicatedEntry> {
        self.iter().filter(move |e| e.offer.market_currency() == code)
    }

    /// Live entries with the given direction.
    pub fn with_direction(
        &self,
        direction: OfferDirection,
    ) -> impl Iterator<Item = &ReplicatedEntry> {
        self.iter().filter(move |e| e.offer.direction == direction)
    }

    /// True if both sets share the same underlying map allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }

    /// Insert or replace, returning the previous entry.
    pub(crate) fn put(&mut self, entry: ReplicatedEntry) -> Option<ReplicatedEntry> {
        Arc::make_mut(&mut self.entries).insert(entry.offer_id.clone(), entry)
    }

    pub(crate) fn take(&mut self, offer_id: &OfferId) -> Option<ReplicatedEntry> {
        if !self.entries.contains_key(offer_id) {
            return None;
        }
        Arc::make_mut(&mut self.entries).remove(offer_id)
    }
}

impl FromIterator<ReplicatedEntry> for LiveSet {
    /// Later entries for the same id win. Used by tests and recounts, never
    /// by the fold.
    fn from_iter<I: IntoIterator<Item = ReplicatedEntry>>(iter: I) -> Self {
        let map = iter
            .into_iter()
            .map(|e| (e.offer_id.clone(), e))
            .collect::<BTreeMap<_, _>>();
        Self {
            entries: Arc::new(map),
        }
    }
}

/// The concrete change one accepted fold applied to the live set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveChange {
    /// A new offer.
    Inserted(ReplicatedEntry),
    /// An edit: the old entry and its replacement.
    Replaced {
        previous: ReplicatedEntry,
        current: ReplicatedEntry,
    },
    /// A removed offer.
    Removed(ReplicatedEntry),
}

/// Result of folding one notification: the outcome plus the change, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub outcome: AcceptanceOutcome,
    pub change: Option<LiveChange>,
}

impl Fold {
    pub(crate) fn unchanged(outcome: AcceptanceOutcome) -> Self {
        Self {
            outcome,
            change: None,
        }
    }

    pub(crate) fn changed(outcome: AcceptanceOutcome, change: LiveChange) -> Self {
        Self {
            outcome,
            change: Some(change),
        }
    }
}
