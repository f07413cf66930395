//! # Offer Book Events
//!
//! Defines the change notifications that flow through the shared bus.
//! Each event is emitted synchronously after the fold that produced it, so
//! subscribers see them in fold order.

use serde::{Deserialize, Serialize};
use shared_types::{
    AcceptanceOutcome, OfferId, PayloadFingerprint, ReplicatedEntry, SequenceNumber,
};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferBookEvent {
    // =========================================================================
    // LIVE SET CHANGES
    // =========================================================================
    /// A new offer entered the live set.
    OfferAdded {
        /// The accepted entry.
        entry: ReplicatedEntry,
    },

    /// An edit superseded a live offer.
    OfferReplaced {
        /// The entry that left the live set.
        previous: ReplicatedEntry,
        /// The entry that replaced it.
        entry: ReplicatedEntry,
    },

    /// An offer left the live set.
    OfferRemoved {
        /// The entry that was removed.
        entry: ReplicatedEntry,
        /// Sequence number carried by the removal.
        sequence: SequenceNumber,
    },

    // =========================================================================
    // NON-CHANGES
    // =========================================================================
    /// A mutation was folded without changing the live set.
    /// Only emitted when ignored-event publishing is enabled.
    MutationIgnored {
        /// Offer the mutation referred to.
        offer_id: OfferId,
        /// Fingerprint carried by the mutation.
        fingerprint: PayloadFingerprint,
        /// Sequence carried by the mutation.
        sequence: SequenceNumber,
        /// Why nothing changed.
        outcome: AcceptanceOutcome,
    },

    // =========================================================================
    // BULK
    // =========================================================================
    /// The live set was rebuilt from a full pull.
    BookRebuilt {
        /// Offers live after the rebuild.
        live_offers: usize,
        /// Entries skipped as malformed.
        skipped: usize,
    },
}

impl OfferBookEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::OfferAdded { .. } | Self::OfferReplaced { .. } | Self::OfferRemoved { .. } => {
                EventTopic::OfferLifecycle
            }
            Self::MutationIgnored { .. } => EventTopic::IgnoredMutation,
            Self::BookRebuilt { .. } => EventTopic::Rebuild,
        }
    }

    /// The acceptance outcome this event reports, if it reports one.
    #[must_use]
    pub fn outcome(&self) -> Option<AcceptanceOutcome> {
        match self {
            Self::OfferAdded { .. } => Some(AcceptanceOutcome::Inserted),
            Self::OfferReplaced { previous, .. } => {
                Some(AcceptanceOutcome::Replaced(previous.fingerprint))
            }
            Self::OfferRemoved { .. } => Some(AcceptanceOutcome::Removed),
            Self::MutationIgnored { outcome, .. } => Some(outcome.clone()),
            Self::BookRebuilt { .. } => None,
        }
    }

    /// Offer the event refers to. `None` for bulk events.
    #[must_use]
    pub fn offer_id(&self) -> Option<&OfferId> {
        match self {
            Self::OfferAdded { entry }
            | Self::OfferReplaced { entry, .. }
            | Self::OfferRemoved { entry, .. } => Some(&entry.offer_id),
            Self::MutationIgnored { offer_id, .. } => Some(offer_id),
            Self::BookRebuilt { .. } => None,
        }
    }

    /// Market currencies touched by the event. A replace that moved an offer
    /// between markets touches both.
    #[must_use]
    pub fn currencies(&self) -> Vec<&str> {
        match self {
            Self::OfferAdded { entry } | Self::OfferRemoved { entry, .. } => {
                vec![entry.offer.market_currency()]
            }
            Self::OfferReplaced { previous, entry } => {
                let old = previous.offer.market_currency();
                let new = entry.offer.market_currency();
                if old == new {
                    vec![new]
                } else {
                    vec![old, new]
                }
            }
            Self::MutationIgnored { .. } | Self::BookRebuilt { .. } => Vec::new(),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Added, replaced and removed offers.
    OfferLifecycle,
    /// Folds that left the live set unchanged.
    IgnoredMutation,
    /// Full rebuilds.
    Rebuild,
    /// All events (no filtering).
    All,
}

impl EventTopic {
    /// Stable snake_case name, used as a metric label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::OfferLifecycle => "offer_lifecycle",
            Self::IgnoredMutation => "ignored_mutation",
            Self::Rebuild => "rebuild",
            Self::All => "all",
        }
    }
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Market currencies to include. Empty means all currencies.
    /// Events that carry no currency always pass this check.
    pub currencies: Vec<String>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            currencies: Vec::new(),
        }
    }

    /// Create a filter for lifecycle events in specific markets.
    #[must_use]
    pub fn for_currencies(currencies: Vec<String>) -> Self {
        Self {
            topics: vec![EventTopic::OfferLifecycle],
            currencies,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &OfferBookEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let touched = event.currencies();
        let currency_match = self.currencies.is_empty()
            || touched.is_empty()
            || touched
                .iter()
                .any(|c| self.currencies.iter().any(|wanted| wanted == c));

        topic_match && currency_match
    }
}
