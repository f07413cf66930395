//! Per-currency offer counts
//!
//! Secondary aggregates consumed by presentation layers. Maintained
//! incrementally by the store and always equal to a recount over the live
//! set.

use super::entities::{LiveChange, LiveSet};
use serde::{Deserialize, Serialize};
use shared_types::{OfferDirection, OfferPayload};
use std::collections::BTreeMap;

/// Buy and sell counts for one market currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionCounts {
    pub buy: usize,
    pub sell: usize,
}

impl DirectionCounts {
    /// Buy plus sell.
    pub fn total(&self) -> usize {
        self.buy + self.sell
    }

    fn slot(&mut self, direction: OfferDirection) -> &mut usize {
        match direction {
            OfferDirection::Buy => &mut self.buy,
            OfferDirection::Sell => &mut self.sell,
        }
    }
}

/// Offer counts keyed by market currency, split by direction.
///
/// Rows that drop to zero are pruned, so two counts describing the same
/// live set compare equal regardless of history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferCounts {
    by_currency: BTreeMap<String, DirectionCounts>,
}

impl OfferCounts {
    /// Full recount over a live set.
    pub fn recount(live: &LiveSet) -> Self {
        let mut counts = Self::default();
        for entry in live.iter() {
            counts.add(&entry.offer);
        }
        counts
    }

    /// Apply the change of one accepted fold.
    pub fn apply(&mut self, change: &LiveChange) {
        match change {
            LiveChange::Inserted(entry) => self.add(&entry.offer),
            LiveChange::Replaced { previous, current } => {
                self.subtract(&previous.offer);
                self.add(&current.offer);
            }
            LiveChange::Removed(entry) => self.subtract(&entry.offer),
        }
    }

    /// Buy offers in `currency`.
    pub fn buy(&self, currency: &str) -> usize {
        self.get(currency).buy
    }

    /// Sell offers in `currency`.
    pub fn sell(&self, currency: &str) -> usize {
        self.get(currency).sell
    }

    /// All offers in `currency`.
    pub fn total(&self, currency: &str) -> usize {
        self.get(currency).total()
    }

    /// Counts for `currency`, zero if absent.
    pub fn get(&self, currency: &str) -> DirectionCounts {
        self.by_currency.get(currency).copied().unwrap_or_default()
    }

    /// Currencies with at least one live offer.
    pub fn currencies(&self) -> impl Iterator<Item = &str> {
        self.by_currency.keys().map(String::as_str)
    }

    /// All rows.
    pub fn iter(&self) -> impl Iterator<Item = (&str, DirectionCounts)> {
        self.by_currency.iter().map(|(c, d)| (c.as_str(), *d))
    }

    /// Offers across all currencies.
    pub fn total_offers(&self) -> usize {
        self.by_currency.values().map(DirectionCounts::total).sum()
    }

    fn add(&mut self, offer: &OfferPayload) {
        let row = self
            .by_currency
            .entry(offer.market_currency().to_string())
            .or_default();
        *row.slot(offer.direction) += 1;
    }

    fn subtract(&mut self, offer: &OfferPayload) {
        let currency = offer.market_currency();
        let Some(row) = self.by_currency.get_mut(currency) else {
            return;
        };
        let slot = row.slot(offer.direction);
        *slot = slot.saturating_sub(1);
        if row.total() == 0 {
            self.by_currency.remove(currency);
        }
    }
}
