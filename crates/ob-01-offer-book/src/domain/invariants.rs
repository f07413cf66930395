//! Domain invariants for the Offer Book
//!
//! Checked by tests and, when enabled, after every accepted mutation.

use super::aggregates::OfferCounts;
use super::entities::LiveSet;

/// At most one entry per offer, stored under its own id.
///
/// The map key makes a second entry impossible; this checks that every
/// entry sits under the id it carries.
pub fn invariant_one_entry_per_offer(live: &LiveSet) -> bool {
    live.offer_ids()
        .zip(live.iter())
        .all(|(key, entry)| *key == entry.offer_id && entry.offer.offer_id == entry.offer_id)
}

/// Every live entry passes construction-time validation.
pub fn invariant_entries_valid(live: &LiveSet) -> bool {
    live.iter().all(|e| e.validate().is_ok())
}

/// Incremental counts equal a full recount.
pub fn invariant_counts_match(live: &LiveSet, counts: &OfferCounts) -> bool {
    OfferCounts::recount(live) == *counts
}
