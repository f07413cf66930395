//! # Fixtures
//!
//! Offer builders and synthetic delivery histories shared by the
//! integration tests and the benchmarks.

use rand::seq::SliceRandom;
use rand::Rng;
use shared_types::{
    OfferDirection, OfferId, OfferPayload, PayloadFingerprint, ReplicatedEntry, SequenceNumber,
    StorageNotification,
};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Markets used by generated histories.
pub const MARKETS: [&str; 4] = ["USD", "EUR", "BRL", "JPY"];

/// Offer payload with the given identity and market; other fields fixed.
pub fn offer(id: &str, direction: OfferDirection, currency: &str, price: u64) -> OfferPayload {
    OfferPayload {
        offer_id: OfferId::new(id),
        direction,
        base_currency: "BTC".to_string(),
        counter_currency: currency.to_string(),
        price,
        amount: 1_000_000,
        min_amount: 100_000,
        payment_method_id: "SEPA".to_string(),
        maker_node_address: format!("{}.onion:9999", id),
        protocol_version: 1,
        created_at_ms: 1_700_000_000_000,
        extra_data: BTreeMap::new(),
    }
}

/// Well-formed entry for `offer`.
pub fn entry_of(offer: OfferPayload, seq: u64) -> ReplicatedEntry {
    ReplicatedEntry::from_payload(offer, SequenceNumber(seq))
        .unwrap_or_else(|e| panic!("fixture payload must encode: {}", e))
}

/// BUY BTC/USD entry whose payload varies with `price`.
pub fn entry(id: &str, seq: u64, price: u64) -> ReplicatedEntry {
    entry_of(offer(id, OfferDirection::Buy, "USD", price), seq)
}

/// Every version of one offer: version `v` carries sequence `v` and a
/// distinct payload. Markets and direction change between versions.
pub fn versions(id: &str, count: u64) -> Vec<ReplicatedEntry> {
    (1..=count)
        .map(|v| {
            let direction = if v % 2 == 0 {
                OfferDirection::Sell
            } else {
                OfferDirection::Buy
            };
            let market = MARKETS[(v as usize) % MARKETS.len()];
            entry_of(offer(id, direction, market, 40_000 + v), v)
        })
        .collect()
}

/// Shape of a generated history.
#[derive(Debug, Clone, Copy)]
pub struct HistoryShape {
    pub offers: usize,
    pub versions_per_offer: u64,
    /// Fraction of notifications delivered twice.
    pub duplicate_rate: f64,
    /// Fraction of offers whose final version is removed.
    pub removal_rate: f64,
}

impl Default for HistoryShape {
    fn default() -> Self {
        Self {
            offers: 100,
            versions_per_offer: 3,
            duplicate_rate: 0.2,
            removal_rate: 0.3,
        }
    }
}

/// A shuffled, duplicate-prone delivery history.
///
/// Removals are appended after every add of their offer, mirroring a
/// collaborator that only removes what it has seen.
pub fn shuffled_history<R: Rng>(rng: &mut R, shape: HistoryShape) -> Vec<StorageNotification> {
    let mut adds = Vec::new();
    let mut removals = Vec::new();

    for n in 0..shape.offers {
        let id = format!("offer-{:05}", n);
        let all = versions(&id, shape.versions_per_offer);
        if let Some(last) = all.last() {
            if rng.gen_bool(shape.removal_rate) {
                removals.push(StorageNotification::removed(last, last.sequence));
            }
        }
        for version in all {
            let notification = StorageNotification::added(version);
            if rng.gen_bool(shape.duplicate_rate) {
                adds.push(notification.clone());
            }
            adds.push(notification);
        }
    }

    adds.shuffle(rng);
    removals.shuffle(rng);
    adds.extend(removals);
    adds
}

/// A delivery history with removals interleaved among the adds.
///
/// A removed offer gets one removal (possibly redelivered) that targets any
/// of its versions, stamped at or up to two sequences after it. Each
/// removal is delivered only after its target was delivered once, since
/// the storage layer only removes what it has seen.
pub fn interleaved_history<R: Rng>(rng: &mut R, shape: HistoryShape) -> Vec<StorageNotification> {
    let mut pool = Vec::new();

    for n in 0..shape.offers {
        let id = format!("offer-{:05}", n);
        let all = versions(&id, shape.versions_per_offer);
        if !all.is_empty() && rng.gen_bool(shape.removal_rate) {
            let target = &all[rng.gen_range(0..all.len())];
            let stamp = SequenceNumber(target.sequence.0 + rng.gen_range(0..=2));
            let removal = StorageNotification::removed(target, stamp);
            if rng.gen_bool(shape.duplicate_rate) {
                pool.push(removal.clone());
            }
            pool.push(removal);
        }
        for version in all {
            let notification = StorageNotification::added(version);
            if rng.gen_bool(shape.duplicate_rate) {
                pool.push(notification.clone());
            }
            pool.push(notification);
        }
    }

    pool.shuffle(rng);
    after_targets(pool)
}

/// Hold each removal back until the add it targets has been delivered.
pub fn after_targets(shuffled: Vec<StorageNotification>) -> Vec<StorageNotification> {
    let mut delivered: HashSet<(OfferId, PayloadFingerprint)> = HashSet::new();
    let mut held: HashMap<(OfferId, PayloadFingerprint), Vec<StorageNotification>> =
        HashMap::new();
    let mut out = Vec::with_capacity(shuffled.len());

    for notification in shuffled {
        let (key, is_add) = match &notification {
            StorageNotification::Added {
                offer, fingerprint, ..
            } => ((offer.offer_id.clone(), *fingerprint), true),
            StorageNotification::Removed {
                offer_id,
                fingerprint,
                ..
            } => ((offer_id.clone(), *fingerprint), false),
        };

        if is_add {
            out.push(notification);
            if let Some(released) = held.remove(&key) {
                out.extend(released);
            }
            delivered.insert(key);
        } else if delivered.contains(&key) {
            out.push(notification);
        } else {
            held.entry(key).or_default().push(notification);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_versions_are_distinct_and_ordered() {
        let all = versions("o1", 4);
        assert_eq!(all.len(), 4);
        for pair in all.windows(2) {
            assert_ne!(pair[0].fingerprint, pair[1].fingerprint);
            assert!(pair[0].sequence < pair[1].sequence);
        }
    }

    #[test]
    fn test_history_has_every_add() {
        let mut rng = StdRng::seed_from_u64(7);
        let shape = HistoryShape {
            offers: 10,
            versions_per_offer: 2,
            duplicate_rate: 0.0,
            removal_rate: 0.0,
        };
        let history = shuffled_history(&mut rng, shape);
        assert_eq!(history.len(), 20);
    }

    #[test]
    fn test_interleaved_removals_follow_their_target() {
        let mut rng = StdRng::seed_from_u64(11);
        let shape = HistoryShape {
            offers: 40,
            removal_rate: 1.0,
            ..HistoryShape::default()
        };
        let history = interleaved_history(&mut rng, shape);

        let mut delivered = HashSet::new();
        let mut removals = 0;
        for notification in &history {
            match notification {
                StorageNotification::Added {
                    offer, fingerprint, ..
                } => {
                    delivered.insert((offer.offer_id.clone(), *fingerprint));
                }
                StorageNotification::Removed {
                    offer_id,
                    fingerprint,
                    ..
                } => {
                    removals += 1;
                    assert!(delivered.contains(&(offer_id.clone(), *fingerprint)));
                }
            }
        }
        assert!(removals >= 40);
    }
}
