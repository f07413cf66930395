//! # Convergence Properties
//!
//! Two replicas that eventually receive the same notifications end with the
//! same live set and the same counts, whatever the delivery order and
//! however often a notification is redelivered.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        after_targets, interleaved_history, shuffled_history, versions, HistoryShape,
    };
    use ob_01_offer_book::{
        BusPublisher, LiveSet, OfferBookApi, OfferBookConfig, OfferBookService, OfferCounts,
        ReconciliationStore,
    };
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::SeedableRng;
    use shared_bus::{EventFilter, InMemoryEventBus, OfferBookEvent};
    use shared_types::{
        AcceptanceOutcome, OfferId, ReplicatedEntry, SequenceNumber, StorageNotification,
    };
    use std::collections::BTreeMap;
    use std::sync::Arc;

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn replay(notifications: &[StorageNotification]) -> ReconciliationStore {
        let mut store = ReconciliationStore::new(OfferBookConfig::for_testing());
        for notification in notifications {
            match notification {
                StorageNotification::Added { .. } => {
                    if let Some(entry) = notification.clone().into_entry() {
                        store.on_added(entry);
                    }
                }
                StorageNotification::Removed {
                    offer_id,
                    fingerprint,
                    sequence,
                } => {
                    store.on_removed(offer_id, *fingerprint, *sequence);
                }
            }
        }
        store
    }

    /// Reorder the adds of `history`, keeping removals last.
    fn reshuffle(history: &[StorageNotification], seed: u64) -> Vec<StorageNotification> {
        let (mut adds, removals): (Vec<_>, Vec<_>) = history
            .iter()
            .cloned()
            .partition(|n| matches!(n, StorageNotification::Added { .. }));
        adds.shuffle(&mut StdRng::seed_from_u64(seed));
        adds.extend(removals);
        adds
    }

    /// What a correct replica must hold: the highest version of every offer,
    /// unless a removal targets exactly that version.
    fn expected(history: &[StorageNotification]) -> LiveSet {
        let mut latest: BTreeMap<OfferId, ReplicatedEntry> = BTreeMap::new();
        for notification in history {
            if let StorageNotification::Added { .. } = notification {
                let entry = notification.clone().into_entry();
                if let Some(entry) = entry {
                    let newer = latest
                        .get(&entry.offer_id)
                        .map_or(true, |have| entry.sequence > have.sequence);
                    if newer {
                        latest.insert(entry.offer_id.clone(), entry);
                    }
                }
            }
        }
        for notification in history {
            if let StorageNotification::Removed {
                offer_id,
                fingerprint,
                ..
            } = notification
            {
                if latest.get(offer_id).map(|e| e.fingerprint) == Some(*fingerprint) {
                    latest.remove(offer_id);
                }
            }
        }
        latest.into_values().collect()
    }

    /// Deliveries of every version of one offer, each at least once, in a
    /// shuffled order.
    fn competing_edits() -> impl Strategy<Value = (Vec<ReplicatedEntry>, Vec<usize>)> {
        (2u64..8)
            .prop_flat_map(|n| {
                let extra = prop::collection::vec(0..n as usize, 0..16);
                (Just(versions("o1", n)), extra)
            })
            .prop_flat_map(|(all, extra)| {
                let order: Vec<usize> = (0..all.len()).chain(extra).collect();
                (Just(all), Just(order).prop_shuffle())
            })
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_competing_edits_converge_to_highest_sequence(
            (all, order) in competing_edits()
        ) {
            let mut store = ReconciliationStore::new(OfferBookConfig::for_testing());
            for index in order {
                store.on_added(all[index].clone());
            }

            let highest = all.last().cloned();
            prop_assert_eq!(store.len(), 1);
            prop_assert_eq!(store.get(&OfferId::new("o1")).cloned(), highest);
            prop_assert_eq!(store.counts(), &OfferCounts::recount(&store.snapshot()));
        }

        #[test]
        fn prop_replicas_converge(seed in any::<u64>(), reorder in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let shape = HistoryShape { offers: 30, ..HistoryShape::default() };
            let history = shuffled_history(&mut rng, shape);

            let left = replay(&history);
            let right = replay(&reshuffle(&history, reorder));

            prop_assert_eq!(left.snapshot(), right.snapshot());
            prop_assert_eq!(left.counts(), right.counts());
            prop_assert_eq!(left.snapshot(), expected(&history));
        }

        #[test]
        fn prop_interleaved_removals_converge(seed in any::<u64>(), reorder in any::<u64>()) {
            let mut rng = StdRng::seed_from_u64(seed);
            let shape = HistoryShape {
                offers: 20,
                versions_per_offer: 4,
                ..HistoryShape::default()
            };
            let history = interleaved_history(&mut rng, shape);

            let mut other = history.clone();
            other.shuffle(&mut StdRng::seed_from_u64(reorder));
            let other = after_targets(other);

            let left = replay(&history);
            let right = replay(&other);

            prop_assert_eq!(left.snapshot(), right.snapshot());
            prop_assert_eq!(left.counts(), right.counts());
            prop_assert_eq!(left.snapshot(), expected(&history));
        }

        #[test]
        fn prop_removed_offer_is_not_resurrected(
            n in 1u64..6,
            seed in any::<u64>(),
        ) {
            let all = versions("o1", n);
            let mut store = ReconciliationStore::new(OfferBookConfig::for_testing());
            for version in &all {
                store.on_added(version.clone());
            }
            let last = all.last().cloned().unwrap();
            prop_assert_eq!(
                store.on_removed(&last.offer_id, last.fingerprint, last.sequence),
                AcceptanceOutcome::Removed
            );

            let mut redelivery = all.clone();
            redelivery.shuffle(&mut StdRng::seed_from_u64(seed));
            for version in redelivery {
                prop_assert_eq!(store.on_added(version), AcceptanceOutcome::IgnoredStale);
            }
            prop_assert!(store.is_empty());
            prop_assert_eq!(store.counts().total_offers(), 0);
        }
    }

    #[test]
    fn test_removal_racing_an_edit_converges() {
        let all = versions("o1", 3);
        let (v1, v2) = (all[0].clone(), all[1].clone());
        let add = |e: &ReplicatedEntry| StorageNotification::added(e.clone());
        let remove_v1 = StorageNotification::removed(&v1, SequenceNumber(5));

        let removal_first = replay(&[add(&v1), remove_v1.clone(), add(&v2)]);
        let edit_first = replay(&[add(&v1), add(&v2), remove_v1]);

        assert_eq!(removal_first.snapshot(), edit_first.snapshot());
        assert_eq!(removal_first.counts(), edit_first.counts());
        assert_eq!(removal_first.get(&OfferId::new("o1")), Some(&v2));
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    #[tokio::test]
    async fn test_event_replay_reproduces_snapshot() {
        let mut config = OfferBookConfig::for_testing();
        config.event_channel_capacity = 4096;
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
        let service = OfferBookService::new(
            config,
            Arc::new(BusPublisher::new(Arc::clone(&bus))),
        );
        let mut subscription = bus.subscribe(EventFilter::all());

        let history = shuffled_history(&mut StdRng::seed_from_u64(42), HistoryShape::default());
        for notification in history {
            service.apply(notification);
        }

        let mut mirror: BTreeMap<OfferId, ReplicatedEntry> = BTreeMap::new();
        while let Some(event) = subscription.try_recv().unwrap() {
            match event {
                OfferBookEvent::OfferAdded { entry }
                | OfferBookEvent::OfferReplaced { entry, .. } => {
                    mirror.insert(entry.offer_id.clone(), entry);
                }
                OfferBookEvent::OfferRemoved { entry, .. } => {
                    mirror.remove(&entry.offer_id);
                }
                OfferBookEvent::MutationIgnored { .. } | OfferBookEvent::BookRebuilt { .. } => {}
            }
        }

        assert_eq!(subscription.lagged(), 0);
        assert_eq!(mirror.into_values().collect::<LiveSet>(), service.snapshot());
    }
}
