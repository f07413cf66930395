//! # Integration Test Flows
//!
//! Tests that the storage-side input, the reconciliation service and the
//! shared bus work together.
//!
//! ## Flows Tested
//!
//! 1. **Feed → Service → Bus**: notifications folded on one consumer task
//!    reach subscribers in fold order
//! 2. **File resync → Feed**: a snapshot dump seeds the book, then live
//!    notifications continue from it
//! 3. **Suppression**: filtered offers never reach the live set, counts or bus
//! 4. **Node runtime**: the concrete offer lifecycle through JSON lines

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::timeout;

    use crate::fixtures::{entry, entry_of, offer};
    use node_runtime::adapters::{JsonFileSnapshotSource, StopReason};
    use node_runtime::{NodeConfig, NodeRuntime};
    use ob_01_offer_book::{
        notification_feed, BusPublisher, OfferBookApi, OfferBookConfig, OfferBookService,
        OfferFilter,
    };
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, OfferBookEvent};
    use shared_types::{
        AcceptanceOutcome, OfferDirection, OfferId, OfferPayload, SequenceNumber,
        StorageNotification,
    };
    use tempfile::TempDir;
    use tokio::io::BufReader;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    fn wired(config: OfferBookConfig) -> (Arc<InMemoryEventBus>, Arc<OfferBookService>) {
        let bus = Arc::new(InMemoryEventBus::with_capacity(config.event_channel_capacity));
        let service = Arc::new(OfferBookService::new(
            config,
            Arc::new(BusPublisher::new(Arc::clone(&bus))),
        ));
        (bus, service)
    }

    fn jsonl(notifications: &[StorageNotification]) -> String {
        notifications
            .iter()
            .map(|n| serde_json::to_string(n).unwrap() + "\n")
            .collect()
    }

    // =============================================================================
    // FEED → SERVICE → BUS
    // =============================================================================

    #[tokio::test]
    async fn test_feed_events_reach_subscribers_in_fold_order() {
        let (bus, service) = wired(OfferBookConfig::default());
        let mut subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::OfferLifecycle]));

        let (handle, feed) = notification_feed(8);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let consumer = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { feed.run(service.as_ref(), shutdown_rx).await })
        };

        let v1 = entry("o1", 1, 100);
        let v2 = entry("o1", 2, 110);
        let producers: Vec<_> = [v1.clone(), v2.clone()]
            .into_iter()
            .map(|e| {
                let handle = handle.clone();
                tokio::spawn(async move { handle.send(StorageNotification::added(e)).await })
            })
            .collect();
        for producer in producers {
            producer.await.unwrap().unwrap();
        }
        handle
            .send(StorageNotification::removed(&v2, SequenceNumber(2)))
            .await
            .unwrap();
        drop(handle);

        let stats = timeout(Duration::from_secs(1), consumer)
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(stats.processed, 3);

        // Whichever add landed first, the book ends empty and the last
        // lifecycle event is the removal of v2.
        let mut events = Vec::new();
        while let Ok(Some(event)) = subscription.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events.last(),
            Some(&OfferBookEvent::OfferRemoved {
                entry: v2,
                sequence: SequenceNumber(2),
            })
        );
        assert!(service.is_empty());
        assert_eq!(service.tombstone_count(), 1);
    }

    #[tokio::test]
    async fn test_currency_subscription_sees_only_its_market() {
        let (bus, service) = wired(OfferBookConfig::default());
        let mut eur = bus.subscribe(EventFilter::for_currencies(vec!["EUR".to_string()]));

        service.on_added(entry_of(offer("usd", OfferDirection::Buy, "USD", 1), 1));
        service.on_added(entry_of(offer("eur", OfferDirection::Sell, "EUR", 1), 1));

        let event = timeout(Duration::from_secs(1), eur.recv())
            .await
            .expect("timeout")
            .unwrap();
        assert_eq!(event.offer_id(), Some(&OfferId::new("eur")));
        assert_eq!(eur.try_recv().unwrap(), None);
    }

    // =============================================================================
    // RESYNC
    // =============================================================================

    #[tokio::test]
    async fn test_file_resync_then_live_notifications() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("snapshot.json");
        let o1 = entry("o1", 3, 100);
        let o2 = entry("o2", 1, 200);
        let mut broken = entry("o3", 1, 300);
        broken.offer_id = OfferId::new("other");
        std::fs::write(
            &path,
            serde_json::to_vec(&vec![o1.clone(), o2.clone(), broken]).unwrap(),
        )
        .unwrap();

        let (bus, service) = wired(OfferBookConfig::default());
        let mut rebuilds = bus.subscribe(EventFilter::topics(vec![EventTopic::Rebuild]));

        let report = service
            .resync(&JsonFileSnapshotSource::new(&path))
            .await
            .unwrap();
        assert_eq!(report.snapshot.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].index, 2);
        assert_eq!(
            rebuilds.try_recv().unwrap(),
            Some(OfferBookEvent::BookRebuilt {
                live_offers: 2,
                skipped: 1,
            })
        );

        // A late redelivery of an older version changes nothing.
        assert_eq!(
            service.apply(StorageNotification::added(entry("o1", 2, 90))),
            AcceptanceOutcome::IgnoredStale
        );
        assert_eq!(
            service.apply(StorageNotification::removed(&o2, SequenceNumber(1))),
            AcceptanceOutcome::Removed
        );
        assert_eq!(service.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_resync_keeps_book() {
        let dir = TempDir::new().unwrap();
        let (_bus, service) = wired(OfferBookConfig::default());
        service.on_added(entry("o1", 1, 100));

        let source = JsonFileSnapshotSource::new(dir.path().join("absent.json"));
        assert!(service.resync(&source).await.is_err());
        assert_eq!(service.len(), 1);
    }

    // =============================================================================
    // SUPPRESSION
    // =============================================================================

    #[test]
    fn test_suppressed_offers_stay_invisible() {
        let (bus, service) = wired(OfferBookConfig::default());
        let mut subscription = bus.subscribe(EventFilter::all());
        let banned_maker: Arc<dyn OfferFilter> =
            Arc::new(|offer: &OfferPayload| offer.maker_node_address.starts_with("banned"));
        service.set_filter(banned_maker);

        let banned = entry("banned", 1, 100);
        let allowed = entry("allowed", 1, 100);
        assert_eq!(service.on_added(banned.clone()), AcceptanceOutcome::IgnoredSuppressed);
        assert_eq!(service.on_added(allowed), AcceptanceOutcome::Inserted);
        assert_eq!(
            service.on_removed(&banned.offer_id, banned.fingerprint, SequenceNumber(1)),
            AcceptanceOutcome::IgnoredUnknown
        );

        assert_eq!(service.counts().total("USD"), 1);
        let first = subscription.try_recv().unwrap().unwrap();
        assert_eq!(first.offer_id(), Some(&OfferId::new("allowed")));
        assert_eq!(subscription.try_recv().unwrap(), None);
    }

    // =============================================================================
    // CONCURRENCY
    // =============================================================================

    #[test]
    fn test_rebuild_under_concurrent_edits() {
        let (_bus, service) = wired(OfferBookConfig::default());
        let id = OfferId::new("hot");

        let writer = {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for seq in 1..=500u64 {
                    service.on_added(entry("hot", seq, seq));
                }
            })
        };
        let rebuilder = {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                for _ in 0..20 {
                    service.rebuild(vec![entry("hot", 1, 1), entry("cold", 1, 1)]);
                }
            })
        };

        for _ in 0..500 {
            let snapshot = service.snapshot();
            assert!(snapshot.len() <= 2);
            if let Some(live) = snapshot.get(&id) {
                assert_eq!(live.offer_id, id);
            }
        }

        writer.join().unwrap();
        rebuilder.join().unwrap();
        assert_eq!(service.counts(), service.recount());
    }

    // =============================================================================
    // NODE RUNTIME
    // =============================================================================

    #[tokio::test]
    async fn test_runtime_concrete_offer_lifecycle() {
        let runtime = NodeRuntime::new(NodeConfig::default());
        let service = runtime.container().service.clone();

        let a = entry_of(offer("A", OfferDirection::Buy, "USD", 42_000), 1);
        let b = entry_of(offer("A", OfferDirection::Buy, "USD", 43_000), 2);
        let input = jsonl(&[
            StorageNotification::added(a.clone()),
            StorageNotification::added(b.clone()),
            StorageNotification::added(a),
            StorageNotification::removed(&b, SequenceNumber(2)),
        ]);

        let report = timeout(
            Duration::from_secs(2),
            runtime.ingest_from(BufReader::new(input.as_bytes())),
        )
        .await
        .expect("timeout")
        .unwrap();

        assert_eq!(report.reader.stopped_by, StopReason::EndOfInput);
        assert_eq!(report.feed.processed, 4);
        assert_eq!(report.feed.by_outcome.get("inserted"), Some(&1));
        assert_eq!(report.feed.by_outcome.get("replaced"), Some(&1));
        assert_eq!(report.feed.by_outcome.get("ignored_stale"), Some(&1));
        assert_eq!(report.feed.by_outcome.get("removed"), Some(&1));
        assert!(service.is_empty());
        assert_eq!(service.counts().total("USD"), 0);

        runtime.shutdown().await;
    }
}
