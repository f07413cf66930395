//! # Offer Book Fold Benchmarks
//!
//! | Path | Operation | Target |
//! |------|-----------|--------|
//! | Steady state | Fold one notification | O(log n) |
//! | Full pull | Rebuild from n entries | O(n log n) |
//! | Readers | Take a snapshot | O(1) |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ob_01_offer_book::{OfferBookConfig, ReconciliationStore};
use ob_tests::fixtures::{shuffled_history, versions, HistoryShape};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::StorageNotification;
use std::time::Duration;

fn fold_all(store: &mut ReconciliationStore, history: &[StorageNotification]) {
    for notification in history {
        match notification {
            StorageNotification::Added { .. } => {
                if let Some(entry) = notification.clone().into_entry() {
                    black_box(store.on_added(entry));
                }
            }
            StorageNotification::Removed {
                offer_id,
                fingerprint,
                sequence,
            } => {
                black_box(store.on_removed(offer_id, *fingerprint, *sequence));
            }
        }
    }
}

// ============================================================================
// Steady state: shuffled, duplicate-prone histories
// ============================================================================

fn bench_fold_history(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold");
    group.measurement_time(Duration::from_secs(10));

    for offers in [100, 1_000, 10_000] {
        let shape = HistoryShape {
            offers,
            ..HistoryShape::default()
        };
        let history = shuffled_history(&mut StdRng::seed_from_u64(1), shape);

        group.throughput(Throughput::Elements(history.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("shuffled_history", offers),
            &history,
            |b, history| {
                b.iter(|| {
                    let mut store = ReconciliationStore::new(OfferBookConfig::default());
                    fold_all(&mut store, history);
                    black_box(store.len())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// Full pull
// ============================================================================

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for offers in [1_000, 10_000] {
        let entries: Vec<_> = (0..offers)
            .flat_map(|n| versions(&format!("offer-{:05}", n), 2))
            .collect();

        group.throughput(Throughput::Elements(entries.len() as u64));
        group.bench_with_input(BenchmarkId::new("entries", offers), &entries, |b, entries| {
            let store = ReconciliationStore::new(OfferBookConfig::default());
            b.iter(|| black_box(store.rebuilt(entries.clone()).1.processed()))
        });
    }

    group.finish();
}

// ============================================================================
// Readers
// ============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let history = shuffled_history(
        &mut StdRng::seed_from_u64(2),
        HistoryShape {
            offers: 10_000,
            ..HistoryShape::default()
        },
    );
    let mut store = ReconciliationStore::new(OfferBookConfig::default());
    fold_all(&mut store, &history);

    c.bench_function("snapshot_10k", |b| b.iter(|| black_box(store.snapshot())));
}

criterion_group!(benches, bench_fold_history, bench_rebuild, bench_snapshot);
criterion_main!(benches);
