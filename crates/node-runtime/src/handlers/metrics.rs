//! # Metrics Handler
//!
//! Bus subscriber that keeps the Prometheus metrics in step with the
//! offer book. Mutation counters follow the events; gauges are refreshed
//! from the service's counts after each event.
//!
//! Ignored outcomes only reach `ob_offer_mutations_total` when
//! ignored-event publishing is enabled.

use ob_01_offer_book::{OfferBookApi, OfferBookService, OfferCounts};
use ob_telemetry::{
    EVENT_BUS_MESSAGES_RECEIVED, OFFERS_BY_CURRENCY, OFFERS_LIVE, OFFER_MUTATIONS, REBUILDS,
    REBUILD_SKIPPED_ENTRIES,
};
use shared_bus::{EventStream, OfferBookEvent};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::StreamExt;
use tracing::{debug, info};

/// Handler feeding bus events into the metrics registry.
pub struct MetricsHandler {
    events: EventStream,
    service: Arc<OfferBookService>,
    gauges: CurrencyGauges,
}

impl MetricsHandler {
    pub fn new(events: EventStream, service: Arc<OfferBookService>) -> Self {
        Self {
            events,
            service,
            gauges: CurrencyGauges::default(),
        }
    }

    /// Run until shutdown is signalled or the bus closes.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Metrics handler started");
        self.gauges.refresh(&self.service.counts());

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Metrics handler shutting down");
                        break;
                    }
                }
                event = self.events.next() => {
                    let Some(event) = event else {
                        info!("Event bus closed");
                        break;
                    };
                    record_event(&event);
                    self.gauges.refresh(&self.service.counts());
                }
            }
        }

        // Final state, including folds whose events were never received.
        self.gauges.refresh(&self.service.counts());
        info!(
            lagged = self.events.lagged(),
            "Metrics handler stopped"
        );
    }
}

/// Count one event.
pub fn record_event(event: &OfferBookEvent) {
    EVENT_BUS_MESSAGES_RECEIVED
        .with_label_values(&[event.topic().label()])
        .inc();

    if let Some(outcome) = event.outcome() {
        OFFER_MUTATIONS.with_label_values(&[outcome.label()]).inc();
    }

    if let OfferBookEvent::BookRebuilt {
        live_offers,
        skipped,
    } = event
    {
        REBUILDS.inc();
        REBUILD_SKIPPED_ENTRIES.inc_by(*skipped as f64);
        debug!(live_offers, skipped, "Recorded rebuild");
    }
}

/// Live gauges, remembering which market rows were exported.
#[derive(Debug, Default)]
pub struct CurrencyGauges {
    exported: BTreeSet<String>,
}

impl CurrencyGauges {
    /// Overwrite the live gauges with `counts`, dropping rows for markets
    /// that emptied since the last refresh.
    pub fn refresh(&mut self, counts: &OfferCounts) {
        OFFERS_LIVE.set(counts.total_offers() as f64);

        let current: BTreeSet<String> = counts.currencies().map(str::to_string).collect();
        for gone in self.exported.difference(&current) {
            for direction in DIRECTIONS {
                let _ = OFFERS_BY_CURRENCY.remove_label_values(&[gone, direction]);
            }
        }

        for (currency, row) in counts.iter() {
            OFFERS_BY_CURRENCY
                .with_label_values(&[currency, "buy"])
                .set(row.buy as f64);
            OFFERS_BY_CURRENCY
                .with_label_values(&[currency, "sell"])
                .set(row.sell as f64);
        }
        self.exported = current;
    }

    /// Markets currently exported.
    pub fn exported(&self) -> impl Iterator<Item = &str> {
        self.exported.iter().map(String::as_str)
    }
}

const DIRECTIONS: [&str; 2] = ["buy", "sell"];
