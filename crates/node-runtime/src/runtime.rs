//! # Node Runtime
//!
//! Orchestrates one offer book node.
//!
//! ## Startup Sequence
//!
//! 1. Build the container (bus, then service)
//! 2. Start the metrics handler, subscribed before anything is published
//! 3. Rebuild from the snapshot file, if one is configured
//!
//! ## Ingestion
//!
//! ```text
//! JSON lines ──forward_lines──→ FeedHandle ──mpsc──→ NotificationFeed
//!                                                           │ apply()
//!                                                           ↓
//!                                  MetricsHandler ←─bus─ OfferBookService
//! ```
//!
//! Ingestion ends at end of input (queued notifications are still folded)
//! or on shutdown (queued notifications are dropped).

use crate::adapters::{forward_lines, JsonFileSnapshotSource, ReaderStats};
use crate::container::{NodeConfig, OfferBookContainer};
use crate::handlers::MetricsHandler;
use anyhow::{Context, Result};
use ob_01_offer_book::{
    notification_feed, FeedStats, OfferBookApi, OfferSnapshotSource, RebuildReport,
};
use ob_telemetry::{time_histogram, REBUILD_DURATION};
use parking_lot::Mutex;
use shared_bus::EventFilter;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Time allowed for background handlers to stop.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Totals for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub reader: ReaderStats,
    pub feed: FeedStats,
}

/// The offer book node.
pub struct NodeRuntime {
    /// Wired components.
    container: Arc<OfferBookContainer>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
    /// Shutdown signal receiver, cloned into every task.
    shutdown_rx: watch::Receiver<bool>,
    /// Background handlers to join on shutdown.
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl NodeRuntime {
    pub fn new(config: NodeConfig) -> Self {
        info!("Creating offer book node runtime");
        let container = Arc::new(OfferBookContainer::new(config));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            container,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Start background handlers and run the startup rebuild.
    pub async fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Offer Book Node v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        self.start_handlers();

        if let Some(path) = self.container.config.snapshot_path.clone() {
            info!(path = %path.display(), "Rebuilding from snapshot file");
            self.resync_from(&JsonFileSnapshotSource::new(path))
                .await
                .context("Startup rebuild failed")?;
        } else {
            info!("No snapshot configured, starting with an empty book");
        }

        Ok(())
    }

    fn start_handlers(&self) {
        let container = &self.container;
        let handler = MetricsHandler::new(
            container.bus.event_stream(EventFilter::all()),
            Arc::clone(&container.service),
        );
        let shutdown = self.shutdown_rx.clone();
        self.tasks.lock().push(tokio::spawn(handler.run(shutdown)));
        info!("Metrics handler spawned");
    }

    /// Rebuild the live set from a full pull.
    ///
    /// On failure the live set is left as it was.
    pub async fn resync_from(&self, source: &dyn OfferSnapshotSource) -> Result<RebuildReport> {
        let report = {
            let _timer = time_histogram!(REBUILD_DURATION);
            self.container.service.resync(source).await?
        };

        for skipped in &report.skipped {
            warn!(
                index = skipped.index,
                offer_id = %skipped.offer_id,
                reason = skipped.reason.label(),
                "Skipped malformed snapshot entry"
            );
        }
        info!(
            live_offers = report.snapshot.len(),
            processed = report.processed(),
            skipped = report.skipped.len(),
            "Rebuild complete"
        );
        Ok(report)
    }

    /// Fold notifications from the configured file, or stdin.
    pub async fn ingest(&self) -> Result<IngestReport> {
        match self.container.config.notifications_path.clone() {
            Some(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                info!(path = %path.display(), "Reading notifications from file");
                self.ingest_from(BufReader::new(file)).await
            }
            None => {
                info!("Reading notifications from stdin");
                self.ingest_from(BufReader::new(tokio::io::stdin())).await
            }
        }
    }

    /// Fold every notification in `reader`.
    pub async fn ingest_from<R>(&self, reader: R) -> Result<IngestReport>
    where
        R: AsyncBufRead + Unpin,
    {
        let (handle, feed) = notification_feed(self.container.config.feed_capacity);

        let service = Arc::clone(&self.container.service);
        let shutdown = self.shutdown_rx.clone();
        let consumer = tokio::spawn(async move { feed.run(service.as_ref(), shutdown).await });

        let read = forward_lines(reader, &handle, self.shutdown_rx.clone()).await;
        // Closing the last handle lets the consumer drain and stop.
        drop(handle);

        let feed = consumer.await.context("Notification feed consumer failed")?;
        let reader = read?;
        Ok(IngestReport { reader, feed })
    }

    /// Ask every task to stop. Safe to call more than once.
    pub fn request_shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Stop background handlers, waiting briefly for them to finish.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.request_shutdown();

        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Handler task failed: {}", e),
                Err(_) => warn!("Handler did not stop within {:?}", SHUTDOWN_GRACE),
            }
        }

        info!("Shutdown complete");
    }

    /// Log the ingestion totals and the final book.
    pub fn log_summary(&self, report: &IngestReport) {
        let service = &self.container.service;
        let counts = service.counts();

        info!(
            lines = report.reader.lines,
            malformed_lines = report.reader.malformed,
            processed = report.feed.processed,
            accepted = report.feed.accepted,
            ignored = report.feed.ignored,
            rejected = report.feed.rejected,
            "Ingestion finished"
        );
        for (outcome, count) in &report.feed.by_outcome {
            info!(outcome, count, "Outcome total");
        }
        info!(
            live_offers = counts.total_offers(),
            markets = counts.currencies().count(),
            tombstones = service.tombstone_count(),
            "Final offer book"
        );
        for (currency, row) in counts.iter() {
            info!(currency, buy = row.buy, sell = row.sell, "Market");
        }
    }

    /// Get a reference to the container.
    pub fn container(&self) -> Arc<OfferBookContainer> {
        Arc::clone(&self.container)
    }
}
