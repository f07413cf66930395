//! # Notification Feed
//!
//! Single-consumer channel for hosts that receive storage notifications on
//! several tasks or threads. Producers hold cloneable `FeedHandle`s; one
//! consumer task drains the channel and folds one notification at a time.

use crate::ports::inbound::OfferBookApi;
use shared_types::{AcceptanceOutcome, StorageNotification};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// The consumer side is gone.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Notification feed closed")]
pub struct FeedClosed;

/// Create a feed holding at most `capacity` pending notifications.
pub fn notification_feed(capacity: usize) -> (FeedHandle, NotificationFeed) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (FeedHandle { sender }, NotificationFeed { receiver })
}

/// Producer handle. Clone one per receiving task.
#[derive(Clone)]
pub struct FeedHandle {
    sender: mpsc::Sender<StorageNotification>,
}

impl FeedHandle {
    /// Queue a notification, waiting for room.
    pub async fn send(&self, notification: StorageNotification) -> Result<(), FeedClosed> {
        self.sender.send(notification).await.map_err(|_| FeedClosed)
    }

    /// Queue a notification from synchronous code, waiting for room.
    ///
    /// Must not be called from inside the async runtime.
    pub fn blocking_send(&self, notification: StorageNotification) -> Result<(), FeedClosed> {
        self.sender.blocking_send(notification).map_err(|_| FeedClosed)
    }

    /// True once the consumer has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Totals reported when the consumer loop ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStats {
    pub processed: u64,
    pub accepted: u64,
    pub ignored: u64,
    pub rejected: u64,
    /// Count per outcome label.
    pub by_outcome: BTreeMap<&'static str, u64>,
}

impl FeedStats {
    fn record(&mut self, outcome: &AcceptanceOutcome) {
        self.processed += 1;
        if outcome.is_accepted() {
            self.accepted += 1;
        } else if outcome.is_ignored() {
            self.ignored += 1;
        } else {
            self.rejected += 1;
        }
        *self.by_outcome.entry(outcome.label()).or_insert(0) += 1;
    }
}

/// Consumer side of the feed.
pub struct NotificationFeed {
    receiver: mpsc::Receiver<StorageNotification>,
}

impl NotificationFeed {
    /// Drain the feed into `book` until every handle is dropped or
    /// `shutdown` turns true (or its sender is dropped).
    ///
    /// Notifications still queued at shutdown are not folded.
    pub async fn run<A>(mut self, book: &A, mut shutdown: watch::Receiver<bool>) -> FeedStats
    where
        A: OfferBookApi + ?Sized,
    {
        let mut stats = FeedStats::default();

        if *shutdown.borrow() {
            return stats;
        }

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Notification feed shutting down");
                        break;
                    }
                }
                next = self.receiver.recv() => {
                    let Some(notification) = next else {
                        debug!("All feed handles dropped");
                        break;
                    };
                    let outcome = book.apply(notification);
                    stats.record(&outcome);
                }
            }
        }

        info!(
            processed = stats.processed,
            accepted = stats.accepted,
            ignored = stats.ignored,
            rejected = stats.rejected,
            "Notification feed stopped"
        );
        stats
    }
}
