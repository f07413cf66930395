//! Adapters for the Offer Book
//!
//! - `publisher`: event sinks (shared bus, no-op)
//! - `snapshot_source`: in-memory full-pull source
//! - `feed`: single-consumer notification channel driving the service

pub mod feed;
pub mod publisher;
pub mod snapshot_source;

pub use feed::{notification_feed, FeedClosed, FeedHandle, FeedStats, NotificationFeed};
pub use publisher::{BusPublisher, NoOpPublisher};
pub use snapshot_source::StaticSnapshotSource;
