//! # OB-01: Offer Book Reconciliation Engine
//!
//! Turns an unordered, duplicate-prone, delayed stream of "offer added" /
//! "offer removed" notifications from a peer-to-peer storage network into
//! one consistent, locally observable set of active offers.
//!
//! ## Architecture
//!
//! - **Domain**: `ReconciliationStore` (the fold), `LiveSet`, `OfferCounts`,
//!   the tombstone log and the suppression predicate
//! - **Ports**: Inbound (`OfferBookApi`) and Outbound
//!   (`OfferBookEventPublisher`, `OfferSnapshotSource`)
//! - **Application**: `OfferBookService`, the locked, event-emitting wrapper
//! - **Adapters**: bus publisher, static snapshot source, notification feed
//!
//! ## Guarantees
//!
//! - At most one live entry per offer; an edit appears atomic to readers
//! - The live entry carries the highest accepted sequence for its offer
//! - A removed offer is not resurrected by an earlier-or-equal add
//! - Counts always equal a recount over the live set

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{
    notification_feed, BusPublisher, FeedClosed, FeedHandle, FeedStats, NoOpPublisher,
    NotificationFeed, StaticSnapshotSource,
};
pub use application::service::OfferBookService;
pub use config::OfferBookConfig;
pub use domain::aggregates::{DirectionCounts, OfferCounts};
pub use domain::entities::{Fold, LiveChange, LiveSet};
pub use domain::errors::{OfferBookError, SnapshotSourceError};
pub use domain::filter::{AllowAll, OfferFilter};
pub use domain::store::ReconciliationStore;
pub use domain::value_objects::{RebuildReport, RebuildTally, SkippedEntry};
pub use ports::inbound::OfferBookApi;
pub use ports::outbound::{OfferBookEventPublisher, OfferSnapshotSource};
