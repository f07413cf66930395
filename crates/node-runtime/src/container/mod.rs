//! # Offer Book Container
//!
//! Holds the shared instances of the node: the event bus and the
//! reconciliation service publishing into it.

pub mod config;

pub use config::{ConfigError, NodeConfig};

use ob_01_offer_book::{BusPublisher, OfferBookService};
use shared_bus::InMemoryEventBus;
use std::sync::Arc;
use tracing::info;

/// Wired node components.
pub struct OfferBookContainer {
    /// Configuration the container was built from.
    pub config: NodeConfig,
    /// Change-notification bus.
    pub bus: Arc<InMemoryEventBus>,
    /// Reconciliation service.
    pub service: Arc<OfferBookService>,
}

impl OfferBookContainer {
    /// Build the bus, then the service on top of it.
    pub fn new(config: NodeConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::with_capacity(
            config.offer_book.event_channel_capacity,
        ));
        let publisher = Arc::new(BusPublisher::new(Arc::clone(&bus)));
        let service = Arc::new(OfferBookService::new(
            config.offer_book.clone(),
            publisher,
        ));

        info!(
            tombstone_capacity = config.offer_book.tombstone_capacity,
            event_capacity = bus.capacity(),
            publish_ignored = config.offer_book.publish_ignored,
            "Offer book container initialized"
        );

        Self {
            config,
            bus,
            service,
        }
    }
}
