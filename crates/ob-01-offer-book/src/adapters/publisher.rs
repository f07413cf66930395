//! Event publisher adapters for the Offer Book.
//!
//! Publishes change notifications to the shared bus.

use crate::ports::outbound::OfferBookEventPublisher;
use shared_bus::{EventPublisher, InMemoryEventBus, OfferBookEvent};
use std::sync::Arc;

/// Publisher backed by the shared in-memory bus.
#[derive(Clone)]
pub struct BusPublisher {
    bus: Arc<InMemoryEventBus>,
}

impl BusPublisher {
    pub fn new(bus: Arc<InMemoryEventBus>) -> Self {
        Self { bus }
    }

    /// The underlying bus.
    pub fn bus(&self) -> &Arc<InMemoryEventBus> {
        &self.bus
    }
}

impl OfferBookEventPublisher for BusPublisher {
    fn publish(&self, event: OfferBookEvent) {
        self.bus.publish(event);
    }
}

/// No-op publisher for running without an event bus.
#[derive(Debug, Clone, Default)]
pub struct NoOpPublisher;

impl OfferBookEventPublisher for NoOpPublisher {
    fn publish(&self, _event: OfferBookEvent) {}
}

/// Recording publisher for testing.
#[cfg(test)]
pub struct RecordingPublisher {
    events: parking_lot::Mutex<Vec<OfferBookEvent>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            events: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<OfferBookEvent> {
        self.events.lock().clone()
    }
}

#[cfg(test)]
impl OfferBookEventPublisher for RecordingPublisher {
    fn publish(&self, event: OfferBookEvent) {
        self.events.lock().push(event);
    }
}
