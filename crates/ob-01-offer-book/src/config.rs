//! Configuration for the Offer Book engine

use serde::{Deserialize, Serialize};

/// Offer book configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfferBookConfig {
    /// Removals remembered per store to block resurrection by late adds
    pub tombstone_capacity: usize,
    /// Publish `MutationIgnored` events for folds that changed nothing
    pub publish_ignored: bool,
    /// Compare incremental counts against a recount after every accepted mutation
    pub verify_counts_on_mutation: bool,
    /// Capacity of the change-notification broadcast channel
    pub event_channel_capacity: usize,
}

impl Default for OfferBookConfig {
    fn default() -> Self {
        Self {
            tombstone_capacity: 10_000,
            publish_ignored: false,
            verify_counts_on_mutation: false,
            event_channel_capacity: 1000,
        }
    }
}

impl OfferBookConfig {
    /// Config for tests: small tombstone log, every check enabled.
    pub fn for_testing() -> Self {
        Self {
            tombstone_capacity: 64,
            publish_ignored: true,
            verify_counts_on_mutation: true,
            event_channel_capacity: 256,
        }
    }
}
