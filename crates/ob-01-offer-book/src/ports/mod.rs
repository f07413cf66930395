//! Ports module for the Offer Book
//!
//! Defines inbound (API) and outbound (SPI) port traits.

pub mod inbound;
pub mod outbound;

pub use crate::domain::filter::OfferFilter;
pub use inbound::OfferBookApi;
pub use outbound::{OfferBookEventPublisher, OfferSnapshotSource};
