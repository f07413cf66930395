//! # Event Handlers
//!
//! Bus subscribers run by the node alongside the reconciliation service.

pub mod metrics;

pub use metrics::{record_event, CurrencyGauges, MetricsHandler};
