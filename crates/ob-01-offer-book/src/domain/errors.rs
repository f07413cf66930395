//! Error types for the Offer Book
//!
//! Steady-state folds never fail: ignored mutations are outcomes, not
//! errors. These types cover the full-pull path only.

use thiserror::Error;

/// Errors raised by the offer book service
#[derive(Debug, Error)]
pub enum OfferBookError {
    /// The full-pull source failed
    #[error("Snapshot source failed: {0}")]
    Snapshot(#[from] SnapshotSourceError),
}

/// Errors from a full-pull snapshot source
#[derive(Debug, Error)]
pub enum SnapshotSourceError {
    #[error("Snapshot source unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode snapshot: {0}")]
    Decode(String),
}
