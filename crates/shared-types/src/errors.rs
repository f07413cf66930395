//! # Error Types
//!
//! Defines error types shared across the offer-book crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons a replicated entry fails construction-time validation.
///
/// A malformed entry is never folded into the store; the caller gets
/// `AcceptanceOutcome::Rejected` carrying one of these. Serialized with
/// its detail; unit reasons travel as their label.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedEntry {
    /// Offer id is empty or whitespace.
    #[error("Offer id is empty")]
    EmptyOfferId,

    /// Fingerprint is the reserved all-zero value.
    #[error("Payload fingerprint is empty")]
    EmptyFingerprint,

    /// Fingerprint bytes have the wrong length.
    #[error("Payload fingerprint has {len} bytes, expected 32")]
    FingerprintLength { len: usize },

    /// Entry offer id disagrees with the id inside the payload.
    #[error("Offer id mismatch: entry={entry} payload={payload}")]
    OfferIdMismatch { entry: String, payload: String },

    /// Payload could not be encoded for fingerprinting.
    #[error("Payload cannot be encoded: {0}")]
    Unencodable(String),
}

impl MalformedEntry {
    /// Short label used for metrics and log fields.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyOfferId => "empty_offer_id",
            Self::EmptyFingerprint => "empty_fingerprint",
            Self::FingerprintLength { .. } => "fingerprint_length",
            Self::OfferIdMismatch { .. } => "offer_id_mismatch",
            Self::Unencodable(_) => "unencodable",
        }
    }
}
