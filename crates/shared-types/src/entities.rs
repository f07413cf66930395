//! # Core Domain Entities
//!
//! Defines the unit of replication for the offer book.
//!
//! ## Clusters
//!
//! - **Identity**: `OfferId`, `PayloadFingerprint`, `SequenceNumber`
//! - **Payload**: `OfferPayload`, `OfferDirection`
//! - **Replication**: `ReplicatedEntry`

use crate::errors::MalformedEntry;
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// Length of a payload fingerprint in bytes (SHA-256).
pub const FINGERPRINT_LEN: usize = 32;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Stable identifier of a logical offer across its whole lifecycle, edits
/// included. Assigned once by the offer's creator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferId(String);

impl OfferId {
    /// Wrap a raw identifier. No validation happens here; blank ids are
    /// caught by [`ReplicatedEntry::validate`].
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for an empty or whitespace-only identifier.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OfferId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for OfferId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Content hash of a serialized, immutable offer payload.
///
/// Two payloads with the same fingerprint are the same payload. The all-zero
/// value is reserved as "no fingerprint" and never identifies a payload.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayloadFingerprint(#[serde_as(as = "Hex")] [u8; FINGERPRINT_LEN]);

impl PayloadFingerprint {
    /// Wrap raw fingerprint bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a fingerprint from a byte slice of exactly [`FINGERPRINT_LEN`] bytes.
    ///
    /// # Errors
    ///
    /// `MalformedEntry::FingerprintLength` for any other length.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MalformedEntry> {
        let array: [u8; FINGERPRINT_LEN] = bytes
            .try_into()
            .map_err(|_| MalformedEntry::FingerprintLength { len: bytes.len() })?;
        Ok(Self(array))
    }

    /// Compute the fingerprint of a payload: SHA-256 over its canonical
    /// `bincode` encoding.
    ///
    /// # Errors
    ///
    /// `MalformedEntry::Unencodable` if the payload cannot be encoded.
    pub fn of(offer: &OfferPayload) -> Result<Self, MalformedEntry> {
        let encoded =
            bincode::serialize(offer).map_err(|e| MalformedEntry::Unencodable(e.to_string()))?;
        Ok(Self(Sha256::digest(&encoded).into()))
    }

    /// Raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// True for the reserved all-zero value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Display for PayloadFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for PayloadFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadFingerprint({})", self.short())
    }
}

/// Per-mutation counter assigned by the storage layer.
///
/// Monotonically non-decreasing for successive mutations of the same payload
/// as seen from one origin. It is a Lamport-like counter, not a clock, and is
/// not globally ordered across payloads or peers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SequenceNumber(pub u64);

impl SequenceNumber {
    /// The raw counter value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// The following sequence number.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for SequenceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SequenceNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

// =============================================================================
// CLUSTER B: PAYLOAD
// =============================================================================

/// Trade direction of an offer, from the maker's point of view on the base
/// currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferDirection {
    /// Maker buys the base currency.
    Buy,
    /// Maker sells the base currency.
    Sell,
}

impl fmt::Display for OfferDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("BUY"),
            Self::Sell => f.write_str("SELL"),
        }
    }
}

/// The immutable, published intent to trade.
///
/// Never mutated in place: an edit produces a new payload (and a new
/// fingerprint) under the same `offer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferPayload {
    /// Logical offer identifier.
    pub offer_id: OfferId,
    /// Buy or sell, relative to the base currency.
    pub direction: OfferDirection,
    /// Base currency code (e.g. `BTC`).
    pub base_currency: String,
    /// Counter currency code (e.g. `USD`).
    pub counter_currency: String,
    /// Price in the smallest unit of the counter currency.
    pub price: u64,
    /// Offered amount in the smallest unit of the base currency.
    pub amount: u64,
    /// Minimum tradable amount in the smallest unit of the base currency.
    pub min_amount: u64,
    /// Payment method identifier (e.g. `SEPA`).
    pub payment_method_id: String,
    /// Network address of the maker node.
    pub maker_node_address: String,
    /// Trade protocol version the maker speaks.
    pub protocol_version: u32,
    /// Creation time in milliseconds since UNIX epoch, as stated by the maker.
    pub created_at_ms: u64,
    /// Free-form extension fields. Ordered so the encoding is canonical.
    #[serde(default)]
    pub extra_data: BTreeMap<String, String>,
}

impl OfferPayload {
    /// The currency that identifies the offer's market: the non-BTC side of
    /// the pair. Per-currency counts are keyed by this value.
    #[must_use]
    pub fn market_currency(&self) -> &str {
        if self.base_currency == "BTC" {
            &self.counter_currency
        } else {
            &self.base_currency
        }
    }

    /// Market label such as `BTC/USD`.
    #[must_use]
    pub fn market(&self) -> String {
        format!("{}/{}", self.base_currency, self.counter_currency)
    }
}

// =============================================================================
// CLUSTER C: REPLICATION
// =============================================================================

/// The unit of replication: an offer payload plus its replication metadata.
///
/// Owned by the reconciliation store once accepted and never mutated after
/// that, only replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatedEntry {
    /// The offer payload.
    pub offer: OfferPayload,
    /// Logical offer identifier. Must equal `offer.offer_id`.
    pub offer_id: OfferId,
    /// Fingerprint of `offer`.
    pub fingerprint: PayloadFingerprint,
    /// Sequence number of this mutation.
    pub sequence: SequenceNumber,
}

impl ReplicatedEntry {
    /// Build a validated entry.
    ///
    /// # Errors
    ///
    /// Any [`MalformedEntry`] reported by [`ReplicatedEntry::validate`].
    pub fn new(
        offer: OfferPayload,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    ) -> Result<Self, MalformedEntry> {
        let entry = Self {
            offer_id: offer.offer_id.clone(),
            offer,
            fingerprint,
            sequence,
        };
        entry.validate()?;
        Ok(entry)
    }

    /// Build an entry whose fingerprint is computed from the payload.
    ///
    /// # Errors
    ///
    /// Any [`MalformedEntry`] from encoding or validation.
    pub fn from_payload(
        offer: OfferPayload,
        sequence: SequenceNumber,
    ) -> Result<Self, MalformedEntry> {
        let fingerprint = PayloadFingerprint::of(&offer)?;
        Self::new(offer, fingerprint, sequence)
    }

    /// Construction-time validation.
    ///
    /// Entries that arrive deserialized skip [`ReplicatedEntry::new`], so the
    /// store runs this again before folding them.
    ///
    /// # Errors
    ///
    /// - `EmptyOfferId` for a blank offer id
    /// - `EmptyFingerprint` for the all-zero fingerprint
    /// - `OfferIdMismatch` when the payload carries a different id
    pub fn validate(&self) -> Result<(), MalformedEntry> {
        if self.offer_id.is_blank() {
            return Err(MalformedEntry::EmptyOfferId);
        }
        if self.fingerprint.is_empty() {
            return Err(MalformedEntry::EmptyFingerprint);
        }
        if self.offer.offer_id != self.offer_id {
            return Err(MalformedEntry::OfferIdMismatch {
                entry: self.offer_id.to_string(),
                payload: self.offer.offer_id.to_string(),
            });
        }
        Ok(())
    }

    /// True iff both entries describe the same physical mutation, i.e. the
    /// same (OfferId, PayloadFingerprint) pair.
    #[must_use]
    pub fn same_mutation(&self, other: &Self) -> bool {
        self.offer_id == other.offer_id && self.fingerprint == other.fingerprint
    }

    /// Full payload equality, the last tie-breaker when two fingerprints
    /// differ but the payload is byte-for-byte the same offer.
    #[must_use]
    pub fn same_payload(&self, other: &Self) -> bool {
        self.offer == other.offer
    }
}
