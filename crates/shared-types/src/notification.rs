//! # Storage Notifications
//!
//! The change-notification contract consumed from the storage collaborator,
//! as a value. One notification per locally received network event;
//! duplicates and reordering are expected.

use crate::entities::{OfferId, OfferPayload, PayloadFingerprint, ReplicatedEntry, SequenceNumber};
use serde::{Deserialize, Serialize};

/// A single `Added` / `Removed` callback from the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageNotification {
    /// A payload was stored.
    Added {
        offer: OfferPayload,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    },
    /// A payload was removed.
    Removed {
        offer_id: OfferId,
        fingerprint: PayloadFingerprint,
        sequence: SequenceNumber,
    },
}

impl StorageNotification {
    /// Notification announcing `entry`.
    #[must_use]
    pub fn added(entry: ReplicatedEntry) -> Self {
        Self::Added {
            offer: entry.offer,
            fingerprint: entry.fingerprint,
            sequence: entry.sequence,
        }
    }

    /// Notification removing `entry` at `sequence`.
    #[must_use]
    pub fn removed(entry: &ReplicatedEntry, sequence: SequenceNumber) -> Self {
        Self::Removed {
            offer_id: entry.offer_id.clone(),
            fingerprint: entry.fingerprint,
            sequence,
        }
    }

    /// Offer the notification refers to.
    #[must_use]
    pub fn offer_id(&self) -> &OfferId {
        match self {
            Self::Added { offer, .. } => &offer.offer_id,
            Self::Removed { offer_id, .. } => offer_id,
        }
    }

    /// Sequence number carried by the notification.
    #[must_use]
    pub fn sequence(&self) -> SequenceNumber {
        match self {
            Self::Added { sequence, .. } | Self::Removed { sequence, .. } => *sequence,
        }
    }

    /// Entry view of an `Added` notification. Not validated; the store
    /// validates on fold.
    #[must_use]
    pub fn into_entry(self) -> Option<ReplicatedEntry> {
        match self {
            Self::Added {
                offer,
                fingerprint,
                sequence,
            } => Some(ReplicatedEntry {
                offer_id: offer.offer_id.clone(),
                offer,
                fingerprint,
                sequence,
            }),
            Self::Removed { .. } => None,
        }
    }
}
