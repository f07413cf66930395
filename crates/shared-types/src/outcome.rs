//! # Acceptance Outcome
//!
//! The tagged result of folding one notification into the store. Ignored
//! outcomes are expected steady-state results of a lossy, reordering
//! network, not failures.

use crate::entities::PayloadFingerprint;
use crate::errors::MalformedEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of `on_added` / `on_removed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AcceptanceOutcome {
    /// New offer entered the live set.
    Inserted,
    /// An edit superseded the live entry; carries the old fingerprint.
    Replaced(PayloadFingerprint),
    /// Redelivery of a mutation already reflected in the live set.
    IgnoredDuplicate,
    /// Mutation superseded by a newer one already accepted.
    IgnoredStale,
    /// Add rejected by the suppression predicate. Nothing was recorded.
    ///
    /// Treated like `IgnoredDuplicate` (not inserted, not an error). A
    /// separate tag keeps filtered traffic apart from redeliveries in logs
    /// and metrics; `is_ignored` covers both.
    IgnoredSuppressed,
    /// Offer left the live set.
    Removed,
    /// Removal for an offer that is not live.
    IgnoredUnknown,
    /// Entry failed construction-time validation.
    Rejected(MalformedEntry),
}

impl AcceptanceOutcome {
    /// True if the live set changed.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Inserted | Self::Replaced(_) | Self::Removed)
    }

    /// True for the `Ignored*` family.
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        matches!(
            self,
            Self::IgnoredDuplicate
                | Self::IgnoredStale
                | Self::IgnoredSuppressed
                | Self::IgnoredUnknown
        )
    }

    /// Stable snake_case tag for log fields and metric labels.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Replaced(_) => "replaced",
            Self::IgnoredDuplicate => "ignored_duplicate",
            Self::IgnoredStale => "ignored_stale",
            Self::IgnoredSuppressed => "ignored_suppressed",
            Self::Removed => "removed",
            Self::IgnoredUnknown => "ignored_unknown",
            Self::Rejected(_) => "rejected",
        }
    }
}

impl fmt::Display for AcceptanceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replaced(old) => write!(f, "replaced({})", old.short()),
            Self::Rejected(reason) => write!(f, "rejected({reason})"),
            other => f.write_str(other.label()),
        }
    }
}
