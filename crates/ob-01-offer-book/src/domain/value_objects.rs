//! Value objects for the Offer Book
//!
//! Results of a bulk rebuild.

use super::entities::LiveSet;
use serde::{Deserialize, Serialize};
use shared_types::{MalformedEntry, OfferId};

/// An entry the rebuild skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Position in the pulled sequence.
    pub index: usize,
    /// Offer id as carried by the entry (may be blank).
    pub offer_id: OfferId,
    /// Why it was skipped.
    pub reason: MalformedEntry,
}

/// Outcome tallies of a rebuild replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildTally {
    pub inserted: usize,
    pub replaced: usize,
    pub ignored: usize,
    pub suppressed: usize,
}

/// Result of `rebuild`: the new snapshot plus what happened to each entry.
#[derive(Debug, Clone)]
pub struct RebuildReport {
    /// Live set after the swap.
    pub snapshot: LiveSet,
    /// Malformed entries, in input order.
    pub skipped: Vec<SkippedEntry>,
    /// Per-outcome tallies of the replay.
    pub tally: RebuildTally,
}

impl RebuildReport {
    /// Entries the replay looked at.
    pub fn processed(&self) -> usize {
        self.tally.inserted
            + self.tally.replaced
            + self.tally.ignored
            + self.tally.suppressed
            + self.skipped.len()
    }

    /// True if nothing was skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
