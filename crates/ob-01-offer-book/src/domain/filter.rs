//! Suppression predicate
//!
//! Supplied by the filtering collaborator and evaluated at add time only.
//! Ban-list semantics live with the collaborator; the store just asks.

use shared_types::OfferPayload;

/// Decides whether an incoming offer must stay out of the live set.
pub trait OfferFilter: Send + Sync {
    /// True if `offer` must not be inserted.
    fn is_suppressed(&self, offer: &OfferPayload) -> bool;
}

impl<F> OfferFilter for F
where
    F: Fn(&OfferPayload) -> bool + Send + Sync,
{
    fn is_suppressed(&self, offer: &OfferPayload) -> bool {
        self(offer)
    }
}

/// Suppresses nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl OfferFilter for AllowAll {
    fn is_suppressed(&self, _offer: &OfferPayload) -> bool {
        false
    }
}
