//! Domain module for the Offer Book
//!
//! Contains the live set, aggregates, the suppression predicate, the
//! tombstone log, the reconciliation store, errors and invariants.

pub mod aggregates;
pub mod entities;
pub mod errors;
pub mod filter;
pub mod invariants;
pub mod store;
pub mod tombstones;
pub mod value_objects;


pub use aggregates::*;
pub use entities::*;
pub use errors::*;
pub use filter::{AllowAll, OfferFilter};
pub use store::ReconciliationStore;
pub use tombstones::{Tombstone, TombstoneLog};
pub use value_objects::*;
