//! # Shared Types Crate
//!
//! This crate contains the replication data model shared by every crate in
//! the workspace: the immutable offer payload, its content fingerprint, the
//! per-mutation sequence number and the `ReplicatedEntry` that bundles them.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-crate types are defined here.
//! - **Content Identity**: Two payloads are the same payload iff their
//!   fingerprints match. Nothing in an entry is mutable runtime state.
//! - **Replace, Never Mutate**: An edit is a new payload and a new
//!   fingerprint under the same `OfferId`.

pub mod entities;
pub mod errors;
pub mod notification;
pub mod outcome;

pub use entities::*;
pub use errors::*;
pub use notification::StorageNotification;
pub use outcome::AcceptanceOutcome;
