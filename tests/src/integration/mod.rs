//! # Integration Tests
//!
//! - `convergence`: replicas fed the same notifications in different
//!   orders, with duplicates, end in the same state
//! - `flows`: feed → service → bus, file resync and the node runtime

pub mod convergence;
pub mod flows;
