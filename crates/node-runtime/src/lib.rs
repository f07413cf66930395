//! # Node Runtime Library
//!
//! This library exposes the internal modules of the node runtime for testing.
//! The main entry point is the `main.rs` binary.
//!
//! ## Modular Structure
//!
//! - `container/` - Configuration and the wired bus + service
//! - `adapters/` - Snapshot file source and JSON-lines notification reader
//! - `handlers/` - Bus subscribers (metrics)
//! - `runtime` - Startup, ingestion and shutdown

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod runtime;

pub use container::{ConfigError, NodeConfig, OfferBookContainer};
pub use runtime::{IngestReport, NodeRuntime};
