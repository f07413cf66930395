//! # Adapters
//!
//! Host-side implementations of the offer book's input edges:
//! - `snapshot_file`: full-pull source over a JSON snapshot dump
//! - `notification_reader`: JSON-lines notification input

pub mod notification_reader;
pub mod snapshot_file;

pub use notification_reader::{forward_lines, parse_line, ReaderError, ReaderStats, StopReason};
pub use snapshot_file::JsonFileSnapshotSource;
