//! # Node Configuration
//!
//! Runtime parameters for the offer book node, read from the environment.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OB_TOMBSTONE_CAPACITY` | `10000` | Removals remembered against resurrection |
//! | `OB_PUBLISH_IGNORED` | `false` | Publish events for ignored mutations |
//! | `OB_VERIFY_COUNTS` | `false` | Recount after every mutation |
//! | `OB_EVENT_CAPACITY` | `1000` | Event bus channel capacity |
//! | `OB_FEED_CAPACITY` | `1024` | Pending notifications before producers wait |
//! | `OB_SNAPSHOT_PATH` | unset | JSON snapshot to rebuild from at startup |
//! | `OB_NOTIFICATIONS_PATH` | unset (stdin) | JSON-lines notification input |

use ob_01_offer_book::OfferBookConfig;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default number of notifications queued between reader and fold.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Reconciliation engine settings.
    pub offer_book: OfferBookConfig,
    /// Bound of the notification feed.
    pub feed_capacity: usize,
    /// Snapshot file for the startup rebuild. `None` starts empty.
    pub snapshot_path: Option<PathBuf>,
    /// Notification input. `None` reads stdin.
    pub notifications_path: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            offer_book: OfferBookConfig::default(),
            feed_capacity: DEFAULT_FEED_CAPACITY,
            snapshot_path: None,
            notifications_path: None,
        }
    }
}

impl NodeConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let book = &mut config.offer_book;

        if let Some(v) = parsed(&lookup, "OB_TOMBSTONE_CAPACITY")? {
            book.tombstone_capacity = v;
        }
        if let Some(v) = flag(&lookup, "OB_PUBLISH_IGNORED")? {
            book.publish_ignored = v;
        }
        if let Some(v) = flag(&lookup, "OB_VERIFY_COUNTS")? {
            book.verify_counts_on_mutation = v;
        }
        if let Some(v) = parsed(&lookup, "OB_EVENT_CAPACITY")? {
            book.event_channel_capacity = v;
        }
        if let Some(v) = parsed(&lookup, "OB_FEED_CAPACITY")? {
            config.feed_capacity = v;
        }
        config.snapshot_path = path(&lookup, "OB_SNAPSHOT_PATH");
        config.notifications_path = path(&lookup, "OB_NOTIFICATIONS_PATH");

        Ok(config)
    }

    /// Reject settings the runtime cannot run with.
    ///
    /// A zero tombstone capacity is allowed; it disables the log.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.offer_book.event_channel_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("OB_EVENT_CAPACITY"));
        }
        if self.feed_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("OB_FEED_CAPACITY"));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to something that does not parse.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    /// A capacity that must be positive was zero.
    #[error("{0} must be greater than zero")]
    ZeroCapacity(&'static str),
}

fn parsed<F, T>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

fn flag<F>(lookup: &F, key: &'static str) -> Result<Option<bool>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}

fn path<F>(lookup: &F, key: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|raw| !raw.trim().is_empty())
        .map(PathBuf::from)
}
