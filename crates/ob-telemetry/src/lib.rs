//! # Offer Book Telemetry
//!
//! Logging and metrics for the offer book node.
//!
//! ## Components
//!
//! - **Logs**: `tracing` with an `EnvFilter` and a pretty or JSON fmt layer
//! - **Metrics**: Prometheus counters, gauges and histograms in one registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ob_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let config = TelemetryConfig::from_env();
//!     init_telemetry(&config).expect("Failed to init telemetry");
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OB_SERVICE_NAME` | `offer-book` | Service name in logs |
//! | `OB_LOG_LEVEL` | `info` | Log level filter (`RUST_LOG` also honoured) |
//! | `OB_JSON_LOGS` | `false` (`true` in containers) | JSON log output |
//! | `OB_CONSOLE_OUTPUT` | `true` | Write logs to stdout |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, HistogramTimer, EVENT_BUS_MESSAGES_RECEIVED,
    OFFERS_BY_CURRENCY, OFFERS_LIVE, OFFER_MUTATIONS, REBUILDS, REBUILD_DURATION,
    REBUILD_SKIPPED_ENTRIES,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Initialize metrics, then logging.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_tracing(config)
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
