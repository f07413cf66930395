//! Prometheus metrics for the offer book node.
//!
//! All metrics follow the naming convention: `ob_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., ob_rebuilds_total)
//! - **Gauge**: Value that can go up or down (e.g., ob_offers_live)
//! - **Histogram**: Distribution of values (e.g., ob_rebuild_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // LIVE SET
    // =========================================================================

    /// Offers currently live
    pub static ref OFFERS_LIVE: Gauge = Gauge::new(
        "ob_offers_live",
        "Number of offers in the live set"
    ).expect("metric creation failed");

    /// Live offers by market currency and direction
    pub static ref OFFERS_BY_CURRENCY: GaugeVec = GaugeVec::new(
        Opts::new("ob_offers_by_currency", "Live offers by market currency and direction"),
        &["currency", "direction"]
    ).expect("metric creation failed");

    /// Folded mutations by outcome
    pub static ref OFFER_MUTATIONS: CounterVec = CounterVec::new(
        Opts::new("ob_offer_mutations_total", "Folded storage notifications by outcome"),
        &["outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // REBUILD
    // =========================================================================

    /// Completed rebuilds
    pub static ref REBUILDS: Counter = Counter::new(
        "ob_rebuilds_total",
        "Total number of full rebuilds"
    ).expect("metric creation failed");

    /// Entries skipped as malformed during rebuilds
    pub static ref REBUILD_SKIPPED_ENTRIES: Counter = Counter::new(
        "ob_rebuild_skipped_entries_total",
        "Malformed entries skipped during rebuilds"
    ).expect("metric creation failed");

    /// Rebuild duration, pull included
    pub static ref REBUILD_DURATION: Histogram = Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "ob_rebuild_duration_seconds",
            "Time spent pulling and replaying a full snapshot"
        ).buckets(exponential_buckets(0.0005, 2.0, 14).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT BUS
    // =========================================================================

    /// Messages received via event bus
    pub static ref EVENT_BUS_MESSAGES_RECEIVED: CounterVec = CounterVec::new(
        Opts::new("ob_eventbus_messages_received_total", "Messages received from event bus"),
        &["topic"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if a metric is already registered.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Live set
        Box::new(OFFERS_LIVE.clone()),
        Box::new(OFFERS_BY_CURRENCY.clone()),
        Box::new(OFFER_MUTATIONS.clone()),
        // Rebuild
        Box::new(REBUILDS.clone()),
        Box::new(REBUILD_SKIPPED_ENTRIES.clone()),
        Box::new(REBUILD_DURATION.clone()),
        // Event Bus
        Box::new(EVENT_BUS_MESSAGES_RECEIVED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        self.histogram.observe(duration);
    }
}

/// Start timing for a histogram. Observation happens on drop.
#[macro_export]
macro_rules! time_histogram {
    ($histogram:expr) => {
        $crate::metrics::HistogramTimer::new(&$histogram)
    };
}
