//! # Offer Book Node
//!
//! Hosts one replicated offer book.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (logs + metrics registry)
//! 2. Load and validate configuration from the environment
//! 3. Build the event bus and reconciliation service
//! 4. Start the metrics handler
//! 5. Rebuild from `OB_SNAPSHOT_PATH`, if set
//! 6. Fold JSON-lines notifications from `OB_NOTIFICATIONS_PATH` (or stdin)
//!    until end of input or Ctrl+C
//! 7. Shut down and log the final book

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use node_runtime::{NodeConfig, NodeRuntime};
use ob_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_telemetry(&telemetry).context("Failed to initialize telemetry")?;

    let config = NodeConfig::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let runtime = Arc::new(NodeRuntime::new(config));
    runtime.start().await?;

    let ctrl_c = {
        let runtime = Arc::clone(&runtime);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received");
                runtime.request_shutdown();
            }
        })
    };

    info!("Node is running. Press Ctrl+C to stop.");
    let report = runtime.ingest().await?;
    ctrl_c.abort();

    runtime.shutdown().await;
    runtime.log_summary(&report);

    Ok(())
}
