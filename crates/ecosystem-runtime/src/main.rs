//! # TokenHive Runtime Binary
//!
//! Boots the ecosystem with the platform catalog and the built-in unit
//! source, then stays resident until interrupted.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (from `HIVE_LOG_LEVEL` / `HIVE_SERVICE_NAME`)
//! 2. Load configuration (platform catalog + `HIVE_*` overrides)
//! 3. `init()` the ecosystem; a fatal startup error exits non-zero
//! 4. Log the status overview and wait for Ctrl+C
//! 5. Graceful teardown

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use ecosystem_runtime::collaborators::builtin_source;
use ecosystem_runtime::{EcosystemApp, EcosystemConfig};
use ecosystem_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    let _guard = init_telemetry(&telemetry).context("failed to initialize telemetry")?;

    let config = EcosystemConfig::from_env();
    let app = EcosystemApp::new(config, Arc::new(builtin_source()));

    info!("===========================================");
    info!("  TokenHive Ecosystem Runtime v0.1.0");
    info!("===========================================");

    app.init().await.context("ecosystem startup failed")?;
    app.wait_ready_default()
        .await
        .context("ecosystem did not become ready")?;
    app.log_status();

    info!("Ecosystem is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    app.teardown();
    info!("Shutdown complete");
    Ok(())
}
