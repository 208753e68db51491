//! Adaptive Cache - composition point
//!
//! Builds the cache, the temp-file cleaner and the resource monitor from the
//! environment, runs their background tasks and stops them on shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adaptive_cache::{
    spawn_sweep_task, Config, ResourceMonitor, SysinfoProbe, TempDirCleaner, TtlCache,
};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and start its expiry sweep
/// 4. Create the resource monitor and start its loop
/// 5. Wait for SIGINT/SIGTERM, then cancel both tasks and wait for them
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adaptive_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting adaptive cache");

    let config = Config::from_env();
    info!(
        environment = %config.environment,
        production = config.is_production(),
        max_entries = config.cache.max_entries,
        default_ttl_secs = config.cache.default_ttl.as_secs(),
        sweep_interval_secs = config.cache.sweep_interval.as_secs(),
        monitor_interval_secs = config.monitor.interval.as_secs(),
        disk_path = %config.monitor.disk_path.display(),
        "Configuration loaded"
    );

    let token = CancellationToken::new();

    let cache = Arc::new(TtlCache::<String>::from_config("default", &config.cache));
    let sweep_handle = spawn_sweep_task(cache.clone(), config.cache.sweep_interval, token.clone());

    let cleaner = Arc::new(TempDirCleaner::from_config(&config.cleaner));
    info!(
        temp_dir = %cleaner.dir().display(),
        max_age_secs = config.cleaner.max_age.as_secs(),
        "Temp file cleaner ready"
    );
    let monitor = Arc::new(
        ResourceMonitor::new(config.monitor.clone(), Arc::new(SysinfoProbe::new()), cleaner)
            .with_cache(cache.clone()),
    );
    let monitor_handle = monitor.start(token.clone());

    shutdown_signal().await?;
    token.cancel();

    let (sweep_result, monitor_result) = tokio::join!(sweep_handle, monitor_handle);
    for (task, result) in [
        ("expiry sweep", sweep_result),
        ("resource monitor", monitor_result),
    ] {
        if let Err(e) = result {
            error!(task, error = %e, "Background task ended abnormally");
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;

        tokio::select! {
            result = signal::ctrl_c() => {
                result.context("failed to install Ctrl+C handler")?;
                info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .context("failed to install Ctrl+C handler")?;
        info!("Received Ctrl+C, initiating shutdown...");
    }

    Ok(())
}
