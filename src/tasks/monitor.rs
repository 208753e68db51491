//! Resource Monitor Task
//!
//! Drives [`ResourceMonitor::tick`] on a fixed period.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::monitor::ResourceMonitor;
use crate::tasks::MIN_PERIOD;

// == Monitor Task ==
/// Spawns the monitor loop.
///
/// Each tick runs in its own task so that an error or a panic inside one
/// tick is logged and the next tick still runs on schedule. Late ticks are
/// delayed rather than fired in a burst. The loop exits when `token` is
/// cancelled; a tick still in flight at that point is aborted.
pub fn spawn_monitor_task(monitor: Arc<ResourceMonitor>, token: CancellationToken) -> JoinHandle<()> {
    let period = monitor.config().interval.max(MIN_PERIOD);

    tokio::spawn(async move {
        info!(
            interval_secs = period.as_secs_f64(),
            disk_path = %monitor.config().disk_path.display(),
            "Starting resource monitor"
        );

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Resource monitor stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let tick_monitor = Arc::clone(&monitor);
            let mut tick = tokio::spawn(async move { tick_monitor.tick().await });

            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    tick.abort();
                    info!("Resource monitor stopped mid-tick");
                    break;
                }
                outcome = &mut tick => outcome,
            };

            match outcome {
                Ok(Ok(report)) => debug!(actions = ?report.actions, "Resource monitor tick complete"),
                Ok(Err(e)) => error!(error = %e, "Resource monitor tick failed"),
                Err(e) => error!(error = %e, "Resource monitor tick panicked"),
            }
        }
    })
}
