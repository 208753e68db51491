//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::TtlCache;
use crate::tasks::MIN_PERIOD;

// == Sweep Task ==
/// Spawns a background task that periodically sweeps expired entries.
///
/// The first sweep runs one `interval` after spawning. The task exits when
/// `token` is cancelled. A panic during a single sweep is logged and the
/// schedule continues.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TtlCache::<String>::new("pages", 1000, Duration::from_secs(300)));
/// let token = CancellationToken::new();
/// let handle = spawn_sweep_task(cache.clone(), Duration::from_secs(60), token.clone());
/// // Later, during shutdown:
/// token.cancel();
/// handle.await?;
/// ```
pub fn spawn_sweep_task<V>(
    cache: Arc<TtlCache<V>>,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    let interval = interval.max(MIN_PERIOD);

    tokio::spawn(async move {
        info!(
            cache = cache.name(),
            interval_secs = interval.as_secs_f64(),
            "Starting expiry sweep task"
        );

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!(cache = cache.name(), "Expiry sweep task stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match catch_unwind(AssertUnwindSafe(|| cache.sweep_expired())) {
                Ok(0) => debug!(cache = cache.name(), "Expiry sweep: no expired entries found"),
                Ok(removed) => {
                    info!(cache = cache.name(), removed, "Expiry sweep: removed expired entries")
                }
                Err(_) => error!(cache = cache.name(), "Expiry sweep panicked, continuing"),
            }
        }
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn cache() -> Arc<TtlCache<String>> {
        Arc::new(TtlCache::new("sweep", 100, Duration::from_secs(300)))
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let cache = cache();
        cache.set("expire_soon", "value".to_string(), Some(Duration::from_millis(30)));

        let token = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(50), token.clone());

        tokio::time::sleep(Duration::from_millis(200)).await;

        // Removed by the sweep, not by a lazy get
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().expirations, 1);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let cache = cache();
        cache.set("long_lived", "value".to_string(), Some(Duration::from_secs(3600)));

        let token = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20), token.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(cache.get("long_lived"), Some("value".to_string()));

        token.cancel();
        handle.await.unwrap();
    }

    /// Value whose drop panics once after being armed.
    #[derive(Clone)]
    struct PanicOnDrop {
        armed: Arc<AtomicBool>,
    }

    impl PanicOnDrop {
        fn new() -> Self {
            Self {
                armed: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl Drop for PanicOnDrop {
        fn drop(&mut self) {
            if self.armed.swap(false, Ordering::SeqCst) {
                panic!("value drop failed");
            }
        }
    }

    #[tokio::test]
    async fn test_sweep_task_survives_panicking_sweep() {
        let cache = Arc::new(TtlCache::new("fragile", 100, Duration::from_secs(300)));

        let bomb = PanicOnDrop::new();
        let armed = Arc::clone(&bomb.armed);
        cache.set("bomb", bomb, Some(Duration::from_millis(10)));
        armed.store(true, Ordering::SeqCst);

        let token = CancellationToken::new();
        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(30), token.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;

        // The panicking sweep ran and the task is still scheduled
        assert!(!armed.load(Ordering::SeqCst));
        assert!(!handle.is_finished());

        cache.set("later", PanicOnDrop::new(), Some(Duration::from_millis(10)));
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.is_empty());
        assert_eq!(cache.stats().expirations, 1);
        assert!(!handle.is_finished());

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_sweep_task_stops_on_cancel() {
        let token = CancellationToken::new();
        let handle = spawn_sweep_task(cache(), Duration::from_secs(60), token.clone());

        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sweep task should stop promptly")
            .unwrap();
    }
}
