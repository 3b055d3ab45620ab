//! Quota Monitor Task
//!
//! Background task that checks storage usage on a fixed interval and prunes
//! the chapter cache before writes start failing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::ChapterCache;

/// Runs one quota check against the chapter cache.
///
/// Evicts a quota batch and persists when usage is above the threshold.
/// Failures are logged and reported as zero evictions.
pub fn run_quota_check(chapters: &mut ChapterCache) -> usize {
    match chapters.relieve_pressure() {
        Ok(0) => {
            debug!("Quota check: usage below threshold");
            0
        }
        Ok(evicted) => {
            info!("Quota check: pruned {} chapters", evicted);
            evicted
        }
        Err(e) => {
            warn!("Quota check failed: {}", e);
            0
        }
    }
}

/// Spawns the periodic quota monitor.
///
/// The first check runs immediately, then one every `interval_secs`. Each
/// check holds the chapter cache's write lock from eviction through persist,
/// so it never interleaves with another writer.
///
/// # Example
/// ```ignore
/// let chapters = Arc::new(RwLock::new(ChapterCache::chapters(100, backend)));
/// let monitor = spawn_quota_monitor(chapters.clone(), 60);
/// // Later, during shutdown:
/// monitor.abort();
/// ```
pub fn spawn_quota_monitor(
    chapters: Arc<RwLock<ChapterCache>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    let period = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting quota monitor with interval of {} seconds",
            period.as_secs()
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let mut guard = chapters.write().await;
            run_quota_check(&mut guard);
        }
    })
}
