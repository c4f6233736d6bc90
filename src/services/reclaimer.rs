//! Periodic eviction of old sessions

use crate::services::metrics::ServerStats;
use crate::services::session::SessionRegistry;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// `tokio::time::interval` panics on a zero period
const MIN_INTERVAL: Duration = Duration::from_millis(1);

pub struct Reclaimer {
    sessions: Arc<SessionRegistry>,
    stats: Arc<ServerStats>,
    max_age: chrono::Duration,
    interval: Duration,
}

impl Reclaimer {
    pub fn new(
        sessions: Arc<SessionRegistry>,
        stats: Arc<ServerStats>,
        max_age: chrono::Duration,
        interval: Duration,
    ) -> Self {
        Self {
            sessions,
            stats,
            max_age,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// One eviction pass; a panic inside is logged and reported as zero evictions
    pub fn sweep(&self) -> usize {
        match catch_unwind(AssertUnwindSafe(|| self.sessions.evict_older_than(self.max_age))) {
            Ok(evicted) => {
                if evicted > 0 {
                    tracing::info!("🧹 Reclaimed {} stale sessions, {} remaining", evicted, self.sessions.len());
                } else {
                    tracing::debug!("[RECLAIM] Nothing to reclaim ({} sessions)", self.sessions.len());
                }
                self.stats.record_evicted(evicted);
                evicted
            }
            Err(_) => {
                tracing::error!("[RECLAIM] Sweep panicked, will retry next interval");
                0
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tracing::info!(
            "[RECLAIM] Sweeping every {:?}, max session age {}h",
            self.interval,
            self.max_age.num_hours()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}
