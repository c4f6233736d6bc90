//! Process-wide counters surfaced by the status endpoint

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

pub struct ServerStats {
    connected_clients: AtomicUsize,
    sessions_started: AtomicUsize,
    sessions_ended: AtomicUsize,
    frames_processed: AtomicUsize,
    frames_degraded: AtomicUsize,
    publishes_sent: AtomicUsize,
    publishes_failed: AtomicUsize,
    sessions_evicted: AtomicUsize,
    start_time: Instant,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            connected_clients: AtomicUsize::new(0),
            sessions_started: AtomicUsize::new(0),
            sessions_ended: AtomicUsize::new(0),
            frames_processed: AtomicUsize::new(0),
            frames_degraded: AtomicUsize::new(0),
            publishes_sent: AtomicUsize::new(0),
            publishes_failed: AtomicUsize::new(0),
            sessions_evicted: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Count a client as connected until the returned guard drops
    pub fn connect(self: &Arc<Self>) -> ConnectionGuard {
        self.connected_clients.fetch_add(1, Ordering::Relaxed);
        ConnectionGuard { stats: Arc::clone(self) }
    }

    pub fn connected_clients(&self) -> usize {
        self.connected_clients.load(Ordering::Relaxed)
    }

    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_ended(&self) {
        self.sessions_ended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_frame(&self, degraded: bool) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        if degraded {
            self.frames_degraded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_publish(&self, ok: bool) {
        let counter = if ok { &self.publishes_sent } else { &self.publishes_failed };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_evicted(&self, count: usize) {
        self.sessions_evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connected_clients: self.connected_clients(),
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            sessions_ended: self.sessions_ended.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            frames_degraded: self.frames_degraded.load(Ordering::Relaxed),
            publishes_sent: self.publishes_sent.load(Ordering::Relaxed),
            publishes_failed: self.publishes_failed.load(Ordering::Relaxed),
            sessions_evicted: self.sessions_evicted.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ConnectionGuard {
    stats: Arc<ServerStats>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.stats.connected_clients.fetch_sub(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub connected_clients: usize,
    pub sessions_started: usize,
    pub sessions_ended: usize,
    pub frames_processed: usize,
    pub frames_degraded: usize,
    pub publishes_sent: usize,
    pub publishes_failed: usize,
    pub sessions_evicted: usize,
    pub uptime_seconds: u64,
}
