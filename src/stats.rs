//! In-memory request counters.
//!
//! Best effort and process-local: counts reset on restart and are never
//! persisted. The total is a lock-free atomic; the per-route breakdown sits
//! behind a mutex that is held only for a single map update.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::time::Instant;

#[derive(Debug)]
pub struct Stats {
    started: Instant,
    total: AtomicU64,
    per_route: Mutex<BTreeMap<String, u64>>,
}

/// Point-in-time view of [`Stats`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub uptime_seconds: f64,
    pub endpoints: BTreeMap<String, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            total: AtomicU64::new(0),
            per_route: Mutex::new(BTreeMap::new()),
        }
    }

    /// Counts one request against `route`.
    pub fn record(&self, route: &str) {
        self.total.fetch_add(1, Ordering::Relaxed);
        // A poisoned map only means another thread panicked mid-insert; the
        // counts are still usable.
        let mut per_route = self.per_route.lock().unwrap_or_else(|e| e.into_inner());
        *per_route.entry(route.to_owned()).or_default() += 1;
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let endpoints = self.per_route.lock().unwrap_or_else(|e| e.into_inner()).clone();
        StatsSnapshot {
            total_requests: self.total(),
            uptime_seconds: round_millis(self.started.elapsed().as_secs_f64()),
            endpoints,
        }
    }
}

impl Default for Stats {
    fn default() -> Self { Self::new() }
}

/// Rounds seconds to millisecond precision for display.
pub(crate) fn round_millis(seconds: f64) -> f64 {
    (seconds * 1000.0).round() / 1000.0
}
