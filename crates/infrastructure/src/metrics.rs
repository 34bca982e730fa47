//! Exchange counters and the processing-time distribution.
//!
//! One registry instance is constructed at startup and injected into the
//! relay server; clones share the same underlying atomics. Every field is
//! independent and commutative, so concurrent exchanges only ever issue
//! relaxed increments.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upper bucket bounds for the request-duration histogram, in seconds.
/// An implicit +Inf bucket catches everything beyond the last bound.
pub const DURATION_BUCKETS: [f64; 12] = [
    0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
];

#[derive(Clone)]
pub struct RelayMetrics {
    requests: Arc<AtomicU64>,

    succeeded: Arc<AtomicU64>,

    failed: Arc<AtomicU64>,

    total_duration_us: Arc<AtomicU64>,

    bucket_counts: Arc<[AtomicU64; DURATION_BUCKETS.len() + 1]>,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self {
            requests: Arc::new(AtomicU64::new(0)),
            succeeded: Arc::new(AtomicU64::new(0)),
            failed: Arc::new(AtomicU64::new(0)),
            total_duration_us: Arc::new(AtomicU64::new(0)),
            bucket_counts: Arc::new(std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// A non-empty query was read from a client.
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Exchange completed with the response written back.
    pub fn record_success(&self, duration: Duration) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.observe(duration);
    }

    /// Exchange ended without a response reaching the client.
    pub fn record_failure(&self, duration: Duration) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.observe(duration);
    }

    fn observe(&self, duration: Duration) {
        self.total_duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        let secs = duration.as_secs_f64();
        let idx = DURATION_BUCKETS
            .iter()
            .position(|bound| secs <= *bound)
            .unwrap_or(DURATION_BUCKETS.len());
        self.bucket_counts[idx].fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn success_rate(&self) -> f64 {
        let completed = self.succeeded() + self.failed();
        if completed == 0 {
            return 0.0;
        }
        self.succeeded() as f64 / completed as f64
    }

    pub fn avg_duration_ms(&self) -> f64 {
        let completed = self.succeeded() + self.failed();
        if completed == 0 {
            return 0.0;
        }
        self.total_duration_us.load(Ordering::Relaxed) as f64 / completed as f64 / 1000.0
    }

    /// Point-in-time copy for the HTTP exposure. Counters may keep moving
    /// while the snapshot is taken; each field is individually consistent.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut cumulative = Vec::with_capacity(DURATION_BUCKETS.len());
        let mut running = 0u64;
        for (i, bound) in DURATION_BUCKETS.iter().enumerate() {
            running += self.bucket_counts[i].load(Ordering::Relaxed);
            cumulative.push((*bound, running));
        }
        let count = running
            + self.bucket_counts[DURATION_BUCKETS.len()].load(Ordering::Relaxed);

        MetricsSnapshot {
            requests: self.requests(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            avg_duration_ms: self.avg_duration_ms(),
            duration_sum_seconds: self.total_duration_us.load(Ordering::Relaxed) as f64
                / 1_000_000.0,
            duration_count: count,
            duration_buckets: cumulative,
        }
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendered view of the registry at one instant.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub avg_duration_ms: f64,
    pub duration_sum_seconds: f64,
    /// Cumulative counts per bucket bound, +Inf excluded.
    pub duration_buckets: Vec<(f64, u64)>,
    /// Total observations, +Inf included.
    pub duration_count: u64,
}
