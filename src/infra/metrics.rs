//! Lock-free batch metrics
//!
//! Counters are updated from store tasks with atomics; `report()` takes a
//! snapshot. All atomics use Relaxed ordering: these are statistical counters
//! only and must not be used for coordination.

use crate::error::DropReason;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

pub struct Metrics {
    /// Batches completed (monotonic)
    batches_total: AtomicU64,
    /// Stores handed to the coordinator (monotonic)
    stores_dispatched: AtomicU64,
    /// Stores that produced an enriched result (monotonic)
    stores_scored: AtomicU64,
    dropped_county_unresolved: AtomicU64,
    dropped_severity_unavailable: AtomicU64,
    dropped_timed_out: AtomicU64,
    dropped_deadline: AtomicU64,
    dropped_task_failed: AtomicU64,
    /// Underlying county severity lookups
    county_lookups: AtomicU64,
    /// County scores served from the batch cache
    county_cache_hits: AtomicU64,
    /// Sum of batch latencies in microseconds
    batch_latency_sum_us: AtomicU64,
    /// Max batch latency in microseconds
    batch_latency_max_us: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            batches_total: AtomicU64::new(0),
            stores_dispatched: AtomicU64::new(0),
            stores_scored: AtomicU64::new(0),
            dropped_county_unresolved: AtomicU64::new(0),
            dropped_severity_unavailable: AtomicU64::new(0),
            dropped_timed_out: AtomicU64::new(0),
            dropped_deadline: AtomicU64::new(0),
            dropped_task_failed: AtomicU64::new(0),
            county_lookups: AtomicU64::new(0),
            county_cache_hits: AtomicU64::new(0),
            batch_latency_sum_us: AtomicU64::new(0),
            batch_latency_max_us: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_dispatched(&self, count: usize) {
        self.stores_dispatched.fetch_add(count as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scored(&self) {
        self.stores_scored.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_dropped(&self, reason: &DropReason) {
        let counter = match reason {
            DropReason::CountyUnresolved(_) => &self.dropped_county_unresolved,
            DropReason::SeverityUnavailable(_) => &self.dropped_severity_unavailable,
            DropReason::TimedOut => &self.dropped_timed_out,
            DropReason::DeadlineExceeded => &self.dropped_deadline,
            DropReason::TaskFailed(_) => &self.dropped_task_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_county_cache(&self, lookups: u64, hits: u64) {
        self.county_lookups.fetch_add(lookups, Ordering::Relaxed);
        self.county_cache_hits.fetch_add(hits, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch(&self, latency_us: u64) {
        self.batches_total.fetch_add(1, Ordering::Relaxed);
        self.batch_latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.batch_latency_max_us, latency_us);
    }

    pub fn stores_scored(&self) -> u64 {
        self.stores_scored.load(Ordering::Relaxed)
    }

    pub fn stores_dropped(&self) -> u64 {
        self.dropped_county_unresolved.load(Ordering::Relaxed)
            + self.dropped_severity_unavailable.load(Ordering::Relaxed)
            + self.dropped_timed_out.load(Ordering::Relaxed)
            + self.dropped_deadline.load(Ordering::Relaxed)
            + self.dropped_task_failed.load(Ordering::Relaxed)
    }

    /// Snapshot all counters
    pub fn report(&self) -> MetricsSummary {
        let batches_total = self.batches_total.load(Ordering::Relaxed);
        let latency_sum = self.batch_latency_sum_us.load(Ordering::Relaxed);

        MetricsSummary {
            batches_total,
            stores_dispatched: self.stores_dispatched.load(Ordering::Relaxed),
            stores_scored: self.stores_scored(),
            stores_dropped: self.stores_dropped(),
            dropped_county_unresolved: self.dropped_county_unresolved.load(Ordering::Relaxed),
            dropped_severity_unavailable: self
                .dropped_severity_unavailable
                .load(Ordering::Relaxed),
            dropped_timed_out: self.dropped_timed_out.load(Ordering::Relaxed),
            dropped_deadline: self.dropped_deadline.load(Ordering::Relaxed),
            dropped_task_failed: self.dropped_task_failed.load(Ordering::Relaxed),
            county_lookups: self.county_lookups.load(Ordering::Relaxed),
            county_cache_hits: self.county_cache_hits.load(Ordering::Relaxed),
            avg_batch_latency_us: if batches_total > 0 { latency_sum / batches_total } else { 0 },
            max_batch_latency_us: self.batch_latency_max_us.load(Ordering::Relaxed),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSummary {
    pub batches_total: u64,
    pub stores_dispatched: u64,
    pub stores_scored: u64,
    pub stores_dropped: u64,
    pub dropped_county_unresolved: u64,
    pub dropped_severity_unavailable: u64,
    pub dropped_timed_out: u64,
    pub dropped_deadline: u64,
    pub dropped_task_failed: u64,
    pub county_lookups: u64,
    pub county_cache_hits: u64,
    pub avg_batch_latency_us: u64,
    pub max_batch_latency_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            batches = %self.batches_total,
            dispatched = %self.stores_dispatched,
            scored = %self.stores_scored,
            dropped = %self.stores_dropped,
            county_unresolved = %self.dropped_county_unresolved,
            severity_unavailable = %self.dropped_severity_unavailable,
            timed_out = %self.dropped_timed_out,
            deadline_exceeded = %self.dropped_deadline,
            task_failed = %self.dropped_task_failed,
            county_lookups = %self.county_lookups,
            county_cache_hits = %self.county_cache_hits,
            avg_batch_us = %self.avg_batch_latency_us,
            max_batch_us = %self.max_batch_latency_us,
            "metrics"
        );
    }
}
