//! Oracle metrics collection.
//!
//! Lock-free counters updated on the request path and read by the stats
//! reporter.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════════════════════════
// COUNTER METRIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Simple atomic counter for high-frequency metrics
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
    name: &'static str,
}

impl Counter {
    /// Create new counter
    pub const fn new(name: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
        }
    }

    /// Increment counter
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to counter
    pub fn add(&self, n: u64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Get current value
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Get name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GAUGE METRIC
// ═══════════════════════════════════════════════════════════════════════════════

/// Gauge for values that can go up or down
#[derive(Debug)]
pub struct Gauge {
    value: AtomicU64,
    name: &'static str,
}

impl Gauge {
    /// Create new gauge
    pub const fn new(name: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
        }
    }

    /// Get current value
    pub fn value(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Increment gauge
    pub fn increment(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement gauge, saturating at zero
    pub fn decrement(&self) {
        let _ = self
            .value
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |v| Some(v.saturating_sub(1)));
    }

    /// Get name
    pub fn name(&self) -> &'static str {
        self.name
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ORACLE METRICS
// ═══════════════════════════════════════════════════════════════════════════════

/// Request and upstream counters for one oracle instance
#[derive(Debug)]
pub struct OracleMetrics {
    /// `get_price_data` calls
    pub requests: Counter,
    /// Calls that returned a reading
    pub served: Counter,
    /// Calls answered from a fresh cache entry
    pub cache_hits: Counter,
    /// Calls answered from an expired entry after every source failed
    pub stale_served: Counter,
    /// Upstream fetch rounds started
    pub upstream_fetches: Counter,
    /// Upstream fetch rounds that produced nothing
    pub upstream_failures: Counter,
    /// Upstream fetch rounds currently running
    pub in_flight: Gauge,
    latency_total_us: Counter,
    latency_samples: Counter,
    started: Instant,
}

impl OracleMetrics {
    /// Create a zeroed collector
    pub fn new() -> Self {
        Self {
            requests: Counter::new("oracle_requests_total"),
            served: Counter::new("oracle_served_total"),
            cache_hits: Counter::new("oracle_cache_hits_total"),
            stale_served: Counter::new("oracle_stale_served_total"),
            upstream_fetches: Counter::new("oracle_upstream_fetches_total"),
            upstream_failures: Counter::new("oracle_upstream_failures_total"),
            in_flight: Gauge::new("oracle_upstream_in_flight"),
            latency_total_us: Counter::new("oracle_upstream_latency_us_total"),
            latency_samples: Counter::new("oracle_upstream_latency_samples"),
            started: Instant::now(),
        }
    }

    /// Mark the start of an upstream fetch round
    pub fn upstream_started(&self) -> Instant {
        self.upstream_fetches.increment();
        self.in_flight.increment();
        Instant::now()
    }

    /// Record the end of an upstream fetch round begun at `started`
    pub fn upstream_finished(&self, started: Instant, success: bool) {
        self.in_flight.decrement();
        self.record_latency(started.elapsed());
        if !success {
            self.upstream_failures.increment();
        }
    }

    /// Record one upstream round-trip
    pub fn record_latency(&self, latency: Duration) {
        self.latency_total_us.add(latency.as_micros() as u64);
        self.latency_samples.increment();
    }

    /// Mean upstream latency, `None` before the first sample
    pub fn average_latency(&self) -> Option<Duration> {
        let samples = self.latency_samples.value();
        if samples == 0 {
            return None;
        }
        Some(Duration::from_micros(self.latency_total_us.value() / samples))
    }

    /// Collector uptime
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Current value of each public counter and gauge, by metric name
    pub fn values(&self) -> Vec<(&'static str, u64)> {
        let counters = [
            &self.requests,
            &self.served,
            &self.cache_hits,
            &self.stale_served,
            &self.upstream_fetches,
            &self.upstream_failures,
        ];

        counters
            .iter()
            .map(|counter| (counter.name(), counter.value()))
            .chain(std::iter::once((self.in_flight.name(), self.in_flight.value())))
            .collect()
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.requests.value(),
            served: self.served.value(),
            cache_hits: self.cache_hits.value(),
            stale_served: self.stale_served.value(),
            upstream_fetches: self.upstream_fetches.value(),
            upstream_failures: self.upstream_failures.value(),
            in_flight: self.in_flight.value(),
            average_latency_ms: self.average_latency().map(|d| d.as_secs_f64() * 1000.0),
            uptime_seconds: self.uptime().as_secs(),
        }
    }
}

impl Default for OracleMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METRICS SNAPSHOT
// ═══════════════════════════════════════════════════════════════════════════════

/// Snapshot of all oracle counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// `get_price_data` calls
    pub requests: u64,
    /// Calls that returned a reading
    pub served: u64,
    /// Fresh cache hits
    pub cache_hits: u64,
    /// Stale readings served
    pub stale_served: u64,
    /// Upstream fetch rounds
    pub upstream_fetches: u64,
    /// Upstream rounds with no reading
    pub upstream_failures: u64,
    /// Upstream rounds running right now
    pub in_flight: u64,
    /// Mean upstream latency in milliseconds
    pub average_latency_ms: Option<f64>,
    /// Collector uptime in seconds
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Share of requests that produced a reading (percent, 100 with no traffic)
    pub fn availability_pct(&self) -> f64 {
        if self.requests == 0 {
            return 100.0;
        }
        self.served as f64 / self.requests as f64 * 100.0
    }

    /// Share of requests answered from the cache (percent)
    pub fn cache_hit_pct(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / self.requests as f64 * 100.0
    }
}
