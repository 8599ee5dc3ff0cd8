// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics
//!
//! An internal atomics-plus-histogram metrics module exposing gauges,
//! counters, and latency histograms for device saturation, cache hit rate,
//! and queue depth. No external Prometheus exporter is wired by default,
//! but the shape mirrors one closely enough that wiring `prometheus`'s
//! `Encoder` over [`EngineMetrics::snapshot`] is a small follow-up, not a
//! redesign.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Fixed-bucket latency histogram in milliseconds. Buckets are upper
/// bounds; the last bucket is an implicit `+Inf` catch-all.
pub struct Histogram {
    bounds: Vec<f64>,
    counts: Vec<AtomicU64>,
    sum_millis: AtomicU64,
    total: AtomicU64,
}

impl Histogram {
    pub fn new(bounds: Vec<f64>) -> Self {
        let counts = (0..=bounds.len()).map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum_millis: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    pub fn default_latency_buckets() -> Self {
        Self::new(vec![1.0, 5.0, 10.0, 50.0, 100.0, 500.0, 1000.0, 5000.0])
    }

    pub fn observe(&self, value_ms: f64) {
        let bucket = self.bounds.iter().position(|&bound| value_ms <= bound).unwrap_or(self.bounds.len());
        self.counts[bucket].fetch_add(1, Ordering::Relaxed);
        self.sum_millis.fetch_add(value_ms.max(0.0) as u64, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn mean_ms(&self) -> f64 {
        let total = self.count();
        if total == 0 {
            0.0
        } else {
            self.sum_millis.load(Ordering::Relaxed) as f64 / total as f64
        }
    }

    /// Approximate percentile via linear bucket interpolation - adequate
    /// for the engine's own alerting, not a replacement for an exact
    /// `t-digest`.
    pub fn percentile(&self, p: f64) -> f64 {
        let total = self.count();
        if total == 0 {
            return 0.0;
        }
        let target = (total as f64 * p).ceil() as u64;
        let mut cumulative = 0u64;
        for (index, count) in self.counts.iter().enumerate() {
            cumulative += count.load(Ordering::Relaxed);
            if cumulative >= target {
                return self.bounds.get(index).copied().unwrap_or(*self.bounds.last().unwrap_or(&0.0));
            }
        }
        *self.bounds.last().unwrap_or(&0.0)
    }
}

#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, delta: u64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn set(&self, value: u64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub inference_submitted: u64,
    pub inference_completed: u64,
    pub inference_failed: u64,
    pub queue_depth: u64,
    pub device_saturation_percent: u64,
    pub cache_hit_rate_permille: u64,
    pub inference_latency_mean_ms: f64,
    pub inference_latency_p99_ms: f64,
}

/// Process-wide counters and gauges for the engine. Cheap to update from
/// any thread - every field is a lock-free atomic.
#[derive(Default)]
pub struct EngineMetrics {
    pub inference_submitted: Counter,
    pub inference_completed: Counter,
    pub inference_failed: Counter,
    pub queue_depth: Gauge,
    pub device_saturation_percent: Gauge,
    pub cache_hit_rate_permille: Gauge,
    pub inference_latency: OnceHistogram,
}

/// Lazily-built histogram so `EngineMetrics` can stay `Default`-derivable
/// without `Histogram` itself needing one (its bucket bounds are a
/// deliberate choice, not a sensible `Default`).
pub struct OnceHistogram(Histogram);

impl Default for OnceHistogram {
    fn default() -> Self {
        Self(Histogram::default_latency_buckets())
    }
}

impl std::ops::Deref for OnceHistogram {
    type Target = Histogram;
    fn deref(&self) -> &Histogram {
        &self.0
    }
}

impl EngineMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inference_submitted: self.inference_submitted.get(),
            inference_completed: self.inference_completed.get(),
            inference_failed: self.inference_failed.get(),
            queue_depth: self.queue_depth.get(),
            device_saturation_percent: self.device_saturation_percent.get(),
            cache_hit_rate_permille: self.cache_hit_rate_permille.get(),
            inference_latency_mean_ms: self.inference_latency.mean_ms(),
            inference_latency_p99_ms: self.inference_latency.percentile(0.99),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_and_gauge_update() {
        let counter = Counter::default();
        counter.increment();
        counter.add(4);
        assert_eq!(counter.get(), 5);

        let gauge = Gauge::default();
        gauge.set(42);
        assert_eq!(gauge.get(), 42);
    }

    #[test]
    fn histogram_mean_and_percentile_are_sane() {
        let histogram = Histogram::default_latency_buckets();
        for value in [1.0, 10.0, 10.0, 100.0] {
            histogram.observe(value);
        }
        assert_eq!(histogram.count(), 4);
        assert!(histogram.mean_ms() > 0.0);
        assert!(histogram.percentile(0.99) >= histogram.percentile(0.5));
    }

    #[test]
    fn engine_metrics_snapshot_reflects_updates() {
        let metrics = EngineMetrics::default();
        metrics.inference_submitted.increment();
        metrics.inference_latency.observe(25.0);
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.inference_submitted, 1);
        assert!(snapshot.inference_latency_mean_ms > 0.0);
    }
}
