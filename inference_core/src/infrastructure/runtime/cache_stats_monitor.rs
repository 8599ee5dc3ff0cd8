// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cache Statistics Monitor
//!
//! Consumes [`CacheEvent`]s from every tier's channel, maintains per-tier
//! counters, retains historical hit-rate samples up to `retention_period`,
//! and derives trend/alert signals, using the same atomic-counter-plus-
//! derived-rate shape as the engine's latency histograms.

use std::collections::HashMap;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use crossbeam::channel::Receiver;
use parking_lot::RwLock;
use serde::Serialize;

use inference_core_domain::events::CacheEvent;
use inference_core_domain::value_objects::CacheTierId;

#[derive(Debug, Clone, Copy, Default)]
struct TierCounters {
    hits: u64,
    misses: u64,
    errors: u64,
    sets: u64,
    total_latency_ms: f64,
}

impl TierCounters {
    fn requests(&self) -> u64 {
        self.hits + self.misses
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheTierStats {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub requests: u64,
    pub hit_rate: f64,
    pub error_rate: f64,
    pub average_latency_ms: f64,
    pub cache_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertSeverity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub tier: CacheTierId,
    pub severity: AlertSeverity,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
struct HistoricalSample {
    at: DateTime<Utc>,
    hit_rate: f64,
}

#[derive(Debug, Clone)]
pub struct AlertThresholds {
    pub min_hit_rate: f64,
    pub max_latency_ms: f64,
    pub max_error_rate: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            min_hit_rate: 0.7,
            max_latency_ms: 1000.0,
            max_error_rate: 0.05,
        }
    }
}

pub struct CacheStatisticsMonitor {
    counters: RwLock<HashMap<CacheTierId, TierCounters>>,
    history: RwLock<HashMap<CacheTierId, Vec<HistoricalSample>>>,
    retention: Duration,
    thresholds: AlertThresholds,
    sizes: RwLock<HashMap<CacheTierId, usize>>,
}

impl CacheStatisticsMonitor {
    pub fn new(thresholds: AlertThresholds) -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            history: RwLock::new(HashMap::new()),
            retention: Duration::hours(24),
            thresholds,
            sizes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_retention(mut self, retention: StdDuration) -> Self {
        self.retention = Duration::from_std(retention).unwrap_or(Duration::hours(24));
        self
    }

    /// Drains everything currently buffered on `receiver` into this
    /// tier's counters. Intended to be called by the shared timer wheel or
    /// inline after each cache operation.
    pub fn drain(&self, tier: CacheTierId, receiver: &Receiver<CacheEvent>) {
        while let Ok(event) = receiver.try_recv() {
            self.record(event);
        }
        let _ = tier;
    }

    pub fn record(&self, event: CacheEvent) {
        let tier = event.tier();
        let mut counters = self.counters.write();
        let entry = counters.entry(tier).or_default();
        match event {
            CacheEvent::Hit { latency_ms, .. } => {
                entry.hits += 1;
                entry.total_latency_ms += latency_ms;
            }
            CacheEvent::Miss { latency_ms, .. } => {
                entry.misses += 1;
                entry.total_latency_ms += latency_ms;
            }
            CacheEvent::Set { .. } => entry.sets += 1,
            CacheEvent::Error { .. } => entry.errors += 1,
        }
    }

    pub fn set_cache_size(&self, tier: CacheTierId, size: usize) {
        self.sizes.write().insert(tier, size);
    }

    pub fn snapshot(&self, tier: CacheTierId) -> CacheTierStats {
        let counters = self.counters.read();
        let counters = counters.get(&tier).copied().unwrap_or_default();
        let requests = counters.requests();
        let hit_rate = if requests == 0 { 0.0 } else { counters.hits as f64 / requests as f64 };
        let total_ops = requests + counters.errors;
        let error_rate = if total_ops == 0 { 0.0 } else { counters.errors as f64 / total_ops as f64 };
        let average_latency_ms = if requests == 0 { 0.0 } else { counters.total_latency_ms / requests as f64 };
        CacheTierStats {
            hits: counters.hits,
            misses: counters.misses,
            errors: counters.errors,
            requests,
            hit_rate,
            error_rate,
            average_latency_ms,
            cache_size: self.sizes.read().get(&tier).copied().unwrap_or(0),
        }
    }

    /// Appends the current hit rate as a historical sample, pruning
    /// samples older than `retention_period`. Intended to be driven by the
    /// shared timer wheel.
    pub fn sample_now(&self, tier: CacheTierId) {
        let hit_rate = self.snapshot(tier).hit_rate;
        let now = Utc::now();
        let mut history = self.history.write();
        let samples = history.entry(tier).or_default();
        samples.push(HistoricalSample { at: now, hit_rate });
        let cutoff = now - self.retention;
        samples.retain(|sample| sample.at >= cutoff);
    }

    /// Relative change in hit rate between the oldest and newest retained
    /// sample; `|change| > 5%` is classified increasing/decreasing.
    pub fn trend(&self, tier: CacheTierId) -> Trend {
        let history = self.history.read();
        let Some(samples) = history.get(&tier) else {
            return Trend::Stable;
        };
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Trend::Stable;
        };
        if first.hit_rate.abs() < f64::EPSILON {
            return Trend::Stable;
        }
        let change = (last.hit_rate - first.hit_rate) / first.hit_rate;
        if change > 0.05 {
            Trend::Increasing
        } else if change < -0.05 {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }

    pub fn alerts(&self, tier: CacheTierId) -> Vec<Alert> {
        let stats = self.snapshot(tier);
        let mut alerts = Vec::new();
        if stats.requests > 0 && stats.hit_rate < self.thresholds.min_hit_rate {
            alerts.push(Alert {
                tier,
                severity: AlertSeverity::Warning,
                message: format!("hit rate {:.2} below threshold {:.2}", stats.hit_rate, self.thresholds.min_hit_rate),
            });
        }
        if stats.average_latency_ms > self.thresholds.max_latency_ms {
            alerts.push(Alert {
                tier,
                severity: AlertSeverity::Warning,
                message: format!(
                    "average latency {:.1}ms above threshold {:.1}ms",
                    stats.average_latency_ms, self.thresholds.max_latency_ms
                ),
            });
        }
        if stats.error_rate > self.thresholds.max_error_rate {
            alerts.push(Alert {
                tier,
                severity: AlertSeverity::Critical,
                message: format!("error rate {:.3} above threshold {:.3}", stats.error_rate, self.thresholds.max_error_rate),
            });
        }
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core_domain::value_objects::ChunkKey;

    fn hit(tier: CacheTierId) -> CacheEvent {
        CacheEvent::Hit {
            key: ChunkKey::new("doc-1", 0),
            tier,
            latency_ms: 5.0,
        }
    }

    fn miss(tier: CacheTierId) -> CacheEvent {
        CacheEvent::Miss {
            key: ChunkKey::new("doc-1", 0),
            tier,
            latency_ms: 5.0,
        }
    }

    #[test]
    fn hit_rate_derives_from_counters() {
        let monitor = CacheStatisticsMonitor::new(AlertThresholds::default());
        monitor.record(hit(CacheTierId::L1));
        monitor.record(hit(CacheTierId::L1));
        monitor.record(miss(CacheTierId::L1));
        let stats = monitor.snapshot(CacheTierId::L1);
        assert!((stats.hit_rate - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn low_hit_rate_raises_warning_alert() {
        let monitor = CacheStatisticsMonitor::new(AlertThresholds::default());
        for _ in 0..10 {
            monitor.record(miss(CacheTierId::L2));
        }
        monitor.record(hit(CacheTierId::L2));
        let alerts = monitor.alerts(CacheTierId::L2);
        assert!(alerts.iter().any(|a| a.severity == AlertSeverity::Warning));
    }

    #[test]
    fn trend_is_stable_with_one_sample() {
        let monitor = CacheStatisticsMonitor::new(AlertThresholds::default());
        monitor.record(hit(CacheTierId::L1));
        monitor.sample_now(CacheTierId::L1);
        assert_eq!(monitor.trend(CacheTierId::L1), Trend::Stable);
    }
}
