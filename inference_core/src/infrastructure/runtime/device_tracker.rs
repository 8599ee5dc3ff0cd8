// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device Performance Tracker
//!
//! One tracker per device, recording a rolling window of inference outcomes
//! via [`DeviceHistory`] and deriving a composite performance score the
//! Fallback Coordinator uses for device-switching decisions.

use chrono::Duration;
use parking_lot::RwLock;

use inference_core_domain::entities::DeviceHistory;
use inference_core_domain::value_objects::PerformanceScore;

/// Minimum sample count the Fallback Coordinator requires before trusting a
/// `recent_performance` window for a switching decision.
pub const MIN_SAMPLES_FOR_SWITCHING: usize = 5;

pub struct DevicePerformanceTracker {
    history: RwLock<DeviceHistory>,
}

impl Default for DevicePerformanceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl DevicePerformanceTracker {
    pub fn new() -> Self {
        Self {
            history: RwLock::new(DeviceHistory::new()),
        }
    }

    pub fn record_inference(&self, latency_ms: f64, ok: bool, metadata: Option<String>) {
        self.history.write().record_inference(latency_ms, ok, metadata);
    }

    pub fn record_health(&self, level: inference_core_domain::entities::HealthLevel, message: impl Into<String>) {
        self.history.write().record_health(level, message);
    }

    pub fn performance_score(&self) -> PerformanceScore {
        self.history.read().performance_score()
    }

    /// `(success_rate, average_latency_ms)` over `window`, plus whether
    /// enough samples exist to trust the figures for a switching decision.
    pub fn recent_performance(&self, window: Duration) -> (f64, f64, bool) {
        let history = self.history.read();
        let (success_rate, average_latency) = history.recent_performance(window);
        let enough_samples = history.len() >= MIN_SAMPLES_FOR_SWITCHING;
        (success_rate, average_latency, enough_samples)
    }

    pub fn sample_count(&self) -> usize {
        self.history.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_minimum_samples_before_trusting_window() {
        let tracker = DevicePerformanceTracker::new();
        tracker.record_inference(10.0, true, None);
        let (_, _, enough) = tracker.recent_performance(Duration::minutes(5));
        assert!(!enough);

        for _ in 0..MIN_SAMPLES_FOR_SWITCHING {
            tracker.record_inference(10.0, true, None);
        }
        let (_, _, enough) = tracker.recent_performance(Duration::minutes(5));
        assert!(enough);
    }
}
