// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Performance Score
//!
//! A normalized, device-comparable figure of merit in `[0.0, 1.0]` produced
//! by the Device Performance Tracker from a rolling window of latency/
//! throughput samples. Clamped at construction so downstream comparisons
//! never need to re-validate the range.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceScore(f64);

impl PerformanceScore {
    pub const MIN: PerformanceScore = PerformanceScore(0.0);
    pub const MAX: PerformanceScore = PerformanceScore(1.0);

    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Exponential moving average toward a new sample, same smoothing shape
    /// the Device Performance Tracker uses for latency/throughput blending.
    pub fn blend(&self, sample: f64, smoothing: f64) -> Self {
        let smoothing = smoothing.clamp(0.0, 1.0);
        Self::new(self.0 * (1.0 - smoothing) + sample.clamp(0.0, 1.0) * smoothing)
    }
}

impl Default for PerformanceScore {
    fn default() -> Self {
        Self::MIN
    }
}

impl PartialOrd for PerformanceScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(PerformanceScore::new(1.5).value(), 1.0);
        assert_eq!(PerformanceScore::new(-0.5).value(), 0.0);
    }

    #[test]
    fn blend_moves_toward_sample() {
        let score = PerformanceScore::new(0.5).blend(1.0, 0.5);
        assert_eq!(score.value(), 0.75);
    }
}
