// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device History
//!
//! A bounded rolling window of inference outcomes and health events for one
//! device. Append-only from the tracker's point of view; derived figures
//! (`success_rate`, `average_latency`, `performance_score`) are computed on
//! read rather than incrementally maintained, histogram-on-read style.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::value_objects::PerformanceScore;

/// Maximum number of inference records retained per device.
pub const MAX_RECORDS: usize = 1000;
/// Maximum number of health log entries retained per device.
pub const MAX_HEALTH_LOG: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthLevel {
    Critical,
    Warning,
    Unknown,
    Healthy,
}

impl HealthLevel {
    /// Multiplicative penalty applied to the raw performance score.
    fn penalty(&self) -> f64 {
        match self {
            HealthLevel::Critical => 0.1,
            HealthLevel::Warning => 0.5,
            HealthLevel::Unknown => 0.7,
            HealthLevel::Healthy => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRecord {
    pub timestamp: DateTime<Utc>,
    pub latency_ms: f64,
    pub ok: bool,
    pub metadata: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthLogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: HealthLevel,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceHistory {
    records: VecDeque<InferenceRecord>,
    health_log: VecDeque<HealthLogEntry>,
}

impl DeviceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_inference(&mut self, latency_ms: f64, ok: bool, metadata: Option<String>) {
        if self.records.len() >= MAX_RECORDS {
            self.records.pop_front();
        }
        self.records.push_back(InferenceRecord {
            timestamp: Utc::now(),
            latency_ms,
            ok,
            metadata,
        });
    }

    pub fn record_health(&mut self, level: HealthLevel, message: impl Into<String>) {
        if self.health_log.len() >= MAX_HEALTH_LOG {
            self.health_log.pop_front();
        }
        self.health_log.push_back(HealthLogEntry {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        });
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_rate(&self) -> f64 {
        if self.records.is_empty() {
            return 1.0;
        }
        let ok = self.records.iter().filter(|r| r.ok).count();
        ok as f64 / self.records.len() as f64
    }

    pub fn average_latency(&self) -> f64 {
        if self.records.is_empty() {
            return 0.0;
        }
        let total: f64 = self.records.iter().map(|r| r.latency_ms).sum();
        total / self.records.len() as f64
    }

    /// Returns `(success_rate, average_latency)` over the most recent
    /// records whose timestamp falls within `window` of now.
    pub fn recent_performance(&self, window: chrono::Duration) -> (f64, f64) {
        let cutoff = Utc::now() - window;
        let recent: Vec<&InferenceRecord> = self.records.iter().filter(|r| r.timestamp >= cutoff).collect();
        if recent.is_empty() {
            return (1.0, 0.0);
        }
        let ok = recent.iter().filter(|r| r.ok).count();
        let total_latency: f64 = recent.iter().map(|r| r.latency_ms).sum();
        (ok as f64 / recent.len() as f64, total_latency / recent.len() as f64)
    }

    fn current_health(&self) -> HealthLevel {
        match self.health_log.back() {
            Some(entry) => match entry.level {
                HealthLevel::Critical => HealthLevel::Critical,
                HealthLevel::Warning => HealthLevel::Warning,
                HealthLevel::Unknown => HealthLevel::Unknown,
                HealthLevel::Healthy => HealthLevel::Healthy,
            },
            None => HealthLevel::Healthy,
        }
    }

    /// Composite score combining success (70%), latency (30%, inverted and
    /// normalized against a 5 s ceiling), with a multiplicative health
    /// penalty.
    pub fn performance_score(&self) -> PerformanceScore {
        let success = self.success_rate();
        let latency_ms = self.average_latency();
        let latency_component = (1.0 - (latency_ms / 5000.0)).clamp(0.0, 1.0);
        let raw = success * 0.7 + latency_component * 0.3;
        PerformanceScore::new(raw * self.current_health().penalty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_neutral_score() {
        let history = DeviceHistory::new();
        assert_eq!(history.success_rate(), 1.0);
        assert_eq!(history.average_latency(), 0.0);
    }

    #[test]
    fn caps_at_max_records() {
        let mut history = DeviceHistory::new();
        for _ in 0..(MAX_RECORDS + 10) {
            history.record_inference(10.0, true, None);
        }
        assert_eq!(history.len(), MAX_RECORDS);
    }

    #[test]
    fn health_penalty_degrades_score() {
        let mut history = DeviceHistory::new();
        for _ in 0..10 {
            history.record_inference(10.0, true, None);
        }
        let healthy_score = history.performance_score().value();
        history.record_health(HealthLevel::Critical, "overheating");
        let degraded_score = history.performance_score().value();
        assert!(degraded_score < healthy_score);
    }

    #[test]
    fn failures_lower_success_rate() {
        let mut history = DeviceHistory::new();
        history.record_inference(10.0, true, None);
        history.record_inference(10.0, false, None);
        assert_eq!(history.success_rate(), 0.5);
    }
}
