// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Feature Record
//!
//! A named, independently degradable feature tracked by the Graceful
//! Degradation Manager, with an embedded circuit breaker. The breaker's
//! state machine is the textbook closed/open/half-open shape; timing
//! (cooldown, threshold) is supplied by the manager's configuration, not
//! hardcoded here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureStatus {
    Healthy,
    Degraded,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreaker {
    state: BreakerState,
    failure_count: u32,
    threshold: u32,
    opened_at: Option<DateTime<Utc>>,
    cooldown: chrono::Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: chrono::Duration) -> Self {
        Self {
            state: BreakerState::Closed,
            failure_count: 0,
            threshold,
            opened_at: None,
            cooldown,
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    /// Transitions `open -> half_open` once the cooldown has elapsed, then
    /// returns whether calls should currently be allowed through.
    pub fn poll(&mut self) -> bool {
        if self.state == BreakerState::Open {
            if let Some(opened_at) = self.opened_at {
                if Utc::now() - opened_at >= self.cooldown {
                    self.state = BreakerState::HalfOpen;
                }
            }
        }
        self.state != BreakerState::Open
    }

    pub fn record_success(&mut self) {
        self.state = BreakerState::Closed;
        self.failure_count = 0;
        self.opened_at = None;
    }

    pub fn record_failure(&mut self) {
        self.failure_count += 1;
        if self.state == BreakerState::HalfOpen || self.failure_count >= self.threshold {
            self.state = BreakerState::Open;
            self.opened_at = Some(Utc::now());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    name: String,
    status: FeatureStatus,
    enabled: bool,
    error_count: u64,
    circuit_breaker: CircuitBreaker,
}

impl FeatureRecord {
    pub fn new(name: impl Into<String>, threshold: u32, cooldown: chrono::Duration) -> Self {
        Self {
            name: name.into(),
            status: FeatureStatus::Unknown,
            enabled: true,
            error_count: 0,
            circuit_breaker: CircuitBreaker::new(threshold, cooldown),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> FeatureStatus {
        self.status
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn breaker_mut(&mut self) -> &mut CircuitBreaker {
        &mut self.circuit_breaker
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    pub fn record_success(&mut self) {
        self.circuit_breaker.record_success();
        self.status = FeatureStatus::Healthy;
    }

    pub fn record_failure(&mut self) {
        self.error_count += 1;
        self.circuit_breaker.record_failure();
        self.status = FeatureStatus::Degraded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breaker_opens_after_threshold() {
        let mut breaker = CircuitBreaker::new(3, chrono::Duration::seconds(60));
        for _ in 0..2 {
            breaker.record_failure();
            assert_eq!(breaker.state(), BreakerState::Closed);
        }
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn breaker_closes_on_success_from_half_open() {
        let mut breaker = CircuitBreaker::new(1, chrono::Duration::seconds(0));
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
        assert!(breaker.poll());
        assert_eq!(breaker.state(), BreakerState::HalfOpen);
        breaker.record_success();
        assert_eq!(breaker.state(), BreakerState::Closed);
    }

    #[test]
    fn half_open_failure_reopens() {
        let mut breaker = CircuitBreaker::new(1, chrono::Duration::seconds(0));
        breaker.record_failure();
        breaker.poll();
        breaker.record_failure();
        assert_eq!(breaker.state(), BreakerState::Open);
    }

    #[test]
    fn feature_record_tracks_status() {
        let mut feature = FeatureRecord::new("ocr", 5, chrono::Duration::seconds(60));
        feature.record_failure();
        assert_eq!(feature.status(), FeatureStatus::Degraded);
        feature.record_success();
        assert_eq!(feature.status(), FeatureStatus::Healthy);
    }
}
