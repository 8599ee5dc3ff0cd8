// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Engine Configuration
//!
//! A single explicit, validated configuration value for the
//! [`InferenceEngine`](crate::application::InferenceEngine) - no
//! environment-variable driven behavior. Callers build an `EngineConfig`,
//! call [`EngineConfig::validate`], and hand it to the engine's
//! constructor.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use inference_core_domain::error::InferenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadBalancing {
    Performance,
    Power,
    Balanced,
}

impl Default for LoadBalancing {
    fn default() -> Self {
        LoadBalancing::Balanced
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AlertThresholdsConfig {
    pub hit_rate: f64,
    pub latency_ms: f64,
    pub error_rate: f64,
    pub memory_usage: f64,
}

impl Default for AlertThresholdsConfig {
    fn default() -> Self {
        Self {
            hit_rate: 0.7,
            latency_ms: 1000.0,
            error_rate: 0.05,
            memory_usage: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_workers: usize,
    pub max_pool_size: usize,
    pub max_queue_size: usize,
    /// §4.10: processed FIFO, or by priority when this is set.
    pub priority_scheduling: bool,
    pub load_balancing: LoadBalancing,
    /// `(l1, l2, l3)` tier capacities.
    pub cache_sizes: (usize, usize, usize),
    pub gc_threshold: f64,
    pub alert_thresholds: AlertThresholdsConfig,
    pub fallback_cooldown_ms: u64,
    pub circuit_breaker_threshold: u32,
    pub circuit_breaker_timeout_ms: u64,
    pub enable_npu: bool,
    pub enable_gpu: bool,
    pub enable_cpu: bool,
    pub pool_size_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            max_pool_size: 4,
            max_queue_size: 1000,
            priority_scheduling: true,
            load_balancing: LoadBalancing::Balanced,
            cache_sizes: (1_000, 10_000, 100_000),
            gc_threshold: 0.8,
            alert_thresholds: AlertThresholdsConfig::default(),
            fallback_cooldown_ms: 30_000,
            circuit_breaker_threshold: 5,
            circuit_breaker_timeout_ms: 60_000,
            enable_npu: true,
            enable_gpu: true,
            enable_cpu: true,
            pool_size_bytes: 256 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    /// Validates the recognized ranges from the external interface: a
    /// zero-sized anything is nonsensical, and `gc_threshold` must stay
    /// within `[0.1, 0.95]`.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if !(0.1..=0.95).contains(&self.gc_threshold) {
            return Err(InferenceError::invalid_input(format!(
                "gc_threshold {} out of range [0.1, 0.95]",
                self.gc_threshold
            )));
        }
        if self.max_workers == 0 {
            return Err(InferenceError::invalid_input("max_workers must be at least 1"));
        }
        if self.max_pool_size == 0 {
            return Err(InferenceError::invalid_input("max_pool_size must be at least 1"));
        }
        if self.max_queue_size == 0 {
            return Err(InferenceError::invalid_input("max_queue_size must be at least 1"));
        }
        if !self.enable_npu && !self.enable_gpu && !self.enable_cpu {
            return Err(InferenceError::invalid_input("at least one device kind must be enabled"));
        }
        Ok(())
    }

    pub fn fallback_cooldown(&self) -> Duration {
        Duration::from_millis(self.fallback_cooldown_ms)
    }

    pub fn circuit_breaker_timeout(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_timeout_ms)
    }

    /// A flat map view of `alert_thresholds`, for code paths that want to
    /// iterate the thresholds generically rather than field-access them.
    pub fn alert_thresholds_map(&self) -> HashMap<&'static str, f64> {
        HashMap::from([
            ("hit_rate", self.alert_thresholds.hit_rate),
            ("latency", self.alert_thresholds.latency_ms),
            ("error_rate", self.alert_thresholds.error_rate),
            ("memory_usage", self.alert_thresholds.memory_usage),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn gc_threshold_out_of_range_is_rejected() {
        let config = EngineConfig {
            gc_threshold: 1.5,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn disabling_every_device_kind_is_rejected() {
        let config = EngineConfig {
            enable_npu: false,
            enable_gpu: false,
            enable_cpu: false,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
