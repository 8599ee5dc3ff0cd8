// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Graceful Degradation Manager
//!
//! A registry of named features, each tracked by a domain [`FeatureRecord`]
//! with an embedded circuit breaker. `execute` runs the feature's operation
//! when the breaker is closed (or half-open) and falls back otherwise -
//! timing for the breaker's open/cooldown state reuses the same
//! `Notify`-driven shape as `ShutdownCoordinator`, since both are "wait for
//! a deadline, then flip a state enum" problems.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use parking_lot::Mutex;
use tokio::time::timeout;

use inference_core_domain::entities::{FeatureRecord, FeatureStatus};
use inference_core_domain::error::InferenceError;

#[derive(Debug, Clone)]
pub struct DegradationConfig {
    pub failure_threshold: u32,
    pub circuit_breaker_timeout: Duration,
    pub fallback_timeout: StdDuration,
    pub health_check_interval: StdDuration,
}

impl Default for DegradationConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            circuit_breaker_timeout: Duration::seconds(60),
            fallback_timeout: StdDuration::from_secs(5),
            health_check_interval: StdDuration::from_secs(30),
        }
    }
}

pub struct GracefulDegradationManager {
    features: Mutex<HashMap<String, FeatureRecord>>,
    config: DegradationConfig,
}

impl GracefulDegradationManager {
    pub fn new(config: DegradationConfig) -> Self {
        Self {
            features: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn register(&self, name: impl Into<String>) {
        let name = name.into();
        let mut features = self.features.lock();
        features
            .entry(name.clone())
            .or_insert_with(|| FeatureRecord::new(name, self.config.failure_threshold, self.config.circuit_breaker_timeout));
    }

    pub fn set_enabled(&self, name: &str, enabled: bool) {
        self.register(name);
        if let Some(feature) = self.features.lock().get_mut(name) {
            feature.set_enabled(enabled);
        }
    }

    pub fn status(&self, name: &str) -> FeatureStatus {
        self.features
            .lock()
            .get(name)
            .map(|f| f.status())
            .unwrap_or(FeatureStatus::Unknown)
    }

    /// Runs `op` through the named feature's circuit breaker, falling back
    /// to `fallback` when the feature is disabled, the breaker is open, or
    /// `op` itself fails.
    pub async fn execute<T, Op, OpFut, Fb, FbFut>(&self, feature: &str, op: Op, fallback: Fb) -> Result<T, InferenceError>
    where
        Op: FnOnce() -> OpFut,
        OpFut: std::future::Future<Output = Result<T, InferenceError>>,
        Fb: FnOnce() -> FbFut,
        FbFut: std::future::Future<Output = Result<T, InferenceError>>,
    {
        self.register(feature);
        let allowed = {
            let mut features = self.features.lock();
            let record = features.get_mut(feature).expect("registered above");
            record.enabled() && record.breaker_mut().poll()
        };
        if !allowed {
            return fallback().await;
        }

        match timeout(self.config.fallback_timeout, op()).await {
            Ok(Ok(value)) => {
                self.record_success(feature);
                Ok(value)
            }
            Ok(Err(_)) | Err(_) => {
                self.record_failure(feature);
                fallback().await
            }
        }
    }

    fn record_success(&self, feature: &str) {
        if let Some(record) = self.features.lock().get_mut(feature) {
            record.record_success();
        }
    }

    fn record_failure(&self, feature: &str) {
        if let Some(record) = self.features.lock().get_mut(feature) {
            record.record_failure();
        }
    }

    /// Polls every breaker, letting `Open -> HalfOpen` transitions happen
    /// once their cooldown elapses. Intended to be driven by the shared
    /// timer wheel at `health_check_interval`.
    pub fn run_health_checks(&self) {
        let mut features = self.features.lock();
        for record in features.values_mut() {
            record.breaker_mut().poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn six_consecutive_failures_open_breaker_and_invoke_fallback() {
        let manager = Arc::new(GracefulDegradationManager::new(DegradationConfig {
            failure_threshold: 5,
            ..DegradationConfig::default()
        }));
        let mut fallback_invocations = 0;
        for _ in 0..6 {
            let result: Result<u32, InferenceError> = manager
                .execute(
                    "ocr",
                    || async { Err(InferenceError::inference_failed("boom")) },
                    || async { Ok(0) },
                )
                .await;
            if result == Ok(0) {
                fallback_invocations += 1;
            }
        }
        assert!(fallback_invocations >= 1);
        assert_eq!(manager.status("ocr"), FeatureStatus::Degraded);
    }

    #[tokio::test]
    async fn healthy_operation_keeps_breaker_closed() {
        let manager = GracefulDegradationManager::new(DegradationConfig::default());
        let result = manager
            .execute("summarize", || async { Ok::<_, InferenceError>(42) }, || async { Ok(0) })
            .await
            .unwrap();
        assert_eq!(result, 42);
        assert_eq!(manager.status("summarize"), FeatureStatus::Healthy);
    }

    #[tokio::test]
    async fn disabled_feature_always_falls_back() {
        let manager = GracefulDegradationManager::new(DegradationConfig::default());
        manager.set_enabled("translate", false);
        let result = manager
            .execute(
                "translate",
                || async { Ok::<_, InferenceError>(1) },
                || async { Ok::<_, InferenceError>(99) },
            )
            .await
            .unwrap();
        assert_eq!(result, 99);
    }
}
