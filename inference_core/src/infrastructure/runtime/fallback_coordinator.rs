// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Fallback Coordinator
//!
//! Selects the best available device for a workload, honoring per-device
//! cooldowns after a failure, and drives `execute_with_fallback` across the
//! configured fallback order until one device succeeds or the chain is
//! exhausted.
//!
//! The cooldown map and each device's history use independent locks;
//! `select` takes a read snapshot of both before scoring, so scoring never
//! holds a lock that a concurrent `record_failure` needs.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;

use inference_core_domain::entities::{Device, DeviceStatus};
use inference_core_domain::error::InferenceError;
use inference_core_domain::value_objects::{DeviceId, DeviceKind};

use super::device_tracker::DevicePerformanceTracker;
use crate::infrastructure::config::LoadBalancing;

#[derive(Debug, Clone)]
pub struct FallbackConfig {
    pub min_success_rate: f64,
    pub max_latency_ms: f64,
    pub cooldown: Duration,
    pub recent_window: Duration,
    /// §6 `load_balancing`: how a device's dynamic (tracker-derived) and
    /// static (hardware-probe-derived) performance scores are weighted
    /// when picking among healthy candidates.
    pub load_balancing: LoadBalancing,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            min_success_rate: 0.8,
            max_latency_ms: 5000.0,
            cooldown: Duration::seconds(30),
            recent_window: Duration::minutes(5),
            load_balancing: LoadBalancing::Balanced,
        }
    }
}

struct TrackedDevice {
    device: Device,
    tracker: Arc<DevicePerformanceTracker>,
}

pub struct FallbackCoordinator {
    /// Ordered by fallback preference, e.g. NPU, then GPU, then CPU.
    devices: RwLock<Vec<TrackedDevice>>,
    cooldowns: RwLock<HashMap<DeviceId, DateTime<Utc>>>,
    current: RwLock<Option<DeviceId>>,
    config: FallbackConfig,
}

impl FallbackCoordinator {
    pub fn new(devices: Vec<(Device, Arc<DevicePerformanceTracker>)>, config: FallbackConfig) -> Self {
        Self {
            devices: RwLock::new(
                devices
                    .into_iter()
                    .map(|(device, tracker)| TrackedDevice { device, tracker })
                    .collect(),
            ),
            cooldowns: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            config,
        }
    }

    pub fn mark_unavailable(&self, device_id: &DeviceId) {
        if let Some(entry) = self.devices.write().iter_mut().find(|d| d.device.id() == device_id) {
            entry.device.mark_unavailable();
        }
    }

    pub fn mark_available(&self, device_id: &DeviceId) {
        if let Some(entry) = self.devices.write().iter_mut().find(|d| d.device.id() == device_id) {
            entry.device.mark_available();
        }
    }

    fn in_cooldown(&self, device_id: &DeviceId) -> bool {
        self.cooldowns
            .read()
            .get(device_id)
            .map(|until| Utc::now() < *until)
            .unwrap_or(false)
    }

    fn put_in_cooldown(&self, device_id: &DeviceId) {
        self.cooldowns
            .write()
            .insert(device_id.clone(), Utc::now() + self.config.cooldown);
    }

    /// Combines the device's dynamic, tracker-derived performance score
    /// (recent success rate and latency) with its static, hardware-probe-
    /// derived [`Device::performance_score`] - the actual "hardware-aware"
    /// signal from the probe, per spec. `Performance` uses the dynamic score
    /// alone; `Power` uses the static hardware score alone (favor the most
    /// capable idle hardware rather than recent runtime behavior);
    /// `Balanced` averages the two.
    fn score(&self, tracked: &TrackedDevice) -> f64 {
        let dynamic = tracked.tracker.performance_score().value();
        let hardware = tracked.device.performance_score().value();
        match self.config.load_balancing {
            LoadBalancing::Performance => dynamic,
            LoadBalancing::Power => hardware,
            LoadBalancing::Balanced => (dynamic + hardware) / 2.0,
        }
    }

    /// Records an inference outcome against `device_id`'s tracker and, on
    /// failure, puts it in cooldown - the same bookkeeping
    /// `execute_with_fallback` does internally, exposed for async callers
    /// (like the engine's dispatch loop) that can't drive a synchronous
    /// `FnMut` closure through an `.await`.
    pub fn record_outcome(&self, device_id: &DeviceId, latency_ms: f64, ok: bool) {
        if let Some(tracked) = self.devices.read().iter().find(|d| d.device.id() == device_id) {
            tracked.tracker.record_inference(latency_ms, ok, None);
        }
        if !ok {
            self.put_in_cooldown(device_id);
        }
    }

    /// Picks the best device for `_workload_type`, preferring to keep the
    /// current device if it is still healthy.
    pub fn select(&self, _workload_type: &str) -> Result<DeviceId, InferenceError> {
        let devices = self.devices.read();

        if let Some(current_id) = self.current.read().clone() {
            if !self.in_cooldown(&current_id) {
                if let Some(tracked) = devices.iter().find(|d| d.device.id() == &current_id) {
                    if tracked.device.is_available() {
                        let (success_rate, avg_latency, enough) =
                            tracked.tracker.recent_performance(self.config.recent_window);
                        if enough
                            && success_rate >= self.config.min_success_rate
                            && avg_latency <= self.config.max_latency_ms
                        {
                            return Ok(current_id);
                        }
                    }
                }
            }
        }

        // `Iterator::max_by` returns the *last* of tied-max elements, which
        // would let a later, less-preferred device in `devices` win a tie
        // against an earlier, more-preferred one. `devices` is ordered by
        // fallback preference, so walk it in order and only replace the
        // current best on a strict improvement - the first device to reach
        // the max score keeps it.
        let mut best: Option<(&TrackedDevice, f64)> = None;
        for tracked in devices.iter().filter(|d| d.device.is_available() && !self.in_cooldown(d.device.id())) {
            let candidate_score = self.score(tracked);
            let replace = match &best {
                Some((_, current_score)) => candidate_score > *current_score,
                None => true,
            };
            if replace {
                best = Some((tracked, candidate_score));
            }
        }
        let best = best.map(|(tracked, _)| tracked);

        let chosen = match best {
            Some(tracked) => tracked.device.id().clone(),
            None => devices
                .last()
                .map(|d| d.device.id().clone())
                .ok_or_else(|| InferenceError::device_unavailable("no devices registered"))?,
        };

        drop(devices);
        *self.current.write() = Some(chosen.clone());
        Ok(chosen)
    }

    /// Runs `op` against successive devices in fallback order (starting
    /// from `select`'s pick) until one succeeds, putting each failing
    /// device in cooldown before retrying. Surfaces `AllDevicesFailed` with
    /// the last error if every attempt fails.
    pub fn execute_with_fallback<T>(
        &self,
        workload_type: &str,
        mut op: impl FnMut(&DeviceId) -> Result<T, InferenceError>,
    ) -> Result<T, InferenceError> {
        let attempts = self.devices.read().len().max(1);
        let mut last_error = InferenceError::device_unavailable("no devices registered");

        for _ in 0..attempts {
            let device_id = self.select(workload_type)?;
            let started = std::time::Instant::now();
            match op(&device_id) {
                Ok(value) => {
                    if let Some(tracked) = self.devices.read().iter().find(|d| d.device.id() == &device_id) {
                        tracked
                            .tracker
                            .record_inference(started.elapsed().as_millis() as f64, true, None);
                    }
                    return Ok(value);
                }
                Err(err) => {
                    if let Some(tracked) = self.devices.read().iter().find(|d| d.device.id() == &device_id) {
                        tracked
                            .tracker
                            .record_inference(started.elapsed().as_millis() as f64, false, None);
                    }
                    self.put_in_cooldown(&device_id);
                    last_error = err;
                }
            }
        }

        Err(InferenceError::all_devices_failed(last_error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, kind: DeviceKind) -> Device {
        device_scored(id, kind, 0.5)
    }

    fn device_scored(id: &str, kind: DeviceKind, score: f64) -> Device {
        Device::new(DeviceId::new(id).unwrap(), kind, id, 0, PerformanceScore::new(score), 4)
    }

    use inference_core_domain::value_objects::PerformanceScore;

    #[test]
    fn falls_back_when_all_attempts_fail() {
        let devices = vec![
            (device("npu-0", DeviceKind::Npu), Arc::new(DevicePerformanceTracker::new())),
            (device("cpu-0", DeviceKind::Cpu), Arc::new(DevicePerformanceTracker::new())),
        ];
        let coordinator = FallbackCoordinator::new(devices, FallbackConfig::default());
        let result: Result<(), InferenceError> =
            coordinator.execute_with_fallback("embed", |_| Err(InferenceError::inference_failed("boom")));
        assert!(matches!(result, Err(InferenceError::AllDevicesFailed(_))));
    }

    #[test]
    fn succeeds_on_first_healthy_device() {
        let devices = vec![(device("cpu-0", DeviceKind::Cpu), Arc::new(DevicePerformanceTracker::new()))];
        let coordinator = FallbackCoordinator::new(devices, FallbackConfig::default());
        let result = coordinator.execute_with_fallback("embed", |_| Ok(42));
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn unavailable_device_is_skipped() {
        let devices = vec![
            (device("npu-0", DeviceKind::Npu), Arc::new(DevicePerformanceTracker::new())),
            (device("cpu-0", DeviceKind::Cpu), Arc::new(DevicePerformanceTracker::new())),
        ];
        let coordinator = FallbackCoordinator::new(devices, FallbackConfig::default());
        coordinator.mark_unavailable(&DeviceId::new("npu-0").unwrap());
        let chosen = coordinator.select("embed").unwrap();
        assert_eq!(chosen, DeviceId::new("cpu-0").unwrap());
    }

    #[test]
    fn power_policy_prefers_the_device_with_the_higher_hardware_score() {
        let devices = vec![
            (device_scored("gpu-0", DeviceKind::Gpu, 0.4), Arc::new(DevicePerformanceTracker::new())),
            (device_scored("npu-0", DeviceKind::Npu, 0.9), Arc::new(DevicePerformanceTracker::new())),
        ];
        let coordinator = FallbackCoordinator::new(
            devices,
            FallbackConfig {
                load_balancing: LoadBalancing::Power,
                ..FallbackConfig::default()
            },
        );
        assert_eq!(coordinator.select("embed").unwrap(), DeviceId::new("npu-0").unwrap());
    }

    #[test]
    fn tied_score_prefers_the_earlier_device_in_fallback_order() {
        let devices = vec![
            (device("npu-0", DeviceKind::Npu), Arc::new(DevicePerformanceTracker::new())),
            (device("gpu-0", DeviceKind::Gpu), Arc::new(DevicePerformanceTracker::new())),
            (device("cpu-0", DeviceKind::Cpu), Arc::new(DevicePerformanceTracker::new())),
        ];
        let coordinator = FallbackCoordinator::new(devices, FallbackConfig::default());
        assert_eq!(coordinator.select("embed").unwrap(), DeviceId::new("npu-0").unwrap());
    }

    #[test]
    fn cooldown_falls_through_to_the_next_preferred_device_not_the_highest_power_draw() {
        let devices = vec![
            (device("npu-0", DeviceKind::Npu), Arc::new(DevicePerformanceTracker::new())),
            (device("gpu-0", DeviceKind::Gpu), Arc::new(DevicePerformanceTracker::new())),
            (device("cpu-0", DeviceKind::Cpu), Arc::new(DevicePerformanceTracker::new())),
        ];
        let coordinator = FallbackCoordinator::new(devices, FallbackConfig::default());
        // NPU fails twice and is put in cooldown; GPU, second in the
        // fallback order, must be selected ahead of CPU.
        for _ in 0..2 {
            let result: Result<(), InferenceError> =
                coordinator.execute_with_fallback("embed", |device_id| {
                    if device_id == &DeviceId::new("npu-0").unwrap() {
                        Err(InferenceError::inference_failed("npu busy"))
                    } else {
                        Ok(())
                    }
                });
            assert!(result.is_ok());
        }
        assert_eq!(coordinator.select("embed").unwrap(), DeviceId::new("gpu-0").unwrap());
    }
}
