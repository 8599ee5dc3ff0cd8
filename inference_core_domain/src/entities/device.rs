// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device
//!
//! A probed hardware device descriptor. Identity and capability bits are
//! immutable for the process lifetime - only `status` (mutated by the
//! Fallback Coordinator when a device is marked unavailable/available
//! again) changes after construction.

use serde::{Deserialize, Serialize};

use crate::value_objects::{DeviceId, DeviceKind, PerformanceScore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceStatus {
    Available,
    Unavailable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    id: DeviceId,
    kind: DeviceKind,
    name: String,
    /// Raw capability bits, stored generically since each `DeviceKind` has
    /// its own bit layout (see `value_objects::capability_bits`).
    capability_bits: u32,
    performance_score: PerformanceScore,
    status: DeviceStatus,
    max_concurrent: usize,
}

impl Device {
    pub fn new(
        id: DeviceId,
        kind: DeviceKind,
        name: impl Into<String>,
        capability_bits: u32,
        performance_score: PerformanceScore,
        max_concurrent: usize,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            capability_bits,
            performance_score,
            status: DeviceStatus::Available,
            max_concurrent,
        }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capability_bits(&self) -> u32 {
        self.capability_bits
    }

    pub fn performance_score(&self) -> PerformanceScore {
        self.performance_score
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn status(&self) -> DeviceStatus {
        self.status
    }

    pub fn is_available(&self) -> bool {
        matches!(self.status, DeviceStatus::Available)
    }

    pub fn mark_available(&mut self) {
        self.status = DeviceStatus::Available;
    }

    pub fn mark_unavailable(&mut self) {
        self.status = DeviceStatus::Unavailable;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Device {
        Device::new(
            DeviceId::new("npu-0").unwrap(),
            DeviceKind::Npu,
            "Apple Neural Engine",
            0,
            PerformanceScore::new(0.9),
            4,
        )
    }

    #[test]
    fn starts_available() {
        assert!(sample().is_available());
    }

    #[test]
    fn status_transitions() {
        let mut device = sample();
        device.mark_unavailable();
        assert!(!device.is_available());
        device.mark_available();
        assert!(device.is_available());
    }
}
