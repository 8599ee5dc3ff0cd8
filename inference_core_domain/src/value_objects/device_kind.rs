// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device Kind
//!
//! The three hardware classes the scheduler can place inference work on.
//! `Ord` is derived in fallback-priority order (NPU first) so a
//! `Vec<DeviceKind>` can double as a `fallback_order` without a separate
//! comparator.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeviceKind {
    Npu,
    Gpu,
    Cpu,
}

impl DeviceKind {
    /// Default fallback order: NPU > GPU > CPU.
    pub const DEFAULT_ORDER: [DeviceKind; 3] = [DeviceKind::Npu, DeviceKind::Gpu, DeviceKind::Cpu];
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeviceKind::Npu => "npu",
            DeviceKind::Gpu => "gpu",
            DeviceKind::Cpu => "cpu",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_order_is_npu_gpu_cpu() {
        let mut order = vec![DeviceKind::Cpu, DeviceKind::Npu, DeviceKind::Gpu];
        order.sort();
        assert_eq!(order, DeviceKind::DEFAULT_ORDER.to_vec());
    }
}
