// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device Probe
//!
//! The domain's contract for one-shot hardware inventory. Implementations
//! live in infrastructure (reading `/proc/cpuinfo`, vendor SDKs, platform
//! APIs); the domain only needs the resulting descriptors.

use crate::entities::device::Device;
use crate::error::InferenceError;

/// A single probed capability source (CPU, GPU, or NPU enumeration).
pub trait DeviceProbe: Send + Sync {
    /// Performs a one-shot scan and returns every device this probe found.
    /// Probing is expected to be idempotent and safe to call repeatedly
    /// (e.g. on the periodic hot-plug re-probe).
    fn probe(&self) -> Result<Vec<Device>, InferenceError>;
}
