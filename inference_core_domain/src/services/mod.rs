// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Domain service ports implemented by infrastructure adapters.

pub mod device_probe;
pub mod inference_provider;

pub use device_probe::DeviceProbe;
pub use inference_provider::{InferenceProvider, InferenceRequest, InferenceResponse};
