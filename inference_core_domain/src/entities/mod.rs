// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Domain entities for the inference runtime.

pub mod cache_entry;
pub mod device;
pub mod device_history;
pub mod feature_record;
pub mod inference_session;
pub mod inference_task;
pub mod memory_block;
pub mod shared_resource;

pub use cache_entry::CacheEntry;
pub use device::{Device, DeviceStatus};
pub use device_history::{DeviceHistory, HealthLevel};
pub use feature_record::{BreakerState, CircuitBreaker, FeatureRecord, FeatureStatus};
pub use inference_session::InferenceSession;
pub use inference_task::{InferenceTask, TaskOptions, TaskStatus};
pub use memory_block::MemoryBlock;
pub use shared_resource::{ResourceBacking, SharedResource, SharingPolicy, SharingPolicyKind};
