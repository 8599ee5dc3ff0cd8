// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Validated value objects for the inference runtime domain.

pub mod alignment;
pub mod cache_tier_id;
pub mod capability_bits;
pub mod chunk_key;
pub mod device_id;
pub mod device_kind;
pub mod performance_score;
pub mod precision;
pub mod priority;
pub mod task_id;

pub use alignment::Alignment;
pub use cache_tier_id::CacheTierId;
pub use capability_bits::{CpuCapabilities, GpuCapabilities, NpuCapabilities};
pub use chunk_key::ChunkKey;
pub use device_id::DeviceId;
pub use device_kind::DeviceKind;
pub use performance_score::PerformanceScore;
pub use precision::Precision;
pub use priority::Priority;
pub use task_id::{SessionId, TaskId};
