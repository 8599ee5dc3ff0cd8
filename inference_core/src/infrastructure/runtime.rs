// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime
//!
//! Infrastructure adapters implementing the component design: hardware
//! probing, the shared memory pool and resource sharing built on it, the
//! three-tier embedding cache with its promotion manager and statistics
//! monitor, per-model session pools, device performance tracking and
//! fallback selection, the task scheduler, the preprocessing worker pool,
//! graceful degradation, and the versioned API adapter.

pub mod api_version_adapter;
pub mod cache_layers;
pub mod cache_stats_monitor;
pub mod device_tracker;
pub mod fallback_coordinator;
pub mod graceful_degradation;
pub mod hardware_probe;
pub mod memory_pool;
pub mod promotion_manager;
pub mod resource_sharing;
pub mod scheduler;
pub mod session_pool;
pub mod worker_pool;

pub use api_version_adapter::{ApiVersion, ApiVersionAdapter, CanonicalRequest, CanonicalResponse, DeprecationWarning};
pub use cache_layers::{CacheLayer, EvictionPolicy};
pub use cache_stats_monitor::{Alert, AlertSeverity, AlertThresholds, CacheStatisticsMonitor, CacheTierStats, Trend};
pub use device_tracker::DevicePerformanceTracker;
pub use fallback_coordinator::{FallbackConfig, FallbackCoordinator};
pub use graceful_degradation::{DegradationConfig, GracefulDegradationManager};
pub use hardware_probe::{CpuProbe, GpuProbe, NpuProbe};
pub use memory_pool::{AllocationKind, GcThresholds, HardwareProfile, MemoryHandle, SharedMemoryPool};
pub use promotion_manager::{PromotionConfig, PromotionManager};
pub use resource_sharing::{AccessMode, ResourceSharingManager};
pub use scheduler::{QueueDiscipline, Scheduler, SchedulerConfig};
pub use session_pool::{SessionPool, SessionPoolConfig};
pub use worker_pool::{chunk_document, Batcher, ChunkingConfig, WorkerPool, WorkerPoolConfig};
