// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Core Domain
//!
//! The domain layer of the local inference runtime: pure business logic for
//! hardware-aware scheduling, hierarchical embedding caching, shared memory
//! accounting, and graceful degradation. Completely independent of any
//! concrete inference runtime, async executor, or file system - those are
//! infrastructure concerns that implement the ports declared here.
//!
//! ## Module Structure
//!
//! - `value_objects` - immutable, self-validating types (`DeviceId`,
//!   `Alignment`, `CacheTierId`, `Precision`, ...)
//! - `entities` - identity-bearing, mutable objects (`Device`, `CacheEntry`,
//!   `InferenceTask`, `MemoryBlock`, ...)
//! - `services` - domain service ports (`InferenceProvider`, `DeviceProbe`)
//!   implemented by infrastructure adapters
//! - `events` - domain events (`CacheEvent`, `TaskEvent`)
//! - `error` - the unified `InferenceError` type
//!
//! ## Domain-Driven Design Concepts
//!
//! ### Entities
//! Objects with identity that persists through state changes: `Device`,
//! `InferenceTask`, `InferenceSession`, `MemoryBlock`, `SharedResource`,
//! `CacheEntry`, `FeatureRecord`.
//!
//! ### Value Objects
//! Immutable, self-validating types defined by their attributes:
//! `DeviceId`, `DeviceKind`, `Alignment`, `Precision`, `Priority`,
//! `CacheTierId`, `ChunkKey`, `PerformanceScore`, the capability bit sets.
//!
//! ### Domain Services
//! Stateless ports implemented outside the domain: `InferenceProvider` runs
//! a model on a bound session; `DeviceProbe` performs one-shot hardware
//! inventory. Both are synchronous traits - driving them on an async
//! runtime or thread pool is an infrastructure concern.
//!
//! ### Domain Events
//! `CacheEvent` and `TaskEvent` are immutable records of things that
//! already happened, consumed by the promotion manager, statistics
//! monitor, and any external observer.

pub mod entities;
pub mod error;
pub mod events;
pub mod services;
pub mod value_objects;

pub use entities::{
    CacheEntry, Device, DeviceHistory, DeviceStatus, FeatureRecord, HealthLevel, InferenceSession,
    InferenceTask, MemoryBlock, SharedResource, TaskOptions, TaskStatus,
};
pub use error::InferenceError;
pub use events::{CacheEvent, TaskEvent};
pub use services::{DeviceProbe, InferenceProvider};
pub use value_objects::{
    Alignment, CacheTierId, ChunkKey, DeviceId, DeviceKind, PerformanceScore, Precision, Priority,
    SessionId, TaskId,
};
