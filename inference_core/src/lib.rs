// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Local Inference Runtime
//!
//! A hardware-aware runtime for scheduling and executing on-device model
//! inference across NPU, GPU, and CPU backends, backed by a hierarchical
//! embedding cache and a shared, copy-on-write memory pool.
//!
//! ## Architecture Overview
//!
//! The crate follows Clean Architecture and Domain-Driven Design principles,
//! matching the layering of [`inference_core_domain`]:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Presentation Layer                          │
//! │  (stats/inference DTOs handed to the bootstrap CLI)          │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (InferenceEngine facade: submit/await/cancel, cache, ...)   │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (scheduler, fallback coordinator, cache tiers, memory pool) │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │  (entities, value objects, domain services, events)         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Core Concepts
//!
//! ### Inference Engine
//! The [`application::InferenceEngine`] is the crate's single external
//! facade. It owns the task scheduler's dispatch loop, the per-device
//! session pools, the three-tier embedding cache, the shared memory pool,
//! and the graceful degradation manager, composing them into submit/await/
//! cancel inference, cache get/put, and resource sharing operations.
//!
//! ### Hardware-Aware Scheduling
//! Tasks are admitted into a priority queue and dispatched under a
//! process-wide concurrency cap. Device selection is delegated to the
//! Fallback Coordinator, which prefers the current device while it remains
//! healthy and falls back through NPU, GPU, then CPU otherwise.
//!
//! ### Hierarchical Embedding Cache
//! Embeddings move between L1 (LRU), L2 (aging LFU), and L3 (FIFO) tiers
//! under a Promotion Manager that scores recency, frequency, and access
//! regularity, always acquiring tier locks in a fixed order to avoid
//! deadlocks with concurrent transfers.
//!
//! ### Shared Memory Pool
//! Large shared resources are pooled in a single anonymous-mapped buffer
//! with alignment-aware allocation, reference-counted sharing policies, and
//! copy-on-write access semantics.
//!
//! ## Testing
//!
//! The crate includes unit tests alongside each module:
//!
//! ```bash
//! cargo test
//! ```

pub mod application;
pub mod infrastructure;
pub mod presentation;

// Re-export domain types for convenient access
pub use inference_core_domain::{
    entities::{Device, InferenceTask, SharingPolicy, TaskOptions},
    error::InferenceError,
    value_objects::{CacheTierId, ChunkKey, DeviceId, Precision, Priority, TaskId},
};

pub use application::{EngineStats, InferenceEngine, InferenceOutcome};
pub use infrastructure::config::{EngineConfig, LoadBalancing};
pub use infrastructure::runtime::api_version_adapter::DeprecationWarning;
pub use infrastructure::runtime::worker_pool::chunk_document;
