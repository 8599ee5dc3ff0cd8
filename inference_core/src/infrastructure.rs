// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Adapters implementing the domain's service ports plus everything
//! needed to run them: configuration, logging spans, metrics, and the
//! runtime components themselves (hardware probe, memory pool, caches,
//! scheduler, worker pool, degradation manager, API adapter).

pub mod config;
pub mod logging;
pub mod metrics;
pub mod runtime;

pub use config::{AlertThresholdsConfig, EngineConfig, LoadBalancing};
pub use metrics::EngineMetrics;
