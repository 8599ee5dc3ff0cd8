// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Application Layer
//!
//! Composes the infrastructure adapters into the single `InferenceEngine`
//! facade external callers drive: submit/await/cancel inference, cache
//! get/put, resource share/access, and a stats snapshot.

pub mod engine;

pub use engine::{EngineStats, InferenceEngine, InferenceOutcome};
