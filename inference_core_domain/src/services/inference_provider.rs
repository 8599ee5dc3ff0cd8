// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Provider
//!
//! The domain's contract for actually running a model on a bound session.
//! This trait is **synchronous**: the domain layer describes a pure
//! operation, and driving it on an async runtime (or a thread pool) is an
//! infrastructure concern handled by the adapter that implements this
//! trait.

use std::collections::HashMap;

use crate::entities::inference_session::InferenceSession;
use crate::error::InferenceError;
use crate::value_objects::Precision;

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub inputs: HashMap<String, String>,
    pub precision: Precision,
}

#[derive(Debug, Clone)]
pub struct InferenceResponse {
    pub outputs: HashMap<String, Vec<f32>>,
    pub latency_ms: f64,
}

/// Implemented by an infrastructure adapter for one concrete runtime
/// (ONNX Runtime, llama.cpp, CoreML, DirectML, ...).
pub trait InferenceProvider: Send + Sync {
    /// Loads a model from `model_path` and returns a session bound to this
    /// provider. `model_path` is opaque to the domain - recognized
    /// extensions are for logging/diagnostics only.
    fn load(&self, model_path: &str) -> Result<InferenceSession, InferenceError>;

    /// Runs one inference call on an already-bound session.
    fn run(&self, session: &InferenceSession, request: InferenceRequest) -> Result<InferenceResponse, InferenceError>;

    /// Best-effort cancellation of an in-flight call on this session.
    /// Providers without native cancellation support may no-op.
    fn cancel(&self, session: &InferenceSession) -> Result<(), InferenceError>;

    /// Tears the session down and releases any provider-native handle.
    fn unload(&self, session: InferenceSession) -> Result<(), InferenceError>;
}
