// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error type for the inference runtime domain,
//! following the same shape as a well-factored `thiserror` enum: one variant
//! per failure category, a stable machine-readable `code()`, a coarse
//! `category()` for metrics/logging grouping, and an `is_recoverable()` hint
//! that callers (in particular the Fallback Coordinator and the Graceful
//! Degradation Manager) use to decide whether to retry.
//!
//! Device-local failures are expected to be absorbed by the Fallback
//! Coordinator and only surfaced as [`InferenceError::AllDevicesFailed`] once
//! every device in the fallback chain has been tried. Cache and degradation
//! failures never reach a caller directly - they trigger fallbacks.

use thiserror::Error;

/// Domain-specific errors for the local inference runtime.
#[derive(Error, Debug, Clone)]
pub enum InferenceError {
    /// Malformed request, unknown model, or invalid options.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A component was used before it was initialized.
    #[error("not initialized: {0}")]
    NotInitialized(String),

    /// A bounded queue rejected new work; caller should retry with its own
    /// policy.
    #[error("queue full: {0}")]
    QueueFull(String),

    /// An operation did not complete before its deadline.
    #[error("timeout: {0}")]
    Timeout(String),

    /// The requested device is not currently available.
    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Every device in the fallback chain failed; carries the last
    /// underlying error message.
    #[error("all devices failed: {0}")]
    AllDevicesFailed(String),

    /// The shared memory pool could not satisfy an allocation after GC.
    #[error("out of memory: {0}")]
    OutOfMemory(String),

    /// A resource-sharing policy refused access, or the resource's TTL
    /// expired.
    #[error("policy denied: {0}")]
    PolicyDenied(String),

    /// A provider-level inference failure (wraps the underlying message).
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// The task or operation was cancelled.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// An unexpected, non-recoverable internal failure.
    #[error("internal error: {0}")]
    InternalError(String),
}

impl InferenceError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_initialized(msg: impl Into<String>) -> Self {
        Self::NotInitialized(msg.into())
    }

    pub fn queue_full(msg: impl Into<String>) -> Self {
        Self::QueueFull(msg.into())
    }

    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    pub fn device_unavailable(msg: impl Into<String>) -> Self {
        Self::DeviceUnavailable(msg.into())
    }

    pub fn all_devices_failed(msg: impl Into<String>) -> Self {
        Self::AllDevicesFailed(msg.into())
    }

    pub fn out_of_memory(msg: impl Into<String>) -> Self {
        Self::OutOfMemory(msg.into())
    }

    pub fn policy_denied(msg: impl Into<String>) -> Self {
        Self::PolicyDenied(msg.into())
    }

    pub fn inference_failed(msg: impl Into<String>) -> Self {
        Self::InferenceFailed(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }

    /// A stable, machine-readable error code - safe to key metrics/alerts on
    /// even if the human message changes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotInitialized(_) => "not_initialized",
            Self::QueueFull(_) => "queue_full",
            Self::Timeout(_) => "timeout",
            Self::DeviceUnavailable(_) => "device_unavailable",
            Self::AllDevicesFailed(_) => "all_devices_failed",
            Self::OutOfMemory(_) => "out_of_memory",
            Self::PolicyDenied(_) => "policy_denied",
            Self::InferenceFailed(_) => "inference_failed",
            Self::Cancelled(_) => "cancelled",
            Self::InternalError(_) => "internal_error",
        }
    }

    /// Coarse category, used for grouping in metrics and logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "validation",
            Self::NotInitialized(_) => "lifecycle",
            Self::QueueFull(_) | Self::Timeout(_) => "backpressure",
            Self::DeviceUnavailable(_) | Self::AllDevicesFailed(_) => "device",
            Self::OutOfMemory(_) => "resource",
            Self::PolicyDenied(_) => "policy",
            Self::InferenceFailed(_) => "inference",
            Self::Cancelled(_) => "cancellation",
            Self::InternalError(_) => "internal",
        }
    }

    /// Whether a caller can reasonably retry the same operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::QueueFull(_) | Self::Timeout(_) | Self::DeviceUnavailable(_) | Self::OutOfMemory(_)
        )
    }
}

impl From<std::io::Error> for InferenceError {
    fn from(err: std::io::Error) -> Self {
        InferenceError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for InferenceError {
    fn from(err: serde_json::Error) -> Self {
        InferenceError::InvalidInput(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_stable_across_message_changes() {
        let a = InferenceError::device_unavailable("npu-0 offline");
        let b = InferenceError::device_unavailable("different message");
        assert_eq!(a.code(), b.code());
    }

    #[test]
    fn recoverable_classification() {
        assert!(InferenceError::queue_full("full").is_recoverable());
        assert!(InferenceError::timeout("slow").is_recoverable());
        assert!(!InferenceError::policy_denied("nope").is_recoverable());
        assert!(!InferenceError::invalid_input("bad").is_recoverable());
    }

    #[test]
    fn category_grouping() {
        assert_eq!(InferenceError::all_devices_failed("x").category(), "device");
        assert_eq!(InferenceError::out_of_memory("x").category(), "resource");
    }
}
