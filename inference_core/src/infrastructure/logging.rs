// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Logging
//!
//! Structured logging for the engine's hot paths (scheduler dispatch,
//! device selection, cache tier moves) via `tracing`. Initialization
//! itself lives in the bootstrap crate - this module only provides the
//! `tracing::instrument`-friendly span helpers the infrastructure layer
//! shares, so every component logs with the same field names.

use tracing::Span;

/// A span tagging the device a unit of work is currently bound to, used
/// consistently across the scheduler, fallback coordinator, and session
/// pool so log aggregation can filter on `device_id` regardless of which
/// component emitted the record.
pub fn device_span(device_id: &str) -> Span {
    tracing::info_span!("device", device_id)
}

/// A span tagging the cache tier an operation touched.
pub fn cache_span(tier: &str, key: &str) -> Span {
    tracing::debug_span!("cache", tier, key)
}

/// A span tagging an inference task's lifecycle.
pub fn task_span(task_id: &str) -> Span {
    tracing::info_span!("task", task_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_construct_without_a_subscriber_installed() {
        let _ = device_span("npu-0");
        let _ = cache_span("l1", "doc-1#0");
        let _ = task_span("11111111-1111-1111-1111-111111111111");
    }
}
