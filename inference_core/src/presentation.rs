// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Presentation Layer
//!
//! Serializable DTOs sitting between the [`crate::application::InferenceEngine`]
//! facade and an external surface (the bootstrap crate's CLI, or any future
//! HTTP front end). Keeps wire/display formatting out of the application and
//! domain layers - the engine returns domain and infrastructure types, this
//! layer renders them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use inference_core_domain::value_objects::{Precision, Priority};

use crate::application::{EngineStats, InferenceOutcome};
use crate::infrastructure::metrics::MetricsSnapshot;
use crate::infrastructure::runtime::cache_stats_monitor::CacheTierStats;

/// A CLI- or API-facing inference request, deserialized from JSON and
/// converted into the arguments `InferenceEngine::submit_inference` expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequestDto {
    pub model_path: String,
    #[serde(default)]
    pub inputs: HashMap<String, String>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_precision")]
    pub precision: Precision,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_precision() -> Precision {
    Precision::Fp32
}

fn default_batch_size() -> usize {
    1
}

impl InferenceRequestDto {
    pub fn priority(&self) -> Priority {
        Priority::new(self.priority)
    }
}

/// The completed-task view handed back once `await_inference` resolves.
#[derive(Debug, Clone, Serialize)]
pub struct InferenceResponseDto {
    pub task_id: String,
    pub device_id: String,
    pub latency_ms: f64,
    pub outputs: HashMap<String, Vec<f32>>,
}

impl From<InferenceOutcome> for InferenceResponseDto {
    fn from(outcome: InferenceOutcome) -> Self {
        Self {
            task_id: outcome.task_id.to_string(),
            device_id: outcome.device_id,
            latency_ms: outcome.latency_ms,
            outputs: outcome.outputs,
        }
    }
}

/// A point-in-time engine health snapshot, rendered for `stats`-style
/// commands.
#[derive(Debug, Clone, Serialize)]
pub struct StatsDto {
    pub queue_depth: usize,
    pub resource_count: usize,
    pub metrics: MetricsSnapshot,
    pub l1: CacheTierStats,
    pub l2: CacheTierStats,
    pub l3: CacheTierStats,
}

impl From<EngineStats> for StatsDto {
    fn from(stats: EngineStats) -> Self {
        Self {
            queue_depth: stats.queue_depth,
            resource_count: stats.resource_count,
            metrics: stats.metrics,
            l1: stats.l1,
            l2: stats.l2,
            l3: stats.l3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_dto_deserializes_with_defaults() {
        let dto: InferenceRequestDto = serde_json::from_str(r#"{"model_path":"model.onnx"}"#).unwrap();
        assert_eq!(dto.timeout_ms, 30_000);
        assert_eq!(dto.batch_size, 1);
        assert_eq!(dto.priority().value(), 0);
    }
}
