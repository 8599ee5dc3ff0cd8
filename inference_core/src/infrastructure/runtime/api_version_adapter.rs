// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # API Version Adapter
//!
//! Translates versioned request/response envelopes (`v1.0`, `v1.1`, `v2.0`)
//! to and from the canonical internal submit-inference representation.
//! Unknown versions fail registration; deprecated operations still execute
//! but carry a structured [`DeprecationWarning`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use inference_core_domain::error::InferenceError;
use inference_core_domain::value_objects::Precision;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiVersion {
    #[serde(rename = "1.0")]
    V1_0,
    #[serde(rename = "1.1")]
    V1_1,
    #[serde(rename = "2.0")]
    V2_0,
}

impl ApiVersion {
    pub fn parse(value: &str) -> Result<Self, InferenceError> {
        match value {
            "1.0" => Ok(ApiVersion::V1_0),
            "1.1" => Ok(ApiVersion::V1_1),
            "2.0" => Ok(ApiVersion::V2_0),
            other => Err(InferenceError::invalid_input(format!("unsupported api version {other}"))),
        }
    }
}

/// The canonical, version-independent request every adapter translates
/// into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub model_path: String,
    pub inputs: HashMap<String, Value>,
    pub priority: i32,
    pub timeout_ms: u64,
    pub precision: Precision,
    pub batch_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalResponse {
    pub outputs: HashMap<String, Value>,
    pub latency_ms: f64,
    pub device_kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeprecationWarning {
    pub replacement: String,
    pub deprecated_since: String,
    pub removal_version: String,
}

/// v1.0 had no `precision` or `batch_size` field at all - both default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestV1_0 {
    pub model: String,
    pub inputs: HashMap<String, Value>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// v1.1 added `precision`, still used `model` instead of `model_path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestV1_1 {
    pub model: String,
    pub inputs: HashMap<String, Value>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub precision: Option<Precision>,
}

/// v2.0 is the current canonical shape, field-for-field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestV2_0 {
    pub model_path: String,
    pub inputs: HashMap<String, Value>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_precision")]
    pub precision: Precision,
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_batch_size() -> u32 {
    1
}

fn default_precision() -> Precision {
    Precision::Fp32
}

pub struct ApiVersionAdapter;

impl ApiVersionAdapter {
    /// Parses and translates a raw JSON request body for `version` into
    /// the canonical form, returning any deprecation warning that applies.
    pub fn adapt_request(version: &str, body: &Value) -> Result<(CanonicalRequest, Option<DeprecationWarning>), InferenceError> {
        match ApiVersion::parse(version)? {
            ApiVersion::V1_0 => {
                let request: RequestV1_0 = serde_json::from_value(body.clone())?;
                let canonical = CanonicalRequest {
                    model_path: request.model,
                    inputs: request.inputs,
                    priority: request.priority,
                    timeout_ms: request.timeout_ms,
                    precision: Precision::Fp32,
                    batch_size: 1,
                };
                let warning = DeprecationWarning {
                    replacement: "2.0".to_string(),
                    deprecated_since: "1.1".to_string(),
                    removal_version: "3.0".to_string(),
                };
                Ok((canonical, Some(warning)))
            }
            ApiVersion::V1_1 => {
                let request: RequestV1_1 = serde_json::from_value(body.clone())?;
                let canonical = CanonicalRequest {
                    model_path: request.model,
                    inputs: request.inputs,
                    priority: request.priority,
                    timeout_ms: request.timeout_ms,
                    precision: request.precision.unwrap_or(Precision::Fp32),
                    batch_size: 1,
                };
                let warning = DeprecationWarning {
                    replacement: "2.0".to_string(),
                    deprecated_since: "2.0".to_string(),
                    removal_version: "3.0".to_string(),
                };
                Ok((canonical, Some(warning)))
            }
            ApiVersion::V2_0 => {
                let request: RequestV2_0 = serde_json::from_value(body.clone())?;
                let canonical = CanonicalRequest {
                    model_path: request.model_path,
                    inputs: request.inputs,
                    priority: request.priority,
                    timeout_ms: request.timeout_ms,
                    precision: request.precision,
                    batch_size: request.batch_size,
                };
                Ok((canonical, None))
            }
        }
    }

    /// Translates a canonical response back into the shape `version`
    /// expects. All three versions share the same response envelope today,
    /// so this currently passes the canonical response straight through -
    /// kept as a seam for the day a version needs a different shape.
    pub fn adapt_response(version: &str, response: &CanonicalResponse) -> Result<Value, InferenceError> {
        ApiVersion::parse(version)?;
        serde_json::to_value(response).map_err(InferenceError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_version_fails_registration() {
        assert!(ApiVersion::parse("0.9").is_err());
    }

    #[test]
    fn v1_0_request_translates_and_emits_deprecation_warning() {
        let body = serde_json::json!({"model": "m.onnx", "inputs": {}});
        let (canonical, warning) = ApiVersionAdapter::adapt_request("1.0", &body).unwrap();
        assert_eq!(canonical.model_path, "m.onnx");
        assert!(warning.is_some());
    }

    #[test]
    fn v1_1_request_translates_and_emits_deprecation_warning() {
        let body = serde_json::json!({"model": "m.onnx", "inputs": {}, "precision": "fp16"});
        let (canonical, warning) = ApiVersionAdapter::adapt_request("1.1", &body).unwrap();
        assert_eq!(canonical.model_path, "m.onnx");
        let warning = warning.expect("v1.1 still uses the deprecated `model` field");
        assert_eq!(warning.deprecated_since, "2.0");
    }

    #[test]
    fn v2_0_request_round_trips_without_warning() {
        let body = serde_json::json!({"model_path": "m.onnx", "inputs": {}, "precision": "fp16", "batch_size": 4});
        let (canonical, warning) = ApiVersionAdapter::adapt_request("2.0", &body).unwrap();
        assert_eq!(canonical.batch_size, 4);
        assert!(warning.is_none());
    }
}
