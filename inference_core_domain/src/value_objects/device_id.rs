// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Device Identifier
//!
//! A validated, stable identifier for a probed device: non-empty, cheap to
//! clone, `Display`, and round-trips through `serde`.

use crate::error::InferenceError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Result<Self, InferenceError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InferenceError::invalid_input("device id must not be empty"));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(DeviceId::new("").is_err());
        assert!(DeviceId::new("   ").is_err());
    }

    #[test]
    fn accepts_valid() {
        let id = DeviceId::new("npu-0").unwrap();
        assert_eq!(id.as_str(), "npu-0");
        assert_eq!(id.to_string(), "npu-0");
    }
}
