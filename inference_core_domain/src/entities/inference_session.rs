// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Session
//!
//! A hardware-bound, reusable executor for one model, owned by the Session
//! Pool. The domain entity tracks only identity and idle bookkeeping; the
//! actual provider handle lives behind the `InferenceProvider` port so this
//! crate never depends on any concrete runtime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DeviceId, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceSession {
    session_id: SessionId,
    model_path: String,
    device_id: DeviceId,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

impl InferenceSession {
    pub fn new(model_path: impl Into<String>, device_id: DeviceId) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            model_path: model_path.into(),
            device_id,
            created_at: now,
            last_used: now,
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub fn touch(&mut self) {
        self.last_used = Utc::now();
    }

    pub fn idle_for(&self) -> chrono::Duration {
        Utc::now() - self.last_used
    }

    pub fn is_idle_beyond(&self, max_idle: chrono::Duration) -> bool {
        self.idle_for() > max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_session_is_not_idle() {
        let session = InferenceSession::new("model.onnx", DeviceId::new("cpu-0").unwrap());
        assert!(!session.is_idle_beyond(chrono::Duration::seconds(1)));
    }
}
