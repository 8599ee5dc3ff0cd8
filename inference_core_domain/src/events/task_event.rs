// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Task Events
//!
//! Emitted by the Scheduler as a task moves through admission, dispatch,
//! and completion. Consumed by the Cache Statistics Monitor's latency
//! tracking and by any external observer subscribed through the engine
//! facade.

use serde::{Deserialize, Serialize};

use crate::value_objects::{DeviceKind, TaskId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TaskEvent {
    Queued { task_id: TaskId },
    Started { task_id: TaskId, device: DeviceKind },
    Completed { task_id: TaskId, device: DeviceKind, latency_ms: f64 },
    Error { task_id: TaskId, message: String },
    Cancelled { task_id: TaskId },
}

impl TaskEvent {
    pub fn task_id(&self) -> TaskId {
        match self {
            TaskEvent::Queued { task_id }
            | TaskEvent::Started { task_id, .. }
            | TaskEvent::Completed { task_id, .. }
            | TaskEvent::Error { task_id, .. }
            | TaskEvent::Cancelled { task_id } => *task_id,
        }
    }
}
