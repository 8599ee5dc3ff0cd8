// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Task
//!
//! A unit of scheduled inference work. Owned by the Scheduler from
//! admission until release; status only moves forward through the state
//! machine below, never backward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::InferenceError;
use crate::value_objects::{Precision, Priority, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Queued,
    Running,
    Completed,
    Error,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOptions {
    pub priority: Priority,
    pub timeout_ms: u64,
    pub precision: Precision,
    pub batch_size: usize,
    pub deadline: Option<DateTime<Utc>>,
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self {
            priority: Priority::default(),
            timeout_ms: 30_000,
            precision: Precision::Fp32,
            batch_size: 1,
            deadline: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceTask {
    task_id: TaskId,
    model_path: String,
    inputs: HashMap<String, String>,
    options: TaskOptions,
    created_at: DateTime<Utc>,
    status: TaskStatus,
}

impl InferenceTask {
    pub fn new(
        model_path: impl Into<String>,
        inputs: HashMap<String, String>,
        options: TaskOptions,
    ) -> Self {
        Self {
            task_id: TaskId::new(),
            model_path: model_path.into(),
            inputs,
            options,
            created_at: Utc::now(),
            status: TaskStatus::Queued,
        }
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn model_path(&self) -> &str {
        &self.model_path
    }

    pub fn inputs(&self) -> &HashMap<String, String> {
        &self.inputs
    }

    pub fn options(&self) -> &TaskOptions {
        &self.options
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn is_expired(&self) -> bool {
        self.options
            .deadline
            .map(|deadline| Utc::now() > deadline)
            .unwrap_or(false)
    }

    pub fn start(&mut self) -> Result<(), InferenceError> {
        self.transition(TaskStatus::Queued, TaskStatus::Running)
    }

    pub fn complete(&mut self) -> Result<(), InferenceError> {
        self.transition(TaskStatus::Running, TaskStatus::Completed)
    }

    pub fn fail(&mut self) -> Result<(), InferenceError> {
        self.transition(TaskStatus::Running, TaskStatus::Error)
    }

    pub fn cancel(&mut self) -> Result<(), InferenceError> {
        match self.status {
            TaskStatus::Queued | TaskStatus::Running => {
                self.status = TaskStatus::Cancelled;
                Ok(())
            }
            _ => Err(InferenceError::invalid_input(format!(
                "cannot cancel task {} in terminal state",
                self.task_id
            ))),
        }
    }

    fn transition(&mut self, expected: TaskStatus, next: TaskStatus) -> Result<(), InferenceError> {
        if self.status != expected {
            return Err(InferenceError::invalid_input(format!(
                "task {} expected status {:?}, found {:?}",
                self.task_id, expected, self.status
            )));
        }
        self.status = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InferenceTask {
        InferenceTask::new("model.onnx", HashMap::new(), TaskOptions::default())
    }

    #[test]
    fn lifecycle_happy_path() {
        let mut task = sample();
        assert_eq!(task.status(), TaskStatus::Queued);
        task.start().unwrap();
        assert_eq!(task.status(), TaskStatus::Running);
        task.complete().unwrap();
        assert_eq!(task.status(), TaskStatus::Completed);
    }

    #[test]
    fn cannot_complete_before_running() {
        let mut task = sample();
        assert!(task.complete().is_err());
    }

    #[test]
    fn cancel_from_queued_or_running() {
        let mut task = sample();
        task.cancel().unwrap();
        assert_eq!(task.status(), TaskStatus::Cancelled);

        let mut task = sample();
        task.start().unwrap();
        task.cancel().unwrap();
        assert_eq!(task.status(), TaskStatus::Cancelled);
    }

    #[test]
    fn cancel_terminal_state_fails() {
        let mut task = sample();
        task.start().unwrap();
        task.complete().unwrap();
        assert!(task.cancel().is_err());
    }
}
