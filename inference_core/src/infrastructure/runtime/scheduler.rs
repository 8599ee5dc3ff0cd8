// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduler
//!
//! Admits inference tasks, asks the Fallback Coordinator for a device,
//! dispatches through a per-model [`SessionPool`], and enforces
//! `max_concurrent_inferences` across the process via a `tokio::Semaphore`.
//! Tasks beyond the available concurrency are queued - FIFO by default, or
//! by priority when priority scheduling is enabled - and drained by a
//! polling loop every 100 ms rather than a purely event-driven dispatch
//! (keeping a single polling cadence means the shared timer wheel, not N
//! bespoke wakeups, drives progress).

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{Notify, Semaphore};

use inference_core_domain::entities::InferenceTask;
use inference_core_domain::error::InferenceError;
use inference_core_domain::value_objects::{Priority, TaskId};

pub const DEFAULT_MAX_QUEUE_SIZE: usize = 1000;
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// §4.10: "processed FIFO, or by priority if priority scheduling is
/// enabled". `pop_next` dispatches on this rather than always sorting by
/// priority, so `Fifo` is a real, reachable ordering and not just a
/// declared-but-ignored config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueDiscipline {
    Fifo,
    Priority,
}

struct QueuedTask {
    task: InferenceTask,
}

impl QueuedTask {
    fn priority(&self) -> Priority {
        self.task.options().priority
    }
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub max_concurrent_inferences: usize,
    pub max_queue_size: usize,
    pub discipline: QueueDiscipline,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_inferences: 4,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            discipline: QueueDiscipline::Fifo,
        }
    }
}

pub enum SchedulerEvent {
    Queued(TaskId),
    Started(TaskId),
    Completed(TaskId),
    Error(TaskId, String),
}

/// Admits, queues, and dispatches inference tasks under a process-wide
/// concurrency cap. The queue is a plain insertion-ordered `VecDeque`;
/// `pop_next` decides how to read from it based on `config.discipline`
/// rather than the queue itself always being priority-ordered.
pub struct Scheduler {
    queue: Mutex<VecDeque<QueuedTask>>,
    concurrency: Arc<Semaphore>,
    config: SchedulerConfig,
    dispatch_notify: Notify,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            concurrency: Arc::new(Semaphore::new(config.max_concurrent_inferences)),
            config,
            dispatch_notify: Notify::new(),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Admits a task into the queue. Fails fast with `QueueFull` rather
    /// than blocking - callers are expected to retry with their own
    /// policy.
    pub fn submit(&self, task: InferenceTask) -> Result<TaskId, InferenceError> {
        let mut queue = self.queue.lock();
        if queue.len() >= self.config.max_queue_size {
            return Err(InferenceError::queue_full(format!(
                "queue at capacity ({})",
                self.config.max_queue_size
            )));
        }
        let task_id = task.task_id();
        queue.push_back(QueuedTask { task });
        drop(queue);
        self.dispatch_notify.notify_one();
        Ok(task_id)
    }

    /// `Fifo` pops the oldest queued task, full stop. `Priority` scans
    /// front-to-back for the highest-priority task, keeping the first
    /// (hence oldest) task on a tie, which reproduces "ties broken FIFO"
    /// without needing a separate sequence counter - `VecDeque` insertion
    /// order already is the sequence.
    fn pop_next(&self) -> Option<InferenceTask> {
        let mut queue = self.queue.lock();
        match self.config.discipline {
            QueueDiscipline::Fifo => queue.pop_front().map(|q| q.task),
            QueueDiscipline::Priority => {
                let mut best: Option<(usize, Priority)> = None;
                for (index, queued) in queue.iter().enumerate() {
                    let priority = queued.priority();
                    let better = match best {
                        Some((_, best_priority)) => priority > best_priority,
                        None => true,
                    };
                    if better {
                        best = Some((index, priority));
                    }
                }
                best.and_then(|(index, _)| queue.remove(index)).map(|q| q.task)
            }
        }
    }

    /// Runs the dispatch loop: every `POLL_INTERVAL`, pop tasks while a
    /// concurrency permit is available and hand each to `execute`, which
    /// owns device selection (through the Fallback Coordinator) and
    /// retries on its own. Never returns; intended to be spawned once per
    /// engine and left running for the process lifetime.
    pub async fn run_dispatch_loop<F, Fut>(self: Arc<Self>, execute: F)
    where
        F: Fn(InferenceTask) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let execute = Arc::new(execute);
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            while let Some(permit) = self.concurrency.clone().try_acquire_owned().ok() {
                let Some(mut task) = self.pop_next() else {
                    drop(permit);
                    break;
                };
                if task.start().is_err() {
                    continue;
                }
                let execute = execute.clone();
                tokio::spawn(async move {
                    execute(task).await;
                    drop(permit);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core_domain::entities::TaskOptions;
    use std::collections::HashMap;

    fn task(priority: Priority) -> InferenceTask {
        InferenceTask::new(
            "model.onnx",
            HashMap::new(),
            TaskOptions {
                priority,
                ..Default::default()
            },
        )
    }

    fn scheduler(max_queue: usize) -> Scheduler {
        Scheduler::new(SchedulerConfig {
            max_queue_size: max_queue,
            ..Default::default()
        })
    }

    fn priority_scheduler(max_queue: usize) -> Scheduler {
        Scheduler::new(SchedulerConfig {
            max_queue_size: max_queue,
            discipline: QueueDiscipline::Priority,
            ..Default::default()
        })
    }

    #[test]
    fn queue_full_fails_fast() {
        let scheduler = scheduler(1);
        scheduler.submit(task(Priority::NORMAL)).unwrap();
        assert!(matches!(
            scheduler.submit(task(Priority::NORMAL)),
            Err(InferenceError::QueueFull(_))
        ));
    }

    #[test]
    fn higher_priority_dequeues_first() {
        let scheduler = priority_scheduler(10);
        scheduler.submit(task(Priority::BACKGROUND)).unwrap();
        let interactive_id = scheduler.submit(task(Priority::INTERACTIVE)).unwrap();
        let popped = scheduler.pop_next().unwrap();
        assert_eq!(popped.task_id(), interactive_id);
    }

    #[test]
    fn equal_priority_is_fifo() {
        let scheduler = priority_scheduler(10);
        let first = scheduler.submit(task(Priority::NORMAL)).unwrap();
        let _second = scheduler.submit(task(Priority::NORMAL)).unwrap();
        let popped = scheduler.pop_next().unwrap();
        assert_eq!(popped.task_id(), first);
    }

    #[test]
    fn fifo_discipline_ignores_priority() {
        let scheduler = scheduler(10);
        let low_first = scheduler.submit(task(Priority::BACKGROUND)).unwrap();
        let _high_second = scheduler.submit(task(Priority::INTERACTIVE)).unwrap();
        let popped = scheduler.pop_next().unwrap();
        assert_eq!(popped.task_id(), low_first);
    }
}
