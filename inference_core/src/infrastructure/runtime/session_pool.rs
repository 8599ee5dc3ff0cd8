// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Session Pool
//!
//! Per-model pool of reusable [`InferenceSession`]s. `acquire` hands out an
//! existing idle session, creates a new one while under `max_pool_size`, or
//! waits on a `tokio::sync::Notify` up to `session_timeout`. `release`
//! returns a session to the idle set. A periodic idle sweep destroys
//! sessions beyond a configured floor once they've been idle past
//! `max_idle_time`.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use inference_core_domain::entities::InferenceSession;
use inference_core_domain::error::InferenceError;
use inference_core_domain::services::InferenceProvider;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::timeout;

#[derive(Debug, Clone)]
pub struct SessionPoolConfig {
    pub max_pool_size: usize,
    pub session_timeout: StdDuration,
    pub max_idle_time: Duration,
    pub idle_floor: usize,
}

impl Default for SessionPoolConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 4,
            session_timeout: StdDuration::from_secs(30),
            max_idle_time: Duration::minutes(5),
            idle_floor: 1,
        }
    }
}

struct PoolState {
    available: VecDeque<InferenceSession>,
    busy: usize,
}

pub struct SessionPool {
    provider: Arc<dyn InferenceProvider>,
    model_path: String,
    state: Mutex<PoolState>,
    notify: Notify,
    config: SessionPoolConfig,
}

impl SessionPool {
    pub fn new(provider: Arc<dyn InferenceProvider>, model_path: impl Into<String>, config: SessionPoolConfig) -> Self {
        Self {
            provider,
            model_path: model_path.into(),
            state: Mutex::new(PoolState {
                available: VecDeque::new(),
                busy: 0,
            }),
            notify: Notify::new(),
            config,
        }
    }

    pub fn warmup(&self, count: usize) -> Result<(), InferenceError> {
        let target = count.min(self.config.max_pool_size);
        let mut state = self.state.lock();
        while state.available.len() + state.busy < target {
            state.available.push_back(self.provider.load(&self.model_path)?);
        }
        Ok(())
    }

    pub async fn acquire(&self) -> Result<InferenceSession, InferenceError> {
        timeout(self.config.session_timeout, self.acquire_inner())
            .await
            .map_err(|_| InferenceError::timeout("session pool acquire timed out"))?
    }

    async fn acquire_inner(&self) -> Result<InferenceSession, InferenceError> {
        loop {
            {
                let mut state = self.state.lock();
                if let Some(session) = state.available.pop_front() {
                    state.busy += 1;
                    return Ok(session);
                }
                if state.busy < self.config.max_pool_size {
                    state.busy += 1;
                    drop(state);
                    return self.provider.load(&self.model_path);
                }
            }
            self.notify.notified().await;
        }
    }

    pub fn release(&self, mut session: InferenceSession) {
        session.touch();
        let mut state = self.state.lock();
        state.busy = state.busy.saturating_sub(1);
        state.available.push_back(session);
        drop(state);
        self.notify.notify_one();
    }

    /// Evicts idle sessions beyond `idle_floor` that have been idle longer
    /// than `max_idle_time`. Intended to be driven by the shared timer
    /// wheel.
    pub fn evict_idle(&self) -> usize {
        let mut state = self.state.lock();
        let floor = self.config.idle_floor;
        let mut evicted = 0;
        let mut kept = VecDeque::new();
        while let Some(session) = state.available.pop_front() {
            let total_remaining = kept.len() + state.available.len() + 1;
            if total_remaining > floor && session.is_idle_beyond(self.config.max_idle_time) {
                evicted += 1;
            } else {
                kept.push_back(session);
            }
        }
        state.available = kept;
        evicted
    }

    pub fn available_count(&self) -> usize {
        self.state.lock().available.len()
    }

    pub fn busy_count(&self) -> usize {
        self.state.lock().busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core_domain::error::InferenceError as Err;
    use inference_core_domain::services::inference_provider::{InferenceRequest, InferenceResponse};
    use inference_core_domain::value_objects::DeviceId;

    struct StubProvider;

    impl InferenceProvider for StubProvider {
        fn load(&self, model_path: &str) -> Result<InferenceSession, Err> {
            Ok(InferenceSession::new(model_path, DeviceId::new("cpu-0").unwrap()))
        }

        fn run(&self, _session: &InferenceSession, _request: InferenceRequest) -> Result<InferenceResponse, Err> {
            unimplemented!("not exercised by pool tests")
        }

        fn cancel(&self, _session: &InferenceSession) -> Result<(), Err> {
            Ok(())
        }

        fn unload(&self, _session: InferenceSession) -> Result<(), Err> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn acquire_and_release_round_trips() {
        let pool = SessionPool::new(Arc::new(StubProvider), "model.onnx", SessionPoolConfig::default());
        let session = pool.acquire().await.unwrap();
        assert_eq!(pool.busy_count(), 1);
        pool.release(session);
        assert_eq!(pool.busy_count(), 0);
        assert_eq!(pool.available_count(), 1);
    }

    #[tokio::test]
    async fn warmup_creates_up_to_target() {
        let pool = SessionPool::new(Arc::new(StubProvider), "model.onnx", SessionPoolConfig::default());
        pool.warmup(2).unwrap();
        assert_eq!(pool.available_count(), 2);
    }

    #[test]
    fn pool_invariant_available_plus_busy_never_exceeds_max() {
        let config = SessionPoolConfig {
            max_pool_size: 2,
            ..Default::default()
        };
        let pool = SessionPool::new(Arc::new(StubProvider), "model.onnx", config);
        pool.warmup(5).unwrap();
        assert!(pool.available_count() + pool.busy_count() <= 2);
    }
}
