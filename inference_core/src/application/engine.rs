// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Inference Engine
//!
//! The facade composing every infrastructure adapter into the single
//! object the presentation layer (and the bootstrap crate's CLI) drives.
//! `InferenceEngine` owns the scheduler's dispatch loop and a single
//! periodic maintenance loop - cache aging, promotion/demotion sweeps,
//! circuit breaker polling, resource sweeps, session eviction - all on one
//! shared cadence rather than a timer per subsystem.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Duration;
use parking_lot::Mutex;
use tokio::sync::oneshot;

use inference_core_domain::entities::{Device, InferenceTask, SharingPolicy, TaskOptions};
use inference_core_domain::error::InferenceError;
use inference_core_domain::services::inference_provider::{InferenceProvider, InferenceRequest, InferenceResponse};
use inference_core_domain::value_objects::{CacheTierId, ChunkKey, DeviceId, Precision, TaskId};

use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::metrics::{EngineMetrics, MetricsSnapshot};
use crate::infrastructure::runtime::api_version_adapter::{ApiVersionAdapter, CanonicalResponse, DeprecationWarning};
use crate::infrastructure::runtime::cache_layers::{build_tiers, CacheLayer};
use crate::infrastructure::runtime::cache_stats_monitor::{AlertThresholds, CacheStatisticsMonitor, CacheTierStats};
use crate::infrastructure::runtime::device_tracker::DevicePerformanceTracker;
use crate::infrastructure::runtime::fallback_coordinator::{FallbackConfig, FallbackCoordinator};
use crate::infrastructure::runtime::graceful_degradation::{DegradationConfig, GracefulDegradationManager};
use crate::infrastructure::runtime::memory_pool::{GcThresholds, SharedMemoryPool};
use crate::infrastructure::runtime::promotion_manager::{PromotionConfig, PromotionManager};
use crate::infrastructure::runtime::resource_sharing::{AccessMode, ResourceSharingManager};
use crate::infrastructure::runtime::scheduler::{QueueDiscipline, Scheduler, SchedulerConfig};
use crate::infrastructure::runtime::session_pool::{SessionPool, SessionPoolConfig};
use crate::infrastructure::runtime::worker_pool::{ChunkingConfig, WorkerPool, WorkerPoolConfig};

/// How often the engine's single maintenance loop runs cache aging,
/// promotion/demotion sweeps, circuit breaker polling, and the resource /
/// session reclaim sweeps.
const MAINTENANCE_INTERVAL: StdDuration = StdDuration::from_secs(5);

/// The result of one completed inference task.
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub task_id: TaskId,
    pub outputs: HashMap<String, Vec<f32>>,
    pub latency_ms: f64,
    pub device_id: String,
}

/// A point-in-time snapshot of engine health, suitable for a `/stats`
/// endpoint or periodic logging.
#[derive(Debug, Clone)]
pub struct EngineStats {
    pub queue_depth: usize,
    pub metrics: MetricsSnapshot,
    pub l1: CacheTierStats,
    pub l2: CacheTierStats,
    pub l3: CacheTierStats,
    pub resource_count: usize,
}

type ResultSender = oneshot::Sender<Result<InferenceOutcome, InferenceError>>;
type ResultReceiver = oneshot::Receiver<Result<InferenceOutcome, InferenceError>>;

/// Composes the scheduler, fallback coordinator, per-device session pools,
/// the three-tier embedding cache, the shared memory pool, graceful
/// degradation, and metrics into the engine's public surface:
/// submit/await/cancel inference, cache get/put, and resource sharing.
pub struct InferenceEngine {
    config: EngineConfig,
    scheduler: Arc<Scheduler>,
    fallback: Arc<FallbackCoordinator>,
    providers: HashMap<DeviceId, Arc<dyn InferenceProvider>>,
    session_pools: Mutex<HashMap<(DeviceId, String), Arc<SessionPool>>>,
    l1: Arc<CacheLayer>,
    l2: Arc<CacheLayer>,
    l3: Arc<CacheLayer>,
    promotion: Arc<PromotionManager>,
    cache_stats: Arc<CacheStatisticsMonitor>,
    resources: Arc<ResourceSharingManager>,
    degradation: Arc<GracefulDegradationManager>,
    worker_pool: Arc<WorkerPool>,
    chunking: ChunkingConfig,
    metrics: Arc<EngineMetrics>,
    cancel_flags: Mutex<HashMap<TaskId, Arc<AtomicBool>>>,
    result_senders: Mutex<HashMap<TaskId, ResultSender>>,
    result_receivers: Mutex<HashMap<TaskId, ResultReceiver>>,
}

impl InferenceEngine {
    /// Builds the engine from a validated configuration and the set of
    /// probed devices paired with the provider that can run models on
    /// them. Spawns the scheduler's dispatch loop and the maintenance loop
    /// on the current Tokio runtime; both run for the engine's lifetime.
    pub fn new(config: EngineConfig, providers: Vec<(Device, Arc<dyn InferenceProvider>)>) -> Result<Arc<Self>, InferenceError> {
        config.validate()?;
        if providers.is_empty() {
            return Err(InferenceError::invalid_input("at least one device must be registered"));
        }

        let mut fallback_devices = Vec::with_capacity(providers.len());
        let mut provider_map = HashMap::with_capacity(providers.len());
        for (device, provider) in providers {
            fallback_devices.push((device.clone(), Arc::new(DevicePerformanceTracker::new())));
            provider_map.insert(device.id().clone(), provider);
        }

        let fallback = Arc::new(FallbackCoordinator::new(
            fallback_devices,
            FallbackConfig {
                cooldown: Duration::milliseconds(config.fallback_cooldown_ms as i64),
                load_balancing: config.load_balancing,
                ..FallbackConfig::default()
            },
        ));

        let scheduler = Arc::new(Scheduler::new(SchedulerConfig {
            max_concurrent_inferences: config.max_workers,
            max_queue_size: config.max_queue_size,
            discipline: if config.priority_scheduling {
                QueueDiscipline::Priority
            } else {
                QueueDiscipline::Fifo
            },
        }));

        let ((l1, l1_rx), (l2, l2_rx), (l3, l3_rx)) = build_tiers(config.cache_sizes);
        let (l1, l2, l3) = (Arc::new(l1), Arc::new(l2), Arc::new(l3));
        let promotion = Arc::new(PromotionManager::new(l1.clone(), l2.clone(), l3.clone(), PromotionConfig::default()));

        let cache_stats = Arc::new(CacheStatisticsMonitor::new(AlertThresholds {
            min_hit_rate: config.alert_thresholds.hit_rate,
            max_latency_ms: config.alert_thresholds.latency_ms,
            max_error_rate: config.alert_thresholds.error_rate,
        }));

        let pool = Arc::new(SharedMemoryPool::new(
            config.pool_size_bytes,
            GcThresholds {
                utilization: config.gc_threshold,
                ..GcThresholds::default()
            },
        )?);
        let resources = Arc::new(ResourceSharingManager::new(pool));

        let degradation = Arc::new(GracefulDegradationManager::new(DegradationConfig {
            failure_threshold: config.circuit_breaker_threshold,
            circuit_breaker_timeout: Duration::milliseconds(config.circuit_breaker_timeout_ms as i64),
            ..DegradationConfig::default()
        }));

        let worker_pool = Arc::new(WorkerPool::new(WorkerPoolConfig {
            max_workers: config.max_workers,
            ..WorkerPoolConfig::default()
        })?);

        let engine = Arc::new(Self {
            config,
            scheduler,
            fallback,
            providers: provider_map,
            session_pools: Mutex::new(HashMap::new()),
            l1,
            l2,
            l3,
            promotion,
            cache_stats,
            resources,
            degradation,
            worker_pool,
            chunking: ChunkingConfig::default(),
            metrics: Arc::new(EngineMetrics::default()),
            cancel_flags: Mutex::new(HashMap::new()),
            result_senders: Mutex::new(HashMap::new()),
            result_receivers: Mutex::new(HashMap::new()),
        });

        let dispatch_engine = engine.clone();
        let scheduler_for_loop = engine.scheduler.clone();
        tokio::spawn(scheduler_for_loop.run_dispatch_loop(move |task| {
            let engine = dispatch_engine.clone();
            async move { engine.run_task(task).await }
        }));

        let maintenance_engine = engine.clone();
        tokio::spawn(async move { maintenance_engine.run_maintenance_loop(l1_rx, l2_rx, l3_rx).await });

        Ok(engine)
    }

    /// Admits a new inference task. Returns immediately with the task's id;
    /// call [`Self::await_inference`] to block on the result.
    pub fn submit_inference(
        &self,
        model_path: impl Into<String>,
        inputs: HashMap<String, String>,
        options: TaskOptions,
    ) -> Result<TaskId, InferenceError> {
        let task = InferenceTask::new(model_path, inputs, options);
        let task_id = task.task_id();

        let (tx, rx) = oneshot::channel();
        self.cancel_flags.lock().insert(task_id, Arc::new(AtomicBool::new(false)));
        self.result_senders.lock().insert(task_id, tx);
        self.result_receivers.lock().insert(task_id, rx);

        if let Err(err) = self.scheduler.submit(task) {
            self.cancel_flags.lock().remove(&task_id);
            self.result_senders.lock().remove(&task_id);
            self.result_receivers.lock().remove(&task_id);
            return Err(err);
        }

        self.metrics.inference_submitted.increment();
        self.metrics.queue_depth.set(self.scheduler.queue_len() as u64);
        Ok(task_id)
    }

    /// Awaits the result of a previously submitted task. Consumes the
    /// task's result channel - calling this twice for the same id returns
    /// `InvalidInput` on the second call.
    pub async fn await_inference(&self, task_id: TaskId) -> Result<InferenceOutcome, InferenceError> {
        let rx = self
            .result_receivers
            .lock()
            .remove(&task_id)
            .ok_or_else(|| InferenceError::invalid_input(format!("unknown or already-awaited task {task_id}")))?;
        rx.await.map_err(|_| InferenceError::internal("task result channel closed before completion"))?
    }

    /// Requests cancellation of a queued or in-flight task. Cancellation is
    /// best-effort: a task already past device selection when the flag is
    /// observed still runs to completion, since the provider contract does
    /// not guarantee mid-call cancellation on every backend.
    pub fn cancel(&self, task_id: TaskId) -> Result<(), InferenceError> {
        let flag = self
            .cancel_flags
            .lock()
            .get(&task_id)
            .cloned()
            .ok_or_else(|| InferenceError::invalid_input(format!("unknown task {task_id}")))?;
        flag.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Looks an embedding up across the tier hierarchy, L1 first, scoring
    /// the access for promotion/demotion on a hit.
    pub fn cache_get(&self, key: &ChunkKey) -> Option<Vec<f32>> {
        for tier in [&self.l1, &self.l2, &self.l3] {
            if let Some(entry) = tier.get(key) {
                self.promotion.on_access(tier.tier_id(), key, &entry);
                return Some(entry.vector().to_vec());
            }
        }
        None
    }

    /// Inserts a freshly computed embedding into the cold tier; repeated
    /// access promotes it upward over time.
    pub fn cache_put(&self, key: ChunkKey, vector: Vec<f32>, metadata: serde_json::Value) {
        self.l3.set(key, vector, metadata);
    }

    pub fn share_resource(&self, resource_id: impl Into<String>, data: Vec<u8>, policy: SharingPolicy) -> Result<String, InferenceError> {
        self.resources.share(resource_id, data, policy)
    }

    pub fn access_resource(&self, resource_id: &str, plugin_id: &str, mode: AccessMode) -> Result<Vec<u8>, InferenceError> {
        self.resources.access(resource_id, plugin_id, mode)
    }

    pub fn release_resource(&self, resource_id: &str) -> Result<(), InferenceError> {
        self.resources.release(resource_id)
    }

    /// Runs `op` through the named feature's circuit breaker, following the
    /// same degrade-then-fallback contract as every other degradable
    /// feature in the engine.
    pub async fn execute_degradable<T, Op, OpFut, Fb, FbFut>(&self, feature: &str, op: Op, fallback: Fb) -> Result<T, InferenceError>
    where
        Op: FnOnce() -> OpFut,
        OpFut: std::future::Future<Output = Result<T, InferenceError>>,
        Fb: FnOnce() -> FbFut,
        FbFut: std::future::Future<Output = Result<T, InferenceError>>,
    {
        self.degradation.execute(feature, op, fallback).await
    }

    /// Chunks a document on the worker pool (sentence-aware, with word
    /// overlap) independent of inference, waiting up to the pool's
    /// configured `task_timeout` for the result.
    pub async fn chunk_document(&self, text: impl Into<String>) -> Result<Vec<String>, InferenceError> {
        let receiver = self.worker_pool.submit_chunking(text.into(), self.chunking.clone())?;
        let timeout = self.worker_pool.task_timeout();
        tokio::task::spawn_blocking(move || {
            receiver
                .recv_timeout(timeout)
                .map_err(|_| InferenceError::timeout("worker pool chunking task timed out"))
        })
        .await
        .map_err(|e| InferenceError::internal(format!("chunking task panicked: {e}")))?
    }

    /// Translates a versioned (`1.0`/`1.1`/`2.0`) inference request envelope
    /// into the canonical form and submits it, returning the task id and
    /// any deprecation warning the version carries.
    pub fn submit_inference_versioned(
        &self,
        version: &str,
        body: &serde_json::Value,
    ) -> Result<(TaskId, Option<DeprecationWarning>), InferenceError> {
        let (canonical, warning) = ApiVersionAdapter::adapt_request(version, body)?;
        let inputs = canonical
            .inputs
            .into_iter()
            .map(|(k, v)| (k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
            .collect();
        let options = TaskOptions {
            priority: inference_core_domain::value_objects::Priority::new(canonical.priority),
            precision: canonical.precision,
            ..TaskOptions::default()
        };
        let task_id = self.submit_inference(canonical.model_path, inputs, options)?;
        Ok((task_id, warning))
    }

    /// Renders a completed outcome back into the shape `version` expects.
    pub fn render_outcome_versioned(&self, version: &str, outcome: &InferenceOutcome) -> Result<serde_json::Value, InferenceError> {
        let response = CanonicalResponse {
            outputs: outcome
                .outputs
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                .collect(),
            latency_ms: outcome.latency_ms,
            device_kind: outcome.device_id.clone(),
        };
        ApiVersionAdapter::adapt_response(version, &response)
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            queue_depth: self.scheduler.queue_len(),
            metrics: self.metrics.snapshot(),
            l1: self.cache_stats.snapshot(CacheTierId::L1),
            l2: self.cache_stats.snapshot(CacheTierId::L2),
            l3: self.cache_stats.snapshot(CacheTierId::L3),
            resource_count: self.resources.resource_count(),
        }
    }

    fn is_cancelled(&self, task_id: TaskId) -> bool {
        self.cancel_flags
            .lock()
            .get(&task_id)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn finish_task(&self, task_id: TaskId, result: Result<InferenceOutcome, InferenceError>) {
        if let Some(tx) = self.result_senders.lock().remove(&task_id) {
            let _ = tx.send(result);
        }
        self.cancel_flags.lock().remove(&task_id);
    }

    fn session_pool_for(&self, device_id: &DeviceId, model_path: &str) -> Result<Arc<SessionPool>, InferenceError> {
        let key = (device_id.clone(), model_path.to_string());
        let mut pools = self.session_pools.lock();
        if let Some(pool) = pools.get(&key) {
            return Ok(pool.clone());
        }
        let provider = self
            .providers
            .get(device_id)
            .ok_or_else(|| InferenceError::device_unavailable(format!("no provider registered for {device_id}")))?
            .clone();
        let pool = Arc::new(SessionPool::new(
            provider,
            model_path.to_string(),
            SessionPoolConfig {
                max_pool_size: self.config.max_pool_size,
                ..SessionPoolConfig::default()
            },
        ));
        pools.insert(key, pool.clone());
        Ok(pool)
    }

    async fn run_on_device(
        &self,
        task_id: TaskId,
        device_id: &DeviceId,
        model_path: &str,
        inputs: HashMap<String, String>,
        precision: Precision,
    ) -> Result<InferenceResponse, InferenceError> {
        let pool = self.session_pool_for(device_id, model_path)?;
        let session = pool.acquire().await?;
        let provider = self
            .providers
            .get(device_id)
            .ok_or_else(|| InferenceError::device_unavailable(format!("no provider registered for {device_id}")))?;
        if self.is_cancelled(task_id) {
            let _ = provider.cancel(&session);
            pool.release(session);
            return Err(InferenceError::cancelled("task cancelled while dispatching to device"));
        }
        let result = provider.run(&session, InferenceRequest { inputs, precision });
        pool.release(session);
        result
    }

    /// Drives one task from device selection through completion: asks the
    /// Fallback Coordinator for a device, retries across the fallback chain
    /// on failure (recording each attempt's outcome), and resolves the
    /// task's result channel. This is the async analog of
    /// `FallbackCoordinator::execute_with_fallback`, needed because session
    /// acquisition can await a `Notify`.
    async fn run_task(self: Arc<Self>, mut task: InferenceTask) {
        let task_id = task.task_id();

        if self.is_cancelled(task_id) {
            let _ = task.cancel();
            self.finish_task(task_id, Err(InferenceError::cancelled("task cancelled before dispatch")));
            return;
        }

        let model_path = task.model_path().to_string();
        let inputs = task.inputs().clone();
        let precision = task.options().precision;

        let attempts = self.providers.len().max(1);
        let mut last_error = InferenceError::device_unavailable("no devices registered");
        let mut outcome = None;

        for _ in 0..attempts {
            if self.is_cancelled(task_id) {
                last_error = InferenceError::cancelled("task cancelled during fallback retries");
                break;
            }
            let device_id = match self.fallback.select("inference") {
                Ok(id) => id,
                Err(err) => {
                    last_error = err;
                    break;
                }
            };
            let started = std::time::Instant::now();
            match self.run_on_device(task_id, &device_id, &model_path, inputs.clone(), precision).await {
                Ok(response) => {
                    self.fallback.record_outcome(&device_id, started.elapsed().as_millis() as f64, true);
                    self.metrics.inference_latency.observe(response.latency_ms);
                    outcome = Some(InferenceOutcome {
                        task_id,
                        outputs: response.outputs,
                        latency_ms: response.latency_ms,
                        device_id: device_id.to_string(),
                    });
                    break;
                }
                Err(err) => {
                    self.fallback.record_outcome(&device_id, started.elapsed().as_millis() as f64, false);
                    last_error = err;
                }
            }
        }

        self.metrics.queue_depth.set(self.scheduler.queue_len() as u64);

        match outcome {
            Some(outcome) => {
                let _ = task.complete();
                self.metrics.inference_completed.increment();
                self.finish_task(task_id, Ok(outcome));
            }
            None => {
                let _ = task.fail();
                self.metrics.inference_failed.increment();
                let final_error = match last_error {
                    InferenceError::Cancelled(_) => last_error,
                    other => InferenceError::all_devices_failed(other.to_string()),
                };
                self.finish_task(task_id, Err(final_error));
            }
        }
    }

    /// The engine's single background cadence: drains cache events into the
    /// statistics monitor, ages the L2 frequency table, sweeps
    /// promotions/demotions, polls every circuit breaker, reclaims expired
    /// shared resources, and evicts idle sessions - all on one timer
    /// instead of one per subsystem.
    async fn run_maintenance_loop(
        self: Arc<Self>,
        l1_rx: crossbeam::channel::Receiver<inference_core_domain::events::CacheEvent>,
        l2_rx: crossbeam::channel::Receiver<inference_core_domain::events::CacheEvent>,
        l3_rx: crossbeam::channel::Receiver<inference_core_domain::events::CacheEvent>,
    ) {
        loop {
            tokio::time::sleep(MAINTENANCE_INTERVAL).await;

            self.cache_stats.drain(CacheTierId::L1, &l1_rx);
            self.cache_stats.drain(CacheTierId::L2, &l2_rx);
            self.cache_stats.drain(CacheTierId::L3, &l3_rx);
            self.cache_stats.set_cache_size(CacheTierId::L1, self.l1.len());
            self.cache_stats.set_cache_size(CacheTierId::L2, self.l2.len());
            self.cache_stats.set_cache_size(CacheTierId::L3, self.l3.len());
            for tier in CacheTierId::LOCK_ORDER {
                self.cache_stats.sample_now(tier);
            }

            self.l2.age();
            self.promotion.sweep_promotions();
            self.promotion.sweep_demotions();

            self.degradation.run_health_checks();
            self.resources.sweep();

            for pool in self.session_pools.lock().values() {
                pool.evict_idle();
            }

            self.metrics
                .cache_hit_rate_permille
                .set((self.cache_stats.snapshot(CacheTierId::L1).hit_rate * 1000.0) as u64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inference_core_domain::entities::{InferenceSession, SharingPolicyKind};
    use inference_core_domain::value_objects::DeviceKind;

    struct StubProvider {
        device_id: DeviceId,
    }

    impl InferenceProvider for StubProvider {
        fn load(&self, model_path: &str) -> Result<InferenceSession, InferenceError> {
            Ok(InferenceSession::new(model_path, self.device_id.clone()))
        }

        fn run(&self, _session: &InferenceSession, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
            Ok(InferenceResponse {
                outputs: HashMap::from([("logits".to_string(), vec![1.0, 2.0])]),
                latency_ms: if request.inputs.is_empty() { 1.0 } else { 2.0 },
            })
        }

        fn cancel(&self, _session: &InferenceSession) -> Result<(), InferenceError> {
            Ok(())
        }

        fn unload(&self, _session: InferenceSession) -> Result<(), InferenceError> {
            Ok(())
        }
    }

    fn device(id: &str, kind: DeviceKind) -> Device {
        Device::new(
            DeviceId::new(id).unwrap(),
            kind,
            id,
            0,
            inference_core_domain::value_objects::PerformanceScore::new(0.8),
            2,
        )
    }

    fn test_engine() -> Arc<InferenceEngine> {
        let cpu_id = DeviceId::new("cpu-0").unwrap();
        let providers: Vec<(Device, Arc<dyn InferenceProvider>)> = vec![(
            device("cpu-0", DeviceKind::Cpu),
            Arc::new(StubProvider { device_id: cpu_id }),
        )];
        InferenceEngine::new(EngineConfig::default(), providers).unwrap()
    }

    #[tokio::test]
    async fn submit_and_await_round_trips_a_result() {
        let engine = test_engine();
        let task_id = engine
            .submit_inference("model.onnx", HashMap::new(), TaskOptions::default())
            .unwrap();
        let outcome = engine.await_inference(task_id).await.unwrap();
        assert_eq!(outcome.device_id, "cpu-0");
        assert!(outcome.outputs.contains_key("logits"));
    }

    #[tokio::test]
    async fn cancelling_before_dispatch_surfaces_cancelled_error() {
        let engine = test_engine();
        let task_id = engine
            .submit_inference("model.onnx", HashMap::new(), TaskOptions::default())
            .unwrap();
        engine.cancel(task_id).unwrap();
        let result = engine.await_inference(task_id).await;
        assert!(matches!(result, Err(InferenceError::Cancelled(_))));
    }

    #[test]
    fn cache_put_then_get_round_trips_through_l3() {
        let engine = test_engine();
        let key = ChunkKey::new("doc-1", 0);
        engine.cache_put(key.clone(), vec![0.1, 0.2], serde_json::json!({}));
        assert_eq!(engine.cache_get(&key), Some(vec![0.1, 0.2]));
    }

    #[test]
    fn cache_get_miss_returns_none() {
        let engine = test_engine();
        assert_eq!(engine.cache_get(&ChunkKey::new("doc-1", 99)), None);
    }

    #[test]
    fn share_and_access_resource_round_trips() {
        let engine = test_engine();
        let id = engine
            .share_resource(
                "r1",
                vec![1, 2, 3],
                SharingPolicy {
                    kind: SharingPolicyKind::SharedWrite,
                    ttl: chrono::Duration::seconds(60),
                    max_refs: 4,
                    allowed_plugins: None,
                },
            )
            .unwrap();
        let bytes = engine.access_resource(&id, "plugin-a", AccessMode::Read).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }

    #[test]
    fn stats_reflects_submitted_metric() {
        let engine = test_engine();
        let _ = engine.submit_inference("model.onnx", HashMap::new(), TaskOptions::default());
        assert_eq!(engine.stats().metrics.inference_submitted, 1);
    }

    #[tokio::test]
    async fn chunk_document_splits_long_text() {
        let engine = test_engine();
        let chunks = engine.chunk_document("A. B. C. D.").await.unwrap();
        assert!(!chunks.is_empty());
    }

    #[test]
    fn submit_inference_versioned_translates_v1_request() {
        let engine = test_engine();
        let body = serde_json::json!({"model": "model.onnx", "inputs": {}});
        let (_task_id, warning) = engine.submit_inference_versioned("1.0", &body).unwrap();
        assert!(warning.is_some());
    }
}
