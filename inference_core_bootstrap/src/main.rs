// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Composition Root
//!
//! Parses and validates the CLI, loads the engine configuration, probes the
//! local hardware, wires a provider per device, constructs the
//! [`InferenceEngine`], and dispatches the requested command. `serve`
//! additionally installs signal handling and blocks until a shutdown signal
//! arrives.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use inference_core::{Device, EngineConfig, InferenceEngine, InferenceError, TaskOptions};
use inference_core_domain::entities::InferenceSession;
use inference_core_domain::services::{DeviceProbe, InferenceProvider, InferenceRequest, InferenceResponse};
use inference_core_domain::value_objects::{DeviceId, DeviceKind, PerformanceScore};

use inference_core_bootstrap::cli::{parse_and_validate, ValidatedCommand};
use inference_core_bootstrap::{config, exit_code, shutdown, signals};

/// Stand-in provider for hosts with no model-execution backend wired up.
/// Model runtimes (ONNX Runtime, llama.cpp, CoreML, DirectML, ...) are
/// explicitly out of scope here; this adapter loads any path and echoes
/// back the input lengths as output, enough to exercise scheduling,
/// fallback, and the cache end to end without a real backend present.
struct EchoProvider {
    device_id: DeviceId,
}

impl InferenceProvider for EchoProvider {
    fn load(&self, model_path: &str) -> Result<InferenceSession, InferenceError> {
        Ok(InferenceSession::new(model_path, self.device_id.clone()))
    }

    fn run(&self, _session: &InferenceSession, request: InferenceRequest) -> Result<InferenceResponse, InferenceError> {
        let outputs = request
            .inputs
            .iter()
            .map(|(k, v)| (k.clone(), vec![v.len() as f32]))
            .collect();
        Ok(InferenceResponse { outputs, latency_ms: 1.0 })
    }

    fn cancel(&self, _session: &InferenceSession) -> Result<(), InferenceError> {
        Ok(())
    }

    fn unload(&self, _session: InferenceSession) -> Result<(), InferenceError> {
        Ok(())
    }
}

fn cpu_sample() -> inference_core::infrastructure::runtime::hardware_probe::CpuCapabilitySample {
    inference_core::infrastructure::runtime::hardware_probe::CpuCapabilitySample {
        cores: std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(1),
        speed_ghz: 3.0,
        avx2: true,
        fma: true,
        ..Default::default()
    }
}

/// Probes the CPU and pairs each discovered device with an [`EchoProvider`].
/// GPU/NPU vendor enumeration requires a platform-specific adapter beyond
/// this binary's scope, so only the CPU is probed here.
fn probe_devices(config: &EngineConfig) -> Result<Vec<(Device, Arc<dyn InferenceProvider>)>, InferenceError> {
    let mut devices = Vec::new();
    if config.enable_cpu {
        let probe = inference_core::infrastructure::runtime::hardware_probe::CpuProbe::new(cpu_sample, config.max_workers);
        for device in probe.probe()? {
            let provider: Arc<dyn InferenceProvider> = Arc::new(EchoProvider {
                device_id: device.id().clone(),
            });
            devices.push((device, provider));
        }
    }
    if devices.is_empty() {
        devices.push((
            Device::new(DeviceId::new("cpu-0")?, DeviceKind::Cpu, "CPU", 0, PerformanceScore::new(0.5), config.max_workers),
            Arc::new(EchoProvider {
                device_id: DeviceId::new("cpu-0")?,
            }) as Arc<dyn InferenceProvider>,
        ));
    }
    Ok(devices)
}

fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let validated = match parse_and_validate() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("error: {err}");
            return exit_code::ExitCode::Usage.into();
        }
    };

    init_logging(validated.verbose);

    let result = run(validated).await;
    exit_code::result_to_exit_code(result)
}

async fn run(validated: inference_core_bootstrap::cli::ValidatedCli) -> Result<(), InferenceError> {
    let engine_config = config::load_engine_config(validated.config.as_deref(), validated.cpu_threads)
        .map_err(|err| InferenceError::invalid_input(err.to_string()))?;

    match validated.command {
        ValidatedCommand::Serve => {
            let devices = probe_devices(&engine_config)?;
            let _engine = InferenceEngine::new(engine_config, devices)?;

            let coordinator = shutdown::ShutdownCoordinator::default();
            signals::install(coordinator.clone());
            tracing::info!("engine started, awaiting shutdown signal");
            coordinator.token().cancelled().await;
            coordinator.complete_shutdown();
            Ok(())
        }
        ValidatedCommand::Infer {
            model,
            inputs,
            priority,
            precision,
            timeout_ms,
        } => {
            let devices = probe_devices(&engine_config)?;
            let engine = InferenceEngine::new(engine_config, devices)?;

            let options = TaskOptions {
                priority,
                precision,
                timeout_ms,
                ..TaskOptions::default()
            };
            let task_id = engine.submit_inference(model.to_string_lossy(), inputs.into_iter().collect::<HashMap<_, _>>(), options)?;
            let outcome = tokio::time::timeout(Duration::from_millis(timeout_ms), engine.await_inference(task_id))
                .await
                .map_err(|_| InferenceError::timeout("inference did not complete within the requested timeout"))??;
            let dto: inference_core::presentation::InferenceResponseDto = outcome.into();
            println!("{}", serde_json::to_string_pretty(&dto).map_err(|e| InferenceError::internal(e.to_string()))?);
            Ok(())
        }
        ValidatedCommand::Probe => {
            let devices = probe_devices(&engine_config)?;
            for (device, _) in &devices {
                println!(
                    "{:>4} {:<28} score={:.3} concurrency={}",
                    device.kind(),
                    device.name(),
                    device.performance_score().value(),
                    device.max_concurrent()
                );
            }
            Ok(())
        }
        ValidatedCommand::Stats => {
            let devices = probe_devices(&engine_config)?;
            let engine = InferenceEngine::new(engine_config, devices)?;
            let dto: inference_core::presentation::StatsDto = engine.stats().into();
            println!("{}", serde_json::to_string_pretty(&dto).map_err(|e| InferenceError::internal(e.to_string()))?);
            Ok(())
        }
        ValidatedCommand::Chunk {
            file,
            chunk_size,
            overlap_size,
        } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| InferenceError::invalid_input(format!("failed to read {}: {e}", file.display())))?;
            let chunks = inference_core::chunk_document(
                &text,
                &inference_core::infrastructure::runtime::worker_pool::ChunkingConfig {
                    chunk_size,
                    overlap_size,
                },
            );
            for chunk in chunks {
                println!("{chunk}");
            }
            Ok(())
        }
    }
}
