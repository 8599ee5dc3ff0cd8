// /////////////////////////////////////////////////////////////////////////////
// Local Inference Runtime
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Hardware Probe
//!
//! One-shot inventory of CPU/GPU/NPU capability, producing a scored
//! [`Device`] per detected unit. Probing is idempotent and cheap enough to
//! run on every periodic hot-plug re-probe (default every 5 minutes); the
//! scores themselves are pure functions of the detected capability bits, so
//! calling [`CpuProbe::probe`] twice with the same hardware always yields
//! the same score.
//!
//! Real vendor enumeration (CPUID, `/sys/class/drm`, NPU vendor SDKs) is
//! deliberately left to a platform-specific adapter layered on top of
//! these probes; what lives here is the scoring formula and the
//! `DeviceProbe` port implementations that compose it.

use inference_core_domain::entities::Device;
use inference_core_domain::error::InferenceError;
use inference_core_domain::services::DeviceProbe;
use inference_core_domain::value_objects::{DeviceId, DeviceKind, PerformanceScore};

/// Raw capability readings for one CPU, prior to scoring.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuCapabilitySample {
    pub cores: u32,
    pub speed_ghz: f64,
    pub avx: bool,
    pub avx2: bool,
    pub avx512: bool,
    pub fma: bool,
    pub aes: bool,
    pub tier_bonus: u32,
}

/// `cores*10 + speed*5 + simd_bonus + fma:15 + aes:10 + tier_bonus`, capped
/// at 1000.
pub fn score_cpu(sample: &CpuCapabilitySample) -> u32 {
    let simd_bonus = if sample.avx512 {
        50
    } else if sample.avx2 {
        30
    } else if sample.avx {
        20
    } else {
        0
    };
    let mut score = sample.cores * 10;
    score += (sample.speed_ghz * 5.0) as u32;
    score += simd_bonus;
    score += if sample.fma { 15 } else { 0 };
    score += if sample.aes { 10 } else { 0 };
    score += sample.tier_bonus;
    score.min(1000)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GpuCapabilitySample {
    pub vram_mb: u32,
    pub vendor_bonus: u32,
    pub model_bonus: u32,
    pub laptop_penalty: u32,
}

/// `vram_mb/10 + vendor_bonus + model_bonus - laptop_penalty`, capped at
/// 1000, floored at 0.
pub fn score_gpu(sample: &GpuCapabilitySample) -> u32 {
    let raw = (sample.vram_mb / 10 + sample.vendor_bonus + sample.model_bonus) as i64
        - sample.laptop_penalty as i64;
    raw.clamp(0, 1000) as u32
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NpuCapabilitySample {
    pub apple_ne: bool,
    pub amd: bool,
    pub intel_gna: bool,
    pub arm_ethos: bool,
    pub qualcomm: bool,
}

/// `max(apple_ne:300, amd:250, intel_gna:200, arm_ethos:180, qualcomm:150)`,
/// or `None` if no NPU vendor tag is set.
pub fn score_npu(sample: &NpuCapabilitySample) -> Option<u32> {
    let mut best = None;
    let mut consider = |present: bool, score: u32| {
        if present {
            best = Some(best.unwrap_or(0).max(score));
        }
    };
    consider(sample.apple_ne, 300);
    consider(sample.amd, 250);
    consider(sample.intel_gna, 200);
    consider(sample.arm_ethos, 180);
    consider(sample.qualcomm, 150);
    best
}

fn normalize(raw: u32) -> PerformanceScore {
    PerformanceScore::new(raw as f64 / 1000.0)
}

/// Probes the CPU installed in this machine. Vendor enumeration (CPUID on
/// x86, `/proc/cpuinfo` parsing, or a platform crate) is injected via
/// `sample_fn` so this stays testable without real hardware.
pub struct CpuProbe<F: Fn() -> CpuCapabilitySample + Send + Sync> {
    sample_fn: F,
    max_concurrent: usize,
}

impl<F: Fn() -> CpuCapabilitySample + Send + Sync> CpuProbe<F> {
    pub fn new(sample_fn: F, max_concurrent: usize) -> Self {
        Self { sample_fn, max_concurrent }
    }
}

impl<F: Fn() -> CpuCapabilitySample + Send + Sync> DeviceProbe for CpuProbe<F> {
    fn probe(&self) -> Result<Vec<Device>, InferenceError> {
        let sample = (self.sample_fn)();
        let mut bits = 0u32;
        if sample.avx {
            bits |= 1 << 0;
        }
        if sample.avx2 {
            bits |= 1 << 1;
        }
        if sample.avx512 {
            bits |= 1 << 2;
        }
        if sample.fma {
            bits |= 1 << 3;
        }
        if sample.aes {
            bits |= 1 << 4;
        }
        let score = normalize(score_cpu(&sample));
        Ok(vec![Device::new(
            DeviceId::new("cpu-0")?,
            DeviceKind::Cpu,
            "CPU",
            bits,
            score,
            self.max_concurrent,
        )])
    }
}

/// Probes discrete/integrated GPUs via an injected vendor enumeration.
pub struct GpuProbe<F: Fn() -> Vec<(String, GpuCapabilitySample, u32)> + Send + Sync> {
    sample_fn: F,
}

impl<F: Fn() -> Vec<(String, GpuCapabilitySample, u32)> + Send + Sync> GpuProbe<F> {
    pub fn new(sample_fn: F) -> Self {
        Self { sample_fn }
    }
}

impl<F: Fn() -> Vec<(String, GpuCapabilitySample, u32)> + Send + Sync> DeviceProbe for GpuProbe<F> {
    fn probe(&self) -> Result<Vec<Device>, InferenceError> {
        (self.sample_fn)()
            .into_iter()
            .enumerate()
            .map(|(index, (name, sample, bits))| {
                let score = normalize(score_gpu(&sample));
                Ok(Device::new(
                    DeviceId::new(format!("gpu-{index}"))?,
                    DeviceKind::Gpu,
                    name,
                    bits,
                    score,
                    1,
                ))
            })
            .collect()
    }
}

/// Probes NPU presence via vendor-specific device enumeration.
pub struct NpuProbe<F: Fn() -> Option<(NpuCapabilitySample, u32)> + Send + Sync> {
    sample_fn: F,
}

impl<F: Fn() -> Option<(NpuCapabilitySample, u32)> + Send + Sync> NpuProbe<F> {
    pub fn new(sample_fn: F) -> Self {
        Self { sample_fn }
    }
}

impl<F: Fn() -> Option<(NpuCapabilitySample, u32)> + Send + Sync> DeviceProbe for NpuProbe<F> {
    fn probe(&self) -> Result<Vec<Device>, InferenceError> {
        match (self.sample_fn)() {
            Some((sample, bits)) => match score_npu(&sample) {
                Some(raw) => Ok(vec![Device::new(
                    DeviceId::new("npu-0")?,
                    DeviceKind::Npu,
                    "Neural Processing Unit",
                    bits,
                    normalize(raw),
                    1,
                )]),
                None => Ok(vec![]),
            },
            None => Ok(vec![]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_score_caps_at_1000() {
        let sample = CpuCapabilitySample {
            cores: 64,
            speed_ghz: 5.0,
            avx512: true,
            fma: true,
            aes: true,
            tier_bonus: 500,
            ..Default::default()
        };
        assert_eq!(score_cpu(&sample), 1000);
    }

    #[test]
    fn cpu_score_prefers_widest_simd_tier() {
        let base = CpuCapabilitySample {
            cores: 4,
            speed_ghz: 2.0,
            ..Default::default()
        };
        let avx = CpuCapabilitySample { avx: true, ..base };
        let avx2 = CpuCapabilitySample { avx2: true, ..base };
        let avx512 = CpuCapabilitySample { avx512: true, ..base };
        assert!(score_cpu(&avx2) > score_cpu(&avx));
        assert!(score_cpu(&avx512) > score_cpu(&avx2));
    }

    #[test]
    fn gpu_score_never_goes_negative() {
        let sample = GpuCapabilitySample {
            vram_mb: 100,
            laptop_penalty: 10_000,
            ..Default::default()
        };
        assert_eq!(score_gpu(&sample), 0);
    }

    #[test]
    fn npu_score_picks_highest_vendor_tag() {
        let sample = NpuCapabilitySample {
            amd: true,
            qualcomm: true,
            ..Default::default()
        };
        assert_eq!(score_npu(&sample), Some(250));
    }

    #[test]
    fn npu_score_is_none_without_vendor_tags() {
        assert_eq!(score_npu(&NpuCapabilitySample::default()), None);
    }

    #[test]
    fn cpu_probe_emits_one_device() {
        let probe = CpuProbe::new(
            || CpuCapabilitySample {
                cores: 8,
                speed_ghz: 3.5,
                avx2: true,
                fma: true,
                ..Default::default()
            },
            7,
        );
        let devices = probe.probe().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].kind(), DeviceKind::Cpu);
    }
}
