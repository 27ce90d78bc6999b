#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{bail, Result as AnyResult};
use std::time::Duration;

use crate::config::AppConfig;
use crate::domain::{CpuLoadParams, CpuLoadRequest, MemoryLoadParams, MemoryLoadRequest};

pub fn clamp_intensity(intensity: i64) -> u32 {
    u32::try_from(intensity.clamp(0, 100)).unwrap_or(100)
}

pub fn clamp_size_mb(size_mb: i64, ceiling_mb: u32) -> u32 {
    u32::try_from(size_mb.clamp(0, i64::from(ceiling_mb))).unwrap_or(ceiling_mb)
}

fn duration_from_seconds(seconds: i64) -> Duration {
    Duration::from_secs(seconds.max(0).unsigned_abs())
}

pub fn normalize_cpu(params: &CpuLoadParams) -> CpuLoadRequest {
    CpuLoadRequest {
        duration: duration_from_seconds(params.duration_seconds),
        intensity: clamp_intensity(params.intensity),
    }
}

pub fn normalize_memory(params: &MemoryLoadParams, ceiling_mb: u32) -> MemoryLoadRequest {
    MemoryLoadRequest {
        duration: duration_from_seconds(params.duration_seconds),
        size_mb: clamp_size_mb(params.size_in_mb, ceiling_mb),
    }
}

pub fn validate_config(cfg: &AppConfig) -> AnyResult<()> {
    if cfg.bind.trim().is_empty() { bail!("bind address is empty"); }
    if cfg.chunk_mb == 0 { bail!("chunk_mb must be > 0"); }
    if cfg.memory_ceiling_mb == 0 { bail!("memory_ceiling_mb must be > 0"); }
    if cfg.chunk_mb > cfg.memory_ceiling_mb {
        bail!(format!(
            "chunk_mb ({}) must not exceed memory_ceiling_mb ({})",
            cfg.chunk_mb, cfg.memory_ceiling_mb
        ));
    }
    if cfg.hold_interval_ms == 0 { bail!("hold_interval_ms must be > 0"); }
    Ok(())
}
