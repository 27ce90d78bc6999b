#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::metrics::Metrics;
use crate::service::LoadRunner;

pub const DEFAULT_CPU_DURATION_SECONDS: i64 = 5;
pub const DEFAULT_INTENSITY: i64 = 80;
pub const DEFAULT_MEMORY_DURATION_SECONDS: i64 = 30;
pub const DEFAULT_SIZE_MB: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadKind {
    Cpu,
    Memory,
}

impl LoadKind {
    pub fn label(self) -> &'static str {
        match self {
            LoadKind::Cpu => "cpu",
            LoadKind::Memory => "memory",
        }
    }
}

impl std::fmt::Display for LoadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadKind::Cpu => f.write_str("CPU"),
            LoadKind::Memory => f.write_str("Memory"),
        }
    }
}

/// Raw `/api/cpu-load` query string.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuLoadParams {
    #[serde(default = "default_cpu_duration")]
    pub duration_seconds: i64,
    #[serde(default = "default_intensity")]
    pub intensity: i64,
}

impl Default for CpuLoadParams {
    fn default() -> Self {
        Self {
            duration_seconds: DEFAULT_CPU_DURATION_SECONDS,
            intensity: DEFAULT_INTENSITY,
        }
    }
}

/// Raw `/api/memory-load` query string.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryLoadParams {
    #[serde(rename = "sizeInMB", default = "default_size_mb")]
    pub size_in_mb: i64,
    #[serde(default = "default_memory_duration")]
    pub duration_seconds: i64,
}

impl Default for MemoryLoadParams {
    fn default() -> Self {
        Self {
            size_in_mb: DEFAULT_SIZE_MB,
            duration_seconds: DEFAULT_MEMORY_DURATION_SECONDS,
        }
    }
}

fn default_cpu_duration() -> i64 {
    DEFAULT_CPU_DURATION_SECONDS
}

fn default_intensity() -> i64 {
    DEFAULT_INTENSITY
}

fn default_memory_duration() -> i64 {
    DEFAULT_MEMORY_DURATION_SECONDS
}

fn default_size_mb() -> i64 {
    DEFAULT_SIZE_MB
}

/// Normalized CPU load request; `intensity` is always within `0..=100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CpuLoadRequest {
    pub duration: Duration,
    pub intensity: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryLoadRequest {
    pub duration: Duration,
    pub size_mb: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemorySettings {
    pub ceiling_mb: u32,
    pub chunk_mb: u32,
    pub chunk_pause: Duration,
    pub hold_interval: Duration,
}

impl Default for MemorySettings {
    fn default() -> Self {
        crate::config::AppConfig::default().memory_settings()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CpuLoadReport {
    pub calculations: u64,
    pub elapsed: Duration,
    pub stopped_by_shutdown: bool,
}

impl std::fmt::Display for CpuLoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CPU load completed: {} calculations in {:.2} seconds",
            self.calculations,
            self.elapsed.as_secs_f64()
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryLoadReport {
    pub requested_mb: u32,
    pub held_bytes: u64,
    pub chunks: usize,
    pub elapsed: Duration,
    pub stopped_by_shutdown: bool,
}

impl MemoryLoadReport {
    pub fn held_mb(&self) -> u64 {
        self.held_bytes / crate::lib_mem::MB as u64
    }
}

impl std::fmt::Display for MemoryLoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Memory load completed: held {} MB in {} chunks for {:.2} seconds",
            self.held_mb(),
            self.chunks,
            self.elapsed.as_secs_f64()
        )
    }
}

#[derive(Clone)]
pub struct AppState {
    pub runner: LoadRunner,
    pub metrics: Metrics,
}
