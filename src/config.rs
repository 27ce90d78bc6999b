#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use clap::Parser;
use std::time::Duration;

use crate::domain::MemorySettings;

pub const DEFAULT_BIND: &str = "0.0.0.0:8080";
pub const DEFAULT_MEMORY_CEILING_MB: u32 = 350;
pub const DEFAULT_CHUNK_MB: u32 = 10;
pub const DEFAULT_CHUNK_PAUSE_MS: u64 = 50;
pub const DEFAULT_HOLD_INTERVAL_MS: u64 = 500;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

/// Runtime configuration. Every flag can also be set from the environment,
/// which is how the container deployment passes it.
#[derive(Clone, Debug, Parser)]
#[command(name = "autoscale-load-demo", version, about)]
pub struct AppConfig {
    /// Address the HTTP server listens on.
    #[arg(long, env = "LOAD_DEMO_BIND", default_value = DEFAULT_BIND)]
    pub bind: String,

    /// Upper bound for `sizeInMB` on the memory endpoint.
    #[arg(long, env = "LOAD_DEMO_MEMORY_CEILING_MB", default_value_t = DEFAULT_MEMORY_CEILING_MB)]
    pub memory_ceiling_mb: u32,

    #[arg(long, env = "LOAD_DEMO_CHUNK_MB", default_value_t = DEFAULT_CHUNK_MB)]
    pub chunk_mb: u32,

    /// Pause between chunk allocations.
    #[arg(long, env = "LOAD_DEMO_CHUNK_PAUSE_MS", default_value_t = DEFAULT_CHUNK_PAUSE_MS)]
    pub chunk_pause_ms: u64,

    /// Upper bound on each sleep while memory is held.
    #[arg(long, env = "LOAD_DEMO_HOLD_INTERVAL_MS", default_value_t = DEFAULT_HOLD_INTERVAL_MS)]
    pub hold_interval_ms: u64,

    /// How long in-flight requests get after SIGTERM before the server is
    /// torn down.
    #[arg(long, env = "LOAD_DEMO_SHUTDOWN_GRACE_SECS", default_value_t = DEFAULT_SHUTDOWN_GRACE_SECS)]
    pub shutdown_grace_secs: u64,
}

impl AppConfig {
    pub fn memory_settings(&self) -> MemorySettings {
        MemorySettings {
            ceiling_mb: self.memory_ceiling_mb,
            chunk_mb: self.chunk_mb,
            chunk_pause: Duration::from_millis(self.chunk_pause_ms),
            hold_interval: Duration::from_millis(self.hold_interval_ms),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            memory_ceiling_mb: DEFAULT_MEMORY_CEILING_MB,
            chunk_mb: DEFAULT_CHUNK_MB,
            chunk_pause_ms: DEFAULT_CHUNK_PAUSE_MS,
            hold_interval_ms: DEFAULT_HOLD_INTERVAL_MS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}
