#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod lib_cpu;
pub mod lib_mem;
pub mod metrics;
pub mod service;
pub mod shutdown;
pub mod validation;

pub use config::AppConfig;
pub use domain::{AppState, CpuLoadRequest, MemoryLoadRequest, MemorySettings};
pub use error::LoadError;
pub use http::{build_state, routes, serve};
pub use http::{generate_cpu_load, generate_memory_load, healthz, home, scrape_metrics};
pub use metrics::Metrics;
pub use service::LoadRunner;
pub use shutdown::ShutdownSignal;
pub use validation::validate_config;
