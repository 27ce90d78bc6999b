#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use tracing::{error, info, warn};

use crate::domain::{CpuLoadRequest, LoadKind, MemoryLoadRequest, MemorySettings};
use crate::error::LoadError;
use crate::metrics::Metrics;
use crate::shutdown::ShutdownSignal;

/// Runs the generators on behalf of the HTTP layer and turns every outcome,
/// failures included, into the response text.
#[derive(Clone)]
pub struct LoadRunner {
    shutdown: ShutdownSignal,
    metrics: Metrics,
    settings: MemorySettings,
}

impl LoadRunner {
    pub fn new(shutdown: ShutdownSignal, metrics: Metrics, settings: MemorySettings) -> Self {
        Self {
            shutdown,
            metrics,
            settings,
        }
    }

    pub fn settings(&self) -> &MemorySettings {
        &self.settings
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.is_triggered()
    }

    /// Blocks for the duration of the run.
    pub fn run_cpu(&self, req: CpuLoadRequest) -> String {
        info!(
            duration_seconds = req.duration.as_secs(),
            intensity = req.intensity,
            "cpu load request"
        );
        self.metrics.cpu_load_active.inc();
        let res = crate::lib_cpu::cpu_load(req, &self.shutdown, &self.metrics);
        self.metrics.cpu_load_active.dec();
        match res {
            Ok(report) => {
                if report.stopped_by_shutdown {
                    info!("cpu load stopped due to application shutdown");
                }
                info!(
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    calculations = report.calculations,
                    "cpu load completed"
                );
                report.to_string()
            }
            Err(e) => self.render_error(LoadKind::Cpu, &e),
        }
    }

    /// Blocks for the duration of the run.
    pub fn run_memory(&self, req: MemoryLoadRequest) -> String {
        info!(
            duration_seconds = req.duration.as_secs(),
            size_mb = req.size_mb,
            "memory load request"
        );
        self.metrics.memory_load_active.inc();
        let res = crate::lib_mem::memory_load(req, &self.settings, &self.shutdown, &self.metrics);
        self.metrics.memory_load_active.dec();
        match res {
            Ok(report) => {
                if report.stopped_by_shutdown {
                    info!("memory load stopped due to application shutdown");
                }
                info!(
                    elapsed_secs = report.elapsed.as_secs_f64(),
                    held_mb = report.held_mb(),
                    chunks = report.chunks,
                    "memory load completed"
                );
                report.to_string()
            }
            Err(e) => self.render_error(LoadKind::Memory, &e),
        }
    }

    fn render_error(&self, kind: LoadKind, e: &LoadError) -> String {
        match e {
            LoadError::ShuttingDown(_) => {
                info!(kind = kind.label(), "application is shutting down, load skipped");
                self.metrics
                    .load_requests_skipped_total
                    .with_label_values(&[kind.label()])
                    .inc();
            }
            LoadError::ResourceExhausted { .. } => {
                error!(kind = kind.label(), error = %e, "load aborted");
                self.metrics.memory_allocation_failures_total.inc();
            }
            LoadError::Interrupted => {
                warn!(kind = kind.label(), "load interrupted");
            }
        }
        e.to_string()
    }
}
