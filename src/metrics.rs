#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use anyhow::{Context, Result as AnyResult};
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub cpu_load_active: IntGauge,
    pub cpu_calculations_total: IntCounter,
    pub memory_load_active: IntGauge,
    pub memory_held_bytes: IntGauge,
    pub memory_allocation_failures_total: IntCounter,
    pub load_requests_skipped_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> AnyResult<Self> {
        let registry = Registry::new();
        let cpu_load_active = IntGauge::with_opts(Opts::new(
            "demo_cpu_load_active",
            "cpu load runs in progress",
        ))
        .context("create cpu_load_active")?;
        let cpu_calculations_total = IntCounter::with_opts(Opts::new(
            "demo_cpu_calculations_total",
            "prime factorizations performed",
        ))
        .context("create cpu_calculations_total")?;
        registry
            .register(Box::new(cpu_load_active.clone()))
            .context("register cpu_load_active")?;
        registry
            .register(Box::new(cpu_calculations_total.clone()))
            .context("register cpu_calculations_total")?;
        let memory_load_active = IntGauge::with_opts(Opts::new(
            "demo_memory_load_active",
            "memory load runs in progress",
        ))
        .context("create memory_load_active")?;
        let memory_held_bytes = IntGauge::with_opts(Opts::new(
            "demo_memory_held_bytes",
            "bytes currently held by memory load runs",
        ))
        .context("create memory_held_bytes")?;
        let memory_allocation_failures_total = IntCounter::with_opts(Opts::new(
            "demo_memory_allocation_failures_total",
            "memory load runs aborted by a failed allocation",
        ))
        .context("create memory_allocation_failures_total")?;
        registry
            .register(Box::new(memory_load_active.clone()))
            .context("register memory_load_active")?;
        registry
            .register(Box::new(memory_held_bytes.clone()))
            .context("register memory_held_bytes")?;
        registry
            .register(Box::new(memory_allocation_failures_total.clone()))
            .context("register memory_allocation_failures_total")?;
        let load_requests_skipped_total = IntCounterVec::new(
            Opts::new(
                "demo_load_requests_skipped_total",
                "load requests skipped because shutdown was in progress",
            ),
            &["kind"],
        )
        .context("create load_requests_skipped_total")?;
        registry
            .register(Box::new(load_requests_skipped_total.clone()))
            .context("register load_requests_skipped_total")?;
        Ok(Self {
            registry,
            cpu_load_active,
            cpu_calculations_total,
            memory_load_active,
            memory_held_bytes,
            memory_allocation_failures_total,
            load_requests_skipped_total,
        })
    }

    pub fn encode_text(&self) -> AnyResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        let mf = self.registry.gather();
        encoder.encode(&mf, &mut buf).context("encode metrics")?;
        Ok(buf)
    }
}
