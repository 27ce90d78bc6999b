#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::domain::{CpuLoadReport, CpuLoadRequest, LoadKind};
use crate::error::LoadError;
use crate::metrics::Metrics;
use crate::shutdown::ShutdownSignal;

const SAMPLE_RANGE: std::ops::RangeInclusive<u32> = 10_000..=99_999;
const SHUTDOWN_CHECK_EVERY: u64 = 10;

/// Sleep inserted after every factorization: 0 ms at intensity 100, 20 ms at 0.
pub fn throttle_delay(intensity: u32) -> Duration {
    let intensity = intensity.min(100);
    Duration::from_millis(u64::from((100 - intensity) / 5))
}

pub fn find_prime_factors(mut number: u32) -> Vec<u32> {
    let mut factors = Vec::new();
    let mut i = 2;
    while i <= number {
        while number % i == 0 {
            factors.push(i);
            number /= i;
        }
        i += 1;
    }
    factors
}

pub fn cpu_load(
    req: CpuLoadRequest,
    shutdown: &ShutdownSignal,
    mtr: &Metrics,
) -> Result<CpuLoadReport, LoadError> {
    if shutdown.is_triggered() {
        return Err(LoadError::ShuttingDown(LoadKind::Cpu));
    }
    let delay = throttle_delay(req.intensity);
    let mut rng = rand::thread_rng();
    let start = Instant::now();
    // None: the duration does not fit an Instant, run until shutdown
    let end = start.checked_add(req.duration);
    let mut calculations = 0u64;

    while !end.is_some_and(|end| Instant::now() >= end) && !shutdown.is_triggered() {
        let factors = find_prime_factors(rng.gen_range(SAMPLE_RANGE));
        let _ = std::hint::black_box(factors);
        calculations += 1;
        mtr.cpu_calculations_total.inc();

        if !delay.is_zero() && shutdown.sleep(delay).is_err() {
            info!(calculations, "cpu load interrupted during throttle sleep");
            break;
        }

        if calculations % SHUTDOWN_CHECK_EVERY == 0 && shutdown.is_triggered() {
            debug!(calculations, "shutdown detected, stopping cpu load");
            break;
        }
    }

    Ok(CpuLoadReport {
        calculations,
        elapsed: start.elapsed(),
        stopped_by_shutdown: shutdown.is_triggered(),
    })
}
