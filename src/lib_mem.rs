#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use prometheus::IntGauge;
use std::collections::TryReserveError;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::domain::{LoadKind, MemoryLoadReport, MemoryLoadRequest, MemorySettings};
use crate::error::LoadError;
use crate::metrics::Metrics;
use crate::shutdown::ShutdownSignal;

pub const MB: usize = 1024 * 1024;
pub const TOUCH_STRIDE: usize = 1024;

pub struct MemoryBlock {
    bytes: Vec<u8>,
}

impl MemoryBlock {
    pub fn allocate(len: usize) -> Result<Self, TryReserveError> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(len)?;
        bytes.resize(len, 0);
        Ok(Self { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn touch(&mut self, marker: u8) {
        for b in self.bytes.iter_mut().step_by(TOUCH_STRIDE) {
            *b = marker;
        }
        let _ = std::hint::black_box(&mut self.bytes);
    }

    pub fn is_touched(&self) -> bool {
        self.bytes.iter().step_by(TOUCH_STRIDE).all(|b| *b != 0)
    }
}

// full chunks of chunk_mb, then the remainder
pub fn chunk_plan(size_mb: u32, chunk_mb: u32) -> Vec<usize> {
    let total = size_mb as usize * MB;
    let chunk = chunk_mb.max(1) as usize * MB;
    let mut plan = vec![chunk; total / chunk];
    if total % chunk != 0 {
        plan.push(total % chunk);
    }
    plan
}

/// Owning collection of chunks. Keeps `demo_memory_held_bytes` in step with
/// what is actually held, including when dropped on an error path.
pub struct ChunkSet {
    blocks: Vec<MemoryBlock>,
    held_bytes: usize,
    complete: bool,
    gauge: IntGauge,
}

impl ChunkSet {
    fn new(gauge: IntGauge) -> Self {
        Self {
            blocks: Vec::new(),
            held_bytes: 0,
            complete: false,
            gauge,
        }
    }

    fn push(&mut self, block: MemoryBlock) {
        self.held_bytes += block.len();
        self.gauge.add(gauge_delta(block.len()));
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[MemoryBlock] {
        &self.blocks
    }

    pub fn held_bytes(&self) -> usize {
        self.held_bytes
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn touch_all(&mut self, marker: u8) {
        for block in &mut self.blocks {
            block.touch(marker);
        }
    }
}

impl Drop for ChunkSet {
    fn drop(&mut self) {
        self.gauge.sub(gauge_delta(self.held_bytes));
    }
}

fn gauge_delta(bytes: usize) -> i64 {
    i64::try_from(bytes).unwrap_or(i64::MAX)
}

fn touch_marker(pass: u32) -> u8 {
    // 1..=255, never zero
    (pass % 255) as u8 + 1
}

/// Allocates and touches every chunk in `plan`, pausing between chunks.
/// Stops early, with an incomplete set, if shutdown is triggered.
pub fn allocate_chunks(
    plan: &[usize],
    pause: Duration,
    shutdown: &ShutdownSignal,
    mtr: &Metrics,
) -> Result<ChunkSet, LoadError> {
    let mut set = ChunkSet::new(mtr.memory_held_bytes.clone());
    for (idx, &len) in plan.iter().enumerate() {
        if shutdown.is_triggered() {
            info!(allocated = idx, planned = plan.len(), "shutdown during allocation");
            return Ok(set);
        }
        let mut block = match MemoryBlock::allocate(len) {
            Ok(b) => b,
            Err(source) => {
                let requested = plan.iter().fold(0usize, |acc, n| acc.saturating_add(*n));
                warn!(chunk = idx, error = %source, "chunk allocation failed");
                return Err(LoadError::ResourceExhausted {
                    allocated_mb: (set.held_bytes() / MB) as u64,
                    requested_mb: (requested / MB) as u64,
                    source,
                });
            }
        };
        block.touch(touch_marker(0));
        set.push(block);
        debug!(chunk = idx, held_bytes = set.held_bytes(), "chunk allocated");
        if idx + 1 < plan.len() && shutdown.sleep(pause).is_err() {
            info!(allocated = idx + 1, planned = plan.len(), "shutdown during allocation");
            return Ok(set);
        }
    }
    set.complete = true;
    Ok(set)
}

pub fn hold_chunks(
    set: &mut ChunkSet,
    duration: Duration,
    interval: Duration,
    shutdown: &ShutdownSignal,
) {
    let deadline = Instant::now().checked_add(duration);
    let mut pass = 0u32;
    loop {
        let now = Instant::now();
        if deadline.is_some_and(|d| now >= d) || shutdown.is_triggered() {
            break;
        }
        pass = pass.wrapping_add(1);
        set.touch_all(touch_marker(pass));
        let nap = deadline.map_or(interval, |d| (d - now).min(interval));
        if shutdown.sleep(nap).is_err() {
            info!(pass, "memory hold interrupted by shutdown");
            break;
        }
    }
}

pub fn memory_load(
    req: MemoryLoadRequest,
    settings: &MemorySettings,
    shutdown: &ShutdownSignal,
    mtr: &Metrics,
) -> Result<MemoryLoadReport, LoadError> {
    if shutdown.is_triggered() {
        return Err(LoadError::ShuttingDown(LoadKind::Memory));
    }
    let start = Instant::now();
    let size_mb = req.size_mb.min(settings.ceiling_mb);
    let plan = chunk_plan(size_mb, settings.chunk_mb);
    let mut set = allocate_chunks(&plan, settings.chunk_pause, shutdown, mtr)?;
    info!(
        chunks = set.blocks().len(),
        held_mb = set.held_bytes() / MB,
        complete = set.is_complete(),
        "memory allocated"
    );
    if set.is_complete() {
        hold_chunks(&mut set, req.duration, settings.hold_interval, shutdown);
    }
    let report = MemoryLoadReport {
        requested_mb: size_mb,
        held_bytes: set.held_bytes() as u64,
        chunks: set.blocks().len(),
        elapsed: start.elapsed(),
        stopped_by_shutdown: shutdown.is_triggered(),
    };
    drop(set);
    Ok(report)
}
