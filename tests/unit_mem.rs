#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use std::thread;
use std::time::{Duration, Instant};

use autoscale_load_demo::domain::{MemoryLoadRequest, MemorySettings};
use autoscale_load_demo::lib_mem::{allocate_chunks, chunk_plan, memory_load, MemoryBlock, MB};
use autoscale_load_demo::{LoadError, Metrics, ShutdownSignal};

fn fast_settings() -> MemorySettings {
    MemorySettings {
        chunk_pause: Duration::from_millis(5),
        hold_interval: Duration::from_millis(100),
        ..MemorySettings::default()
    }
}

#[test]
fn plan_splits_into_chunks_and_remainder() {
    assert_eq!(chunk_plan(25, 10), vec![10 * MB, 10 * MB, 5 * MB]);
    assert_eq!(chunk_plan(20, 10), vec![10 * MB, 10 * MB]);
    assert_eq!(chunk_plan(3, 10), vec![3 * MB]);
    assert_eq!(chunk_plan(3, 1), vec![MB; 3]);
    assert!(chunk_plan(0, 10).is_empty());
}

#[test]
fn block_touch_marks_every_stride() {
    let mut block = MemoryBlock::allocate(64 * 1024).expect("alloc");
    assert_eq!(block.len(), 64 * 1024);
    assert!(!block.is_touched());
    block.touch(7);
    assert!(block.is_touched());
}

#[test]
fn allocates_three_touched_chunks_for_25mb() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let plan = chunk_plan(25, 10);
    let set = allocate_chunks(&plan, Duration::from_millis(5), &shutdown, &m).expect("alloc");
    assert!(set.is_complete());
    let sizes: Vec<usize> = set.blocks().iter().map(MemoryBlock::len).collect();
    assert_eq!(sizes, vec![10 * MB, 10 * MB, 5 * MB]);
    assert!(set.blocks().iter().all(MemoryBlock::is_touched));
    assert_eq!(set.held_bytes(), 25 * MB);
    assert_eq!(m.memory_held_bytes.get(), i64::try_from(25 * MB).expect("fits"));
    drop(set);
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn holds_then_releases() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let req = MemoryLoadRequest { duration: Duration::from_secs(1), size_mb: 12 };
    let report = memory_load(req, &fast_settings(), &shutdown, &m).expect("ok");
    assert_eq!(report.held_mb(), 12);
    assert_eq!(report.chunks, 2);
    assert!(report.elapsed >= Duration::from_secs(1));
    assert!(!report.stopped_by_shutdown);
    assert_eq!(m.memory_held_bytes.get(), 0);
    assert!(report.to_string().starts_with("Memory load completed: held 12 MB in 2 chunks for "));
}

#[test]
fn skipped_when_already_shutting_down() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();
    let started = Instant::now();
    let req = MemoryLoadRequest { duration: Duration::from_secs(30), size_mb: 100 };
    let err = memory_load(req, &fast_settings(), &shutdown, &m).expect_err("skipped");
    assert!(matches!(err, LoadError::ShuttingDown(_)));
    assert_eq!(
        err.to_string(),
        "Application is shutting down, Memory load generation skipped"
    );
    assert!(started.elapsed() < Duration::from_millis(50));
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn shutdown_mid_hold_releases_within_interval() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let settings = MemorySettings {
        hold_interval: Duration::from_millis(500),
        ..fast_settings()
    };
    let trigger = shutdown.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        let at = Instant::now();
        trigger.trigger();
        at
    });
    let req = MemoryLoadRequest { duration: Duration::from_secs(30), size_mb: 5 };
    let report = memory_load(req, &settings, &shutdown, &m).expect("ok");
    let returned = Instant::now();
    let triggered_at = t.join().expect("join");
    assert!(report.stopped_by_shutdown);
    assert!(returned.duration_since(triggered_at) <= Duration::from_millis(500));
    assert!(report.elapsed < Duration::from_secs(2));
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn size_above_ceiling_is_clamped() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let settings = MemorySettings {
        ceiling_mb: 4,
        chunk_mb: 1,
        ..fast_settings()
    };
    let req = MemoryLoadRequest { duration: Duration::ZERO, size_mb: 10_000 };
    let report = memory_load(req, &settings, &shutdown, &m).expect("ok");
    assert_eq!(report.requested_mb, 4);
    assert_eq!(report.held_mb(), 4);
    assert_eq!(report.chunks, 4);
}

#[test]
fn failed_reservation_is_reported_and_released() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    // larger than isize::MAX, so the reservation is refused without touching the host
    let plan = [2 * MB, (isize::MAX as usize) + 1];
    let err = allocate_chunks(&plan, Duration::ZERO, &shutdown, &m)
        .err()
        .expect("allocation must fail");
    match &err {
        LoadError::ResourceExhausted { allocated_mb, .. } => assert_eq!(*allocated_mb, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("Memory allocation failed after 2 MB of "));
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn shutdown_during_allocation_stops_early() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let plan = chunk_plan(50, 1);
    let trigger = shutdown.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        trigger.trigger();
    });
    let set = allocate_chunks(&plan, Duration::from_millis(50), &shutdown, &m).expect("alloc");
    t.join().expect("join");
    assert!(!set.is_complete());
    assert!(!set.blocks().is_empty());
    assert!(set.blocks().len() < plan.len());
    assert!(set.blocks().iter().all(MemoryBlock::is_touched));
    drop(set);
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn shutdown_during_allocation_skips_hold() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let settings = MemorySettings {
        chunk_mb: 1,
        chunk_pause: Duration::from_millis(50),
        ..fast_settings()
    };
    let trigger = shutdown.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(120));
        trigger.trigger();
    });
    let req = MemoryLoadRequest { duration: Duration::from_secs(30), size_mb: 50 };
    let report = memory_load(req, &settings, &shutdown, &m).expect("ok");
    t.join().expect("join");
    assert!(report.stopped_by_shutdown);
    assert!(report.chunks < 50);
    assert!(report.elapsed < Duration::from_secs(1), "{:?}", report.elapsed);
    assert_eq!(m.memory_held_bytes.get(), 0);
}

#[test]
fn unrepresentable_hold_runs_until_shutdown() {
    let m = Metrics::new().expect("metrics");
    let shutdown = ShutdownSignal::new();
    let trigger = shutdown.clone();
    let t = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        trigger.trigger();
    });
    let req = MemoryLoadRequest { duration: Duration::MAX, size_mb: 1 };
    let report = memory_load(req, &fast_settings(), &shutdown, &m).expect("ok");
    t.join().expect("join");
    assert!(report.stopped_by_shutdown);
    assert_eq!(report.held_mb(), 1);
    assert!(report.elapsed < Duration::from_secs(1), "{:?}", report.elapsed);
}
