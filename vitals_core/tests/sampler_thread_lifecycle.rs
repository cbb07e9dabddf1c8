//! Test sampler thread lifecycle and cleanup to prevent thread leaks.
//!
//! Verifies that:
//! - Threads are properly cleaned up when Sampler is dropped
//! - Multiple samplers can be created and destroyed without accumulating threads
//! - Failed reads are counted and successful ones reach the callback
//! - Callback timestamps are measured from the epoch the caller supplies

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use vitals_core::config::RetryPolicy;
use vitals_core::mocks::{NoopReader, SeqReader};
use vitals_core::sampler::{Pacing, Sampler};
use vitals_traits::clock::{Clock, MonotonicClock};
use vitals_traits::clock::test_clock::TestClock;

fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        delay: Duration::from_millis(5),
    }
}

fn paced(hz: u32, timeout_ms: u64) -> Pacing {
    Pacing::at_hz(hz, Duration::from_millis(timeout_ms), quick_retry(), Instant::now())
}

#[test]
fn sampler_thread_exits_on_drop() {
    let sampler = Sampler::spawn(
        "noop",
        NoopReader::<u32>::new(),
        paced(10, 20),
        MonotonicClock::new(),
        |_, _| {},
    )
    .unwrap();

    // Give thread time to start
    std::thread::sleep(Duration::from_millis(50));

    // Drop the sampler - thread should exit gracefully
    drop(sampler);
}

#[test]
fn multiple_samplers_dont_leak_threads() {
    let clock = MonotonicClock::new();
    for i in 0..10 {
        let sampler = Sampler::spawn(
            format!("noop-{i}"),
            NoopReader::<u32>::new(),
            paced(50, 10),
            clock,
            |_, _| {},
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let _ = sampler.stats();
        drop(sampler);
    }
}

#[test]
fn failed_reads_are_counted() {
    let sampler = Sampler::spawn(
        "failing",
        NoopReader::<u32>::new(),
        paced(100, 1),
        MonotonicClock::new(),
        |_, _| {},
    )
    .unwrap();
    std::thread::sleep(Duration::from_millis(120));
    let stats = sampler.stats();
    assert_eq!(stats.name, "failing");
    assert_eq!(stats.samples, 0);
    assert!(stats.errors >= 1, "{stats:?}");
}

#[test]
fn samples_reach_the_callback() {
    let seen = Arc::new(AtomicU64::new(0));
    let sink = seen.clone();
    let sampler = Sampler::spawn(
        "seq",
        SeqReader::new(vec![1u64, 2, 3]),
        paced(100, 1),
        TestClock::new(),
        move |v, _now_us| {
            sink.fetch_max(v, Ordering::Relaxed);
        },
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.load(Ordering::Relaxed) < 3 && Instant::now() < deadline {
        std::thread::yield_now();
    }
    assert_eq!(seen.load(Ordering::Relaxed), 3);
    let stats = sampler.stats();
    assert!(stats.samples >= 3);
    assert_eq!(stats.errors, 0);
}

#[test]
fn long_period_does_not_delay_shutdown() {
    let sampler = Sampler::spawn(
        "slow",
        SeqReader::new(vec![0u8]),
        Pacing::every(
            Duration::from_secs(11),
            Duration::from_millis(1),
            quick_retry(),
            Instant::now(),
        ),
        MonotonicClock::new(),
        |_, _| {},
    )
    .unwrap();
    std::thread::sleep(Duration::from_millis(30));

    let start = Instant::now();
    drop(sampler);
    assert!(
        start.elapsed() < Duration::from_millis(200),
        "shutdown took {:?}",
        start.elapsed()
    );
}

#[test]
fn sampler_shutdown_is_prompt() {
    let sampler = Sampler::spawn(
        "noop",
        NoopReader::<u32>::new(),
        paced(10, 50),
        MonotonicClock::new(),
        |_, _| {},
    )
    .unwrap();
    std::thread::sleep(Duration::from_millis(100));

    // Worst case: one in-flight read with its retry delay plus one sleep slice.
    let start = Instant::now();
    drop(sampler);
    let shutdown_time = start.elapsed();
    assert!(
        shutdown_time < Duration::from_millis(200),
        "Shutdown took {:?}, expected < 200ms for prompt response",
        shutdown_time
    );
}

#[test]
fn timestamps_count_from_the_supplied_epoch() {
    // The epoch predates the sampler by 5 s of node time; the first sample
    // must be stamped on that timeline, not from the spawn instant.
    let clock = TestClock::new();
    let epoch = clock.now();
    clock.advance(Duration::from_secs(5));

    let first_us = Arc::new(AtomicU64::new(0));
    let sink = first_us.clone();
    let sampler = Sampler::spawn(
        "late",
        SeqReader::new(vec![1u8]),
        Pacing::at_hz(100, Duration::from_millis(1), quick_retry(), epoch),
        clock.clone(),
        move |_, now_us| {
            let _ = sink.compare_exchange(0, now_us, Ordering::Relaxed, Ordering::Relaxed);
        },
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while sampler.stats().samples == 0 && Instant::now() < deadline {
        std::thread::yield_now();
    }
    assert!(first_us.load(Ordering::Relaxed) >= 5_000_000);
    assert!(sampler.stats().last_ok_ms >= 5_000);
}
