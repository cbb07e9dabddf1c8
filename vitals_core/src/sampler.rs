//! Background producer threads.
//!
//! Each `Sampler` owns one reader and one sample callback, reads at a fixed
//! cadence through the retry wrapper, and tracks the last-ok timestamp plus
//! sample/error counters for watchdog logic.
//!
//! Safety: Each `Sampler` spawns exactly one thread that is automatically
//! shut down when the `Sampler` is dropped, preventing thread leaks.
use crate::config::RetryPolicy;
use crate::error::Result;
use crate::retry::read_with_retry;
use crate::timebase::sample_period;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use vitals_traits::SampleReader;
use vitals_traits::clock::Clock;

/// Longest single sleep, so long periods still notice shutdown promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

#[derive(Debug, Default)]
struct Counters {
    samples: AtomicU64,
    errors: AtomicU64,
    last_ok_ms: AtomicU64,
}

/// Point-in-time view of one producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerStats {
    pub name: String,
    pub samples: u64,
    pub errors: u64,
    pub last_ok_ms: u64,
    /// Time since the last successful read.
    pub stalled_ms: u64,
}

pub struct Sampler {
    name: String,
    counters: Arc<Counters>,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler")
            .field("name", &self.name)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}

/// Cadence and read policy for one sampler.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub period: Duration,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Origin of the `now_us` handed to the callback. Samplers that share it
    /// stamp onto one timeline.
    pub epoch: Instant,
}

impl Pacing {
    pub fn at_hz(hz: u32, timeout: Duration, retry: RetryPolicy, epoch: Instant) -> Self {
        Self {
            period: sample_period(hz),
            timeout,
            retry,
            epoch,
        }
    }

    pub fn every(period: Duration, timeout: Duration, retry: RetryPolicy, epoch: Instant) -> Self {
        Self {
            period,
            timeout,
            retry,
            epoch,
        }
    }
}

impl Sampler {
    /// Start reading `reader` on its own thread. `on_sample` receives each
    /// sample with the microseconds elapsed since `pacing.epoch`.
    pub fn spawn<R, C, F>(
        name: impl Into<String>,
        mut reader: R,
        pacing: Pacing,
        clock: C,
        mut on_sample: F,
    ) -> Result<Self>
    where
        R: SampleReader + Send + 'static,
        C: Clock + Send + Sync + 'static,
        F: FnMut(R::Sample, u64) + Send + 'static,
    {
        let name = name.into();
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(clock);
        let shutdown = Arc::new(AtomicBool::new(false));
        let counters = Arc::new(Counters::default());
        let Pacing {
            period,
            timeout,
            retry,
            epoch,
        } = pacing;

        let thread_clock = clock.clone();
        let thread_shutdown = shutdown.clone();
        let thread_counters = counters.clone();
        let thread_name = name.clone();
        let join_handle = std::thread::Builder::new()
            .name(format!("sampler-{name}"))
            .spawn(move || {
                let clock = thread_clock;
                loop {
                    // Immediate shutdown check (lock-free atomic)
                    if thread_shutdown.load(Ordering::Relaxed) {
                        tracing::trace!(sampler = %thread_name, "shutdown signal received");
                        break;
                    }

                    match read_with_retry(&mut reader, timeout, &retry, &clock) {
                        Ok(v) => {
                            let now_us = clock.us_since(epoch);
                            on_sample(v, now_us);
                            thread_counters.samples.fetch_add(1, Ordering::Relaxed);
                            thread_counters
                                .last_ok_ms
                                .store(now_us / 1000, Ordering::Relaxed);
                        }
                        Err(e) => {
                            thread_counters.errors.fetch_add(1, Ordering::Relaxed);
                            tracing::debug!(sampler = %thread_name, error = %e, "read gave up; watchdog will notice");
                        }
                    }

                    pause(&*clock, period, &thread_shutdown);
                }
                tracing::trace!(sampler = %thread_name, "sampler thread exiting cleanly");
            })?;

        Ok(Self {
            name,
            counters,
            clock,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.counters.last_ok_ms.load(Ordering::Relaxed))
    }

    pub fn stats(&self) -> SamplerStats {
        let now_ms = self.clock.ms_since(self.epoch);
        SamplerStats {
            name: self.name.clone(),
            samples: self.counters.samples.load(Ordering::Relaxed),
            errors: self.counters.errors.load(Ordering::Relaxed),
            last_ok_ms: self.counters.last_ok_ms.load(Ordering::Relaxed),
            stalled_ms: self.stalled_for(now_ms),
        }
    }
}

/// Sleep `period` in slices, returning early once shutdown is requested.
fn pause(clock: &(dyn Clock + Send + Sync), period: Duration, shutdown: &AtomicBool) {
    let mut left = period;
    while !left.is_zero() {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        let step = left.min(SLEEP_SLICE);
        clock.sleep(step);
        left -= step;
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits between reads, or once the in-flight read (and its
        // retries) completes.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!(sampler = %self.name, "sampler thread joined");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(sampler = %self.name, ?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
