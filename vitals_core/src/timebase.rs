//! Node timeline conversions shared by the samplers and the runner.

use std::time::Duration;

/// One sampling period at `hz`. Zero is read as 1 Hz and the period never
/// drops below 1 µs.
pub fn sample_period(hz: u32) -> Duration {
    Duration::from_micros((1_000_000 / u64::from(hz.max(1))).max(1))
}

/// Fold node time in microseconds into the 32-bit millisecond stamp carried
/// by inertial samples. Wraps after about 49.7 days.
#[inline]
pub fn wrap_ms(elapsed_us: u64) -> u32 {
    (elapsed_us / 1000) as u32
}
