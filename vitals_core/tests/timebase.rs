//! Sampling periods and the wrapping inertial timestamp.

use rstest::rstest;
use std::time::Duration;
use vitals_core::timebase::{sample_period, wrap_ms};

#[rstest]
#[case(100, Duration::from_millis(10))]
#[case(25, Duration::from_millis(40))]
#[case(3, Duration::from_micros(333_333))]
#[case(0, Duration::from_secs(1))]
#[case(u32::MAX, Duration::from_micros(1))]
fn sensor_rates_map_to_periods(#[case] hz: u32, #[case] want: Duration) {
    assert_eq!(sample_period(hz), want);
}

#[test]
fn inertial_stamp_wraps_at_u32_millis() {
    assert_eq!(wrap_ms(1_999), 1);
    let one_lap_us = (u64::from(u32::MAX) + 1) * 1000;
    assert_eq!(wrap_ms(one_lap_us - 1000), u32::MAX);
    assert_eq!(wrap_ms(one_lap_us + 7_000), 7);
}
