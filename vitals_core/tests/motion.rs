//! Step cadence and end-to-end fall scenarios on synthetic streams.

use vitals_core::motion::{FallDirection, MotionDetector, ScaledInertial};
use vitals_traits::InertialSample;

const ONE_G: i16 = 16384;
const HALF_G: i16 = 8192;

/// 300 samples of still gravity at 100 Hz, ending at t = 2990 ms.
fn settled() -> MotionDetector {
    let mut d = MotionDetector::new(100.0).unwrap();
    for i in 0..300u32 {
        let t = i * 10;
        assert!(!d.detect_step(&InertialSample::accel(0, 0, ONE_G, t), t));
        assert!(!d.detect_fall(&InertialSample::accel(0, 0, ONE_G, t), t).fall_detected);
    }
    d
}

/// One sharp X pulse at `t` followed by rest; returns whether a step was
/// accepted, and leaves the detector at `t + 90`.
fn pulse(d: &mut MotionDetector, t: u32) -> bool {
    let mut stepped = d.detect_step(&InertialSample::accel(HALF_G, 0, ONE_G, t), t);
    for k in 1..10 {
        let tk = t + k * 10;
        stepped |= d.detect_step(&InertialSample::accel(0, 0, ONE_G, tk), tk);
    }
    stepped
}

#[test]
fn single_pulse_is_one_step() {
    let mut d = settled();
    assert!(pulse(&mut d, 3000));
    assert_eq!(d.context().last_step_ms, Some(3020));
}

#[test]
fn peaks_closer_than_min_interval_count_once() {
    let mut d = settled();
    assert!(pulse(&mut d, 3000));
    assert!(!pulse(&mut d, 3100));
    assert_eq!(d.context().last_step_ms, Some(3020));
    assert!(pulse(&mut d, 3400));
    assert_eq!(d.context().last_step_ms, Some(3420));
}

#[test]
fn walking_cadence_is_counted() {
    let mut d = settled();
    let steps = (0..10)
        .filter(|i| pulse(&mut d, 3000 + i * 500))
        .count();
    assert_eq!(steps, 10);
}

#[test]
fn vertical_bounce_is_not_a_step() {
    let mut d = settled();
    let mut stepped = false;
    for k in 0..50u32 {
        let t = 3000 + k * 10;
        let az = if k % 10 == 0 { ONE_G + HALF_G } else { ONE_G };
        stepped |= d.detect_step(&InertialSample::accel(0, 0, az, t), t);
    }
    assert!(!stepped);
}

#[test]
fn settled_then_sideways_impact_falls_right() {
    let mut d = settled();
    assert_eq!(d.context().last_step_ms, None);
    let hit = ScaledInertial {
        accel_g: [0.0, 6.0, 0.0],
        gyro_dps: [0.0; 3],
    };
    let r = d.detect_fall_scaled(&hit, 3000);
    assert!(r.fall_detected);
    assert!((r.roll_deg - 90.0).abs() < 1e-3);
    assert!(r.pitch_deg.abs() < 1e-3);
    assert_eq!(r.direction, FallDirection::Right);
    assert!((r.fall_angle_deg - 90.0).abs() < 1e-3);
    assert!((r.ay_g - 6.0).abs() < 1e-6);
}

#[test]
fn raw_counts_scale_with_configured_range() {
    // ±16 g range: 2048 counts per g, so 6 g fits in i16.
    let cfg = vitals_core::MotionCfg {
        accel_lsb_per_g: 2048.0,
        ..Default::default()
    };
    let mut d = MotionDetector::with_config(cfg, 100.0).unwrap();
    let r = d.detect_fall(&InertialSample::accel(0, 6 * 2048, 0, 0), 0);
    assert!(r.fall_detected);
    assert_eq!(r.direction, FallDirection::Right);
}
