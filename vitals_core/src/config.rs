//! Runtime configuration for the detectors and the node runner.
//!
//! These are the structs the algorithms read. They are separate from the
//! TOML-deserialized config in `vitals_config`; see `conversions`.

use std::time::Duration;

/// Motion thresholds. Accelerations are in g, rates in degrees/second.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionCfg {
    /// Accelerometer counts per g for the configured full-scale range.
    pub accel_lsb_per_g: f32,
    /// Gyroscope counts per dps for the configured full-scale range.
    pub gyro_lsb_per_dps: f32,
    /// Gravity low-pass coefficient, tuned at 100 Hz.
    pub lpf_alpha: f32,
    /// Walk-signal baseline EMA coefficient, tuned at 100 Hz.
    pub ema_alpha: f32,
    pub dyn_gain: f32,
    pub threshold_bias: f32,
    /// Low threshold as a fraction of the high threshold.
    pub hysteresis_ratio: f32,
    pub min_step_interval_ms: u32,
    pub gyro_gate_dps: f32,
    pub min_xy_activity_g: f32,
    pub min_peak_magnitude: f32,
    pub min_step_motion_g: f32,
    pub min_step_delta_g: f32,
    /// Total acceleration that alone signals a fall.
    pub extreme_impact_g: f32,
    /// Total acceleration that signals a fall when combined with a large tilt.
    pub strong_impact_g: f32,
    pub fall_angle_deg: f32,
    pub fall_cooldown_ms: u32,
}

impl Default for MotionCfg {
    fn default() -> Self {
        Self {
            accel_lsb_per_g: 16384.0,
            gyro_lsb_per_dps: 16.4,
            lpf_alpha: 0.02,
            ema_alpha: 0.01,
            dyn_gain: 1.0,
            threshold_bias: 0.12,
            hysteresis_ratio: 0.6,
            min_step_interval_ms: 220,
            gyro_gate_dps: 120.0,
            min_xy_activity_g: 0.08,
            min_peak_magnitude: 0.06,
            min_step_motion_g: 0.05,
            min_step_delta_g: 0.05,
            extreme_impact_g: 5.0,
            strong_impact_g: 3.3,
            fall_angle_deg: 45.0,
            fall_cooldown_ms: 10_000,
        }
    }
}

/// PPG buffering and signal-quality floors.
#[derive(Debug, Clone, PartialEq)]
pub struct PpgCfg {
    pub buffer_capacity: usize,
    /// Weight kept by the previous DC estimate on each sample.
    pub dc_alpha: f32,
    /// Plausible DC range; outside it the sensor is detached or saturated.
    pub min_dc: f32,
    pub max_dc: f32,
    pub min_ac_rms: f32,
    pub min_perfusion_index: f32,
    pub rms_window: usize,
    pub min_samples_for_hr: usize,
}

impl Default for PpgCfg {
    fn default() -> Self {
        Self {
            buffer_capacity: 1000,
            dc_alpha: 0.95,
            min_dc: 5000.0,
            max_dc: 300_000.0,
            min_ac_rms: 50.0,
            min_perfusion_index: 0.05,
            rms_window: 50,
            min_samples_for_hr: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateCfg {
    pub beat_history: usize,
    pub recent_intervals: usize,
    pub min_intervals: usize,
    pub refractory_ms: u64,
    /// Weight of the previous estimate when smoothing.
    pub smoothing: f32,
    pub min_bpm: f32,
    pub max_bpm: f32,
    pub threshold_floor: f32,
}

impl Default for HeartRateCfg {
    fn default() -> Self {
        Self {
            beat_history: 15,
            recent_intervals: 5,
            min_intervals: 3,
            refractory_ms: 200,
            smoothing: 0.85,
            min_bpm: 40.0,
            max_bpm: 180.0,
            threshold_floor: 5.0,
        }
    }
}

/// SpO2 cadence, empirical calibration curve and validity bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Spo2Cfg {
    pub every_n_samples: u32,
    pub min_samples: usize,
    pub quad_a: f32,
    pub quad_b: f32,
    pub quad_c: f32,
    pub quad_max_r: f32,
    pub linear_intercept: f32,
    pub linear_slope: f32,
    pub clamp_min_pct: f32,
    pub clamp_max_pct: f32,
    pub r_min: f32,
    pub r_max: f32,
    pub valid_floor_pct: i32,
}

impl Default for Spo2Cfg {
    fn default() -> Self {
        Self {
            every_n_samples: 50,
            min_samples: 500,
            quad_a: -45.06,
            quad_b: 30.354,
            quad_c: 94.845,
            quad_max_r: 0.7,
            linear_intercept: 110.0,
            linear_slope: -25.0,
            clamp_min_pct: 0.0,
            clamp_max_pct: 100.0,
            r_min: 0.5,
            r_max: 3.0,
            valid_floor_pct: 75,
        }
    }
}

/// Everything the vital estimator needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VitalCfg {
    pub ppg: PpgCfg,
    pub heart_rate: HeartRateCfg,
    pub spo2: Spo2Cfg,
}

/// Retry policy for sensor reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_millis(20),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallAlertCfg {
    /// How long a detected fall stays asserted before auto-clear.
    pub hold_ms: u32,
}

impl Default for FallAlertCfg {
    fn default() -> Self {
        Self { hold_ms: 3000 }
    }
}

/// Producer cadences for the node runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingCfg {
    pub motion_hz: u32,
    pub ppg_hz: u32,
    pub ambient_hz: u32,
    pub location_period: Duration,
    pub sensor_timeout: Duration,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            motion_hz: 100,
            ppg_hz: 100,
            ambient_hz: 1,
            location_period: Duration::from_millis(11_000),
            sensor_timeout: Duration::from_millis(50),
        }
    }
}

/// Full node configuration consumed by `NodeBuilder`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeCfg {
    pub motion: MotionCfg,
    pub vitals: VitalCfg,
    pub fall_alert: FallAlertCfg,
    pub sampling: SamplingCfg,
    pub retry: RetryPolicy,
}
