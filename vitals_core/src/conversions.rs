//! `From` implementations bridging `vitals_config` types to `vitals_core` types.

use crate::config::{
    FallAlertCfg, HeartRateCfg, MotionCfg, NodeCfg, PpgCfg, RetryPolicy, SamplingCfg, Spo2Cfg,
    VitalCfg,
};
use std::time::Duration;

// ── Motion ───────────────────────────────────────────────────────────────────

impl From<&vitals_config::MotionCfg> for MotionCfg {
    fn from(c: &vitals_config::MotionCfg) -> Self {
        Self {
            accel_lsb_per_g: c.accel_lsb_per_g,
            gyro_lsb_per_dps: c.gyro_lsb_per_dps,
            lpf_alpha: c.lpf_alpha,
            ema_alpha: c.ema_alpha,
            dyn_gain: c.dyn_gain,
            threshold_bias: c.threshold_bias,
            hysteresis_ratio: c.hysteresis_ratio,
            min_step_interval_ms: c.min_step_interval_ms,
            gyro_gate_dps: c.gyro_gate_dps,
            min_xy_activity_g: c.min_xy_activity_g,
            min_peak_magnitude: c.min_peak_magnitude,
            min_step_motion_g: c.min_step_motion_g,
            min_step_delta_g: c.min_step_delta_g,
            extreme_impact_g: c.extreme_impact_g,
            strong_impact_g: c.strong_impact_g,
            fall_angle_deg: c.fall_angle_deg,
            fall_cooldown_ms: c.fall_cooldown_ms,
        }
    }
}

// ── PPG / heart rate / SpO2 ──────────────────────────────────────────────────

impl From<&vitals_config::PpgCfg> for PpgCfg {
    fn from(c: &vitals_config::PpgCfg) -> Self {
        Self {
            buffer_capacity: c.buffer_capacity,
            dc_alpha: c.dc_alpha,
            min_dc: c.min_dc,
            max_dc: c.max_dc,
            min_ac_rms: c.min_ac_rms,
            min_perfusion_index: c.min_perfusion_index,
            rms_window: c.rms_window,
            min_samples_for_hr: c.min_samples_for_hr,
        }
    }
}

impl From<&vitals_config::HeartRateCfg> for HeartRateCfg {
    fn from(c: &vitals_config::HeartRateCfg) -> Self {
        Self {
            beat_history: c.beat_history,
            recent_intervals: c.recent_intervals,
            min_intervals: c.min_intervals,
            refractory_ms: c.refractory_ms,
            smoothing: c.smoothing,
            min_bpm: c.min_bpm,
            max_bpm: c.max_bpm,
            threshold_floor: c.threshold_floor,
        }
    }
}

impl From<&vitals_config::Spo2Cfg> for Spo2Cfg {
    fn from(c: &vitals_config::Spo2Cfg) -> Self {
        Self {
            every_n_samples: c.every_n_samples,
            min_samples: c.min_samples,
            quad_a: c.quad_a,
            quad_b: c.quad_b,
            quad_c: c.quad_c,
            quad_max_r: c.quad_max_r,
            linear_intercept: c.linear_intercept,
            linear_slope: c.linear_slope,
            clamp_min_pct: c.clamp_min_pct,
            clamp_max_pct: c.clamp_max_pct,
            r_min: c.r_min,
            r_max: c.r_max,
            valid_floor_pct: c.valid_floor_pct,
        }
    }
}

// ── Node plumbing ────────────────────────────────────────────────────────────

impl From<&vitals_config::RetryCfg> for RetryPolicy {
    fn from(c: &vitals_config::RetryCfg) -> Self {
        Self {
            max_attempts: c.max_attempts,
            delay: Duration::from_millis(c.delay_ms),
        }
    }
}

impl From<&vitals_config::FallAlertCfg> for FallAlertCfg {
    fn from(c: &vitals_config::FallAlertCfg) -> Self {
        Self { hold_ms: c.hold_ms }
    }
}

impl From<&vitals_config::SamplingCfg> for SamplingCfg {
    fn from(c: &vitals_config::SamplingCfg) -> Self {
        Self {
            motion_hz: c.motion_hz,
            ppg_hz: c.ppg_hz,
            ambient_hz: c.ambient_hz,
            location_period: Duration::from_millis(c.location_period_ms),
            sensor_timeout: Duration::from_millis(c.sensor_timeout_ms),
        }
    }
}

impl From<&vitals_config::Config> for NodeCfg {
    fn from(c: &vitals_config::Config) -> Self {
        Self {
            motion: (&c.motion).into(),
            vitals: VitalCfg {
                ppg: (&c.ppg).into(),
                heart_rate: (&c.heart_rate).into(),
                spo2: (&c.spo2).into(),
            },
            fall_alert: (&c.fall_alert).into(),
            sampling: (&c.sampling).into(),
            retry: (&c.retry).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_config_matches_runtime_defaults() {
        let file = vitals_config::Config::default();
        let node: NodeCfg = (&file).into();
        assert_eq!(node, NodeCfg::default());
    }

    #[test]
    fn retry_delay_is_carried_in_millis() {
        let c = vitals_config::RetryCfg {
            max_attempts: 5,
            delay_ms: 7,
        };
        let p: RetryPolicy = (&c).into();
        assert_eq!(p.max_attempts, 5);
        assert_eq!(p.delay, Duration::from_millis(7));
    }
}
