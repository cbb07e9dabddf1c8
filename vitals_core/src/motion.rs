//! Step and fall detection from accelerometer + gyroscope samples.
//!
//! The detector keeps all running state in an explicit [`MotionContext`]
//! so independent sensor instances never share filter history.
//!
//! ## Steps
//!
//! A planar (X-Y) "walk signal" is built from linear acceleration (raw minus
//! a low-passed gravity estimate) and the sample-to-sample delta. Z is left
//! out so wrist rotation does not register as walking. A hysteresis peak
//! detector opens a candidate above `gain * (baseline + bias)` and closes it
//! below `hysteresis_ratio` of that; the closed peak counts as a step when it
//! clears the cadence cap and the noise floors.
//!
//! ## Falls
//!
//! Either an extreme total acceleration, or a strong one combined with a
//! large tilt, triggers a fall. A triggered fall starts a hard cooldown.

use crate::config::MotionCfg;
use crate::error::{BuildError, Result};
use vitals_traits::InertialSample;

/// Rates the default coefficients were tuned at.
const REFERENCE_RATE_HZ: f32 = 100.0;

/// Walk-signal weights for planar motion and planar delta.
const MOTION_WEIGHT: f32 = 1.8;
const DELTA_WEIGHT: f32 = 1.5;

/// Direction of a detected fall, clockwise from Front in 45° sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallDirection {
    #[default]
    None,
    Front,
    FrontRight,
    Right,
    BackRight,
    Back,
    BackLeft,
    Left,
    FrontLeft,
}

impl FallDirection {
    const SECTORS: [Self; 8] = [
        Self::Front,
        Self::FrontRight,
        Self::Right,
        Self::BackRight,
        Self::Back,
        Self::BackLeft,
        Self::Left,
        Self::FrontLeft,
    ];

    /// Classify a heading in degrees; any finite value is normalized first.
    pub fn from_heading(deg: f32) -> Self {
        if !deg.is_finite() {
            return Self::None;
        }
        let norm = normalize_deg(deg);
        // Sectors are centred on their heading, so shift by half a sector.
        let idx = (((norm + 22.5) / 45.0).floor() as usize) % Self::SECTORS.len();
        Self::SECTORS[idx]
    }

    /// Classify from roll/pitch in degrees using `atan2(roll, pitch)`.
    ///
    /// Level orientation (both zero) has no direction.
    pub fn from_angles(roll_deg: f32, pitch_deg: f32) -> Self {
        if roll_deg == 0.0 && pitch_deg == 0.0 {
            return Self::None;
        }
        Self::from_heading(roll_deg.atan2(pitch_deg).to_degrees())
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Front => "front",
            Self::FrontRight => "front-right",
            Self::Right => "right",
            Self::BackRight => "back-right",
            Self::Back => "back",
            Self::BackLeft => "back-left",
            Self::Left => "left",
            Self::FrontLeft => "front-left",
        }
    }
}

fn normalize_deg(deg: f32) -> f32 {
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negatives
    if r >= 360.0 { 0.0 } else { r }
}

/// Outcome of one `detect_fall` call.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FallResult {
    pub fall_detected: bool,
    pub direction: FallDirection,
    /// Heading of the fall in [0, 360); zero when nothing was detected.
    pub fall_angle_deg: f32,
    pub ax_g: f32,
    pub ay_g: f32,
    pub total_g: f32,
    pub roll_deg: f32,
    pub pitch_deg: f32,
}

/// A sample already converted to physical units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScaledInertial {
    pub accel_g: [f32; 3],
    pub gyro_dps: [f32; 3],
}

impl ScaledInertial {
    pub fn from_raw(s: &InertialSample, cfg: &MotionCfg) -> Self {
        let a = cfg.accel_lsb_per_g;
        let g = cfg.gyro_lsb_per_dps;
        Self {
            accel_g: [
                f32::from(s.ax) / a,
                f32::from(s.ay) / a,
                f32::from(s.az) / a,
            ],
            gyro_dps: [
                f32::from(s.gx) / g,
                f32::from(s.gy) / g,
                f32::from(s.gz) / g,
            ],
        }
    }
}

/// Open candidate step window.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PeakWindow {
    peak: f32,
    motion_g: f32,
    delta_g: f32,
}

/// Running state owned by one detector.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionContext {
    /// Low-passed gravity estimate per axis, seeded by the first sample.
    pub gravity: Option<[f32; 3]>,
    pub walk_baseline: f32,
    pub last_step_ms: Option<u32>,
    pub last_fall_ms: Option<u32>,
    prev_xy: Option<[f32; 2]>,
    window: Option<PeakWindow>,
    /// Rate-adjusted gravity LPF coefficient.
    pub lpf_alpha: f32,
    /// Rate-adjusted baseline EMA coefficient.
    pub ema_alpha: f32,
}

impl MotionContext {
    fn new(cfg: &MotionCfg, sample_rate_hz: f32) -> Self {
        Self {
            gravity: None,
            walk_baseline: 0.0,
            last_step_ms: None,
            last_fall_ms: None,
            prev_xy: None,
            window: None,
            lpf_alpha: rescale_alpha(cfg.lpf_alpha, sample_rate_hz),
            ema_alpha: rescale_alpha(cfg.ema_alpha, sample_rate_hz),
        }
    }
}

/// Keep a one-pole filter's time constant when the sample rate changes.
fn rescale_alpha(alpha: f32, sample_rate_hz: f32) -> f32 {
    let a = alpha.clamp(0.0, 1.0);
    (1.0 - (1.0 - a).powf(REFERENCE_RATE_HZ / sample_rate_hz)).clamp(0.0, 1.0)
}

#[derive(Debug, Clone)]
pub struct MotionDetector {
    cfg: MotionCfg,
    ctx: MotionContext,
}

impl MotionDetector {
    /// Detector with default thresholds tuned for `sample_rate_hz`.
    pub fn new(sample_rate_hz: f32) -> Result<Self> {
        Self::with_config(MotionCfg::default(), sample_rate_hz)
    }

    pub fn with_config(cfg: MotionCfg, sample_rate_hz: f32) -> Result<Self> {
        if !(sample_rate_hz.is_finite() && sample_rate_hz > 0.0) {
            return Err(BuildError::InvalidSampleRate(sample_rate_hz).into());
        }
        if !(cfg.accel_lsb_per_g > 0.0 && cfg.gyro_lsb_per_dps > 0.0) {
            return Err(BuildError::InvalidConfig("sensor scale factors must be > 0").into());
        }
        let ctx = MotionContext::new(&cfg, sample_rate_hz);
        tracing::info!(
            sample_rate_hz,
            lpf_alpha = ctx.lpf_alpha,
            ema_alpha = ctx.ema_alpha,
            "motion detector initialised"
        );
        Ok(Self { cfg, ctx })
    }

    pub fn config(&self) -> &MotionCfg {
        &self.cfg
    }

    pub fn context(&self) -> &MotionContext {
        &self.ctx
    }

    pub fn scale(&self, sample: &InertialSample) -> ScaledInertial {
        ScaledInertial::from_raw(sample, &self.cfg)
    }

    /// Feed one raw sample; true when a step was accepted on this call.
    pub fn detect_step(&mut self, sample: &InertialSample, now_ms: u32) -> bool {
        let s = self.scale(sample);
        self.detect_step_scaled(&s, now_ms)
    }

    pub fn detect_step_scaled(&mut self, s: &ScaledInertial, now_ms: u32) -> bool {
        let [ax, ay, az] = s.accel_g;
        let alpha = self.ctx.lpf_alpha;
        let g = match self.ctx.gravity {
            Some(mut g) => {
                for (gi, ai) in g.iter_mut().zip([ax, ay, az]) {
                    *gi = (1.0 - alpha) * *gi + alpha * ai;
                }
                g
            }
            None => [ax, ay, az],
        };
        self.ctx.gravity = Some(g);

        let lin_x = ax - g[0];
        let lin_y = ay - g[1];
        let motion_g = lin_x.hypot(lin_y);
        let [px, py] = self.ctx.prev_xy.unwrap_or([ax, ay]);
        let delta_g = (ax - px).hypot(ay - py);
        self.ctx.prev_xy = Some([ax, ay]);

        let walk = MOTION_WEIGHT * motion_g + DELTA_WEIGHT * delta_g;
        let e = self.ctx.ema_alpha;
        // The baseline absorbs the current sample before the thresholds are derived.
        self.ctx.walk_baseline = (1.0 - e) * self.ctx.walk_baseline + e * walk;
        let th_hi = self.cfg.dyn_gain * (self.ctx.walk_baseline + self.cfg.threshold_bias);
        let th_lo = self.cfg.hysteresis_ratio * th_hi;

        let gyro_xy = s.gyro_dps[0].hypot(s.gyro_dps[1]);

        match self.ctx.window {
            None => {
                if walk > th_hi
                    && gyro_xy < self.cfg.gyro_gate_dps
                    && motion_g > self.cfg.min_xy_activity_g
                {
                    tracing::debug!(walk, th_hi, motion_g, delta_g, "step candidate opened");
                    self.ctx.window = Some(PeakWindow {
                        peak: walk,
                        motion_g,
                        delta_g,
                    });
                }
                false
            }
            Some(mut w) => {
                if walk > w.peak {
                    w = PeakWindow {
                        peak: walk,
                        motion_g,
                        delta_g,
                    };
                }
                if walk >= th_lo {
                    self.ctx.window = Some(w);
                    return false;
                }
                self.ctx.window = None;
                self.accept_step(w, th_lo, now_ms)
            }
        }
    }

    fn accept_step(&mut self, w: PeakWindow, th_lo: f32, now_ms: u32) -> bool {
        let spaced = self
            .ctx
            .last_step_ms
            .is_none_or(|last| now_ms.wrapping_sub(last) >= self.cfg.min_step_interval_ms);
        if !spaced {
            tracing::debug!(now_ms, "step rejected: below minimum interval");
            return false;
        }
        let strong = w.peak - th_lo > self.cfg.min_peak_magnitude
            && w.motion_g > self.cfg.min_step_motion_g
            && w.delta_g > self.cfg.min_step_delta_g;
        if !strong {
            tracing::debug!(peak = w.peak, "step rejected: noise-level peak");
            return false;
        }
        self.ctx.last_step_ms = Some(now_ms);
        tracing::info!(now_ms, peak = w.peak, "step accepted");
        true
    }

    pub fn detect_fall(&mut self, sample: &InertialSample, now_ms: u32) -> FallResult {
        let s = self.scale(sample);
        self.detect_fall_scaled(&s, now_ms)
    }

    pub fn detect_fall_scaled(&mut self, s: &ScaledInertial, now_ms: u32) -> FallResult {
        let [ax, ay, az] = s.accel_g;
        let roll_deg = ay.atan2(ax.hypot(az)).to_degrees();
        let pitch_deg = (-ax).atan2(ay.hypot(az)).to_degrees();
        let total_g = (ax * ax + ay * ay + az * az).sqrt();
        let mut out = FallResult {
            ax_g: ax,
            ay_g: ay,
            total_g,
            roll_deg,
            pitch_deg,
            ..FallResult::default()
        };

        if let Some(last) = self.ctx.last_fall_ms
            && now_ms.wrapping_sub(last) < self.cfg.fall_cooldown_ms
        {
            return out;
        }

        let tilt_deg = roll_deg.hypot(pitch_deg);
        let extreme = total_g >= self.cfg.extreme_impact_g;
        let strong_tilted =
            total_g >= self.cfg.strong_impact_g && tilt_deg >= self.cfg.fall_angle_deg;
        if !(extreme || strong_tilted) {
            return out;
        }

        out.fall_detected = true;
        out.fall_angle_deg = normalize_deg(roll_deg.atan2(pitch_deg).to_degrees());
        out.direction = FallDirection::from_angles(roll_deg, pitch_deg);
        self.ctx.last_fall_ms = Some(now_ms);
        tracing::warn!(
            now_ms,
            total_g,
            roll_deg,
            pitch_deg,
            direction = out.direction.label(),
            "fall detected"
        );
        out
    }

    /// Clear the fall cooldown so the next sample may trigger again.
    pub fn reset_fall(&mut self) {
        self.ctx.last_fall_ms = None;
    }
}
