#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and recording loaders for the sensor node.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Recording CSV loaders enforce exact headers and non-decreasing
//!   timestamps before handing rows to a replay.
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MotionCfg {
    /// Accelerometer counts per g for the configured full-scale range (±2 g = 16384).
    pub accel_lsb_per_g: f32,
    /// Gyroscope counts per degree/second (±2000 dps = 16.4).
    pub gyro_lsb_per_dps: f32,
    pub lpf_alpha: f32,
    pub ema_alpha: f32,
    pub dyn_gain: f32,
    pub threshold_bias: f32,
    pub hysteresis_ratio: f32,
    pub min_step_interval_ms: u32,
    pub gyro_gate_dps: f32,
    pub min_xy_activity_g: f32,
    pub min_peak_magnitude: f32,
    pub min_step_motion_g: f32,
    pub min_step_delta_g: f32,
    pub extreme_impact_g: f32,
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PpgCfg {
    /// Rolling buffer length in samples (~10 s at 100 Hz).
    pub buffer_capacity: usize,
    /// Weight of the previous DC estimate per sample.
    pub dc_alpha: f32,
    /// Contact window on both DC channels; outside it the sensor is detached or saturated.
    pub min_dc: f32,
    pub max_dc: f32,
    pub min_ac_rms: f32,
    /// Perfusion index floor in percent.
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HeartRateCfg {
    pub beat_history: usize,
    pub recent_intervals: usize,
    pub min_intervals: usize,
    pub refractory_ms: u64,
    /// Weight of the previous estimate when smoothing (0.85 = 85% previous).
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Spo2Cfg {
    pub every_n_samples: u32,
    pub min_samples: usize,
    /// Quadratic calibration `a·R² + b·R + c`, used while `R <= quad_max_r`.
    pub quad_a: f32,
    pub quad_b: f32,
    pub quad_c: f32,
    pub quad_max_r: f32,
    /// Linear calibration `intercept + slope·R` above `quad_max_r`.
    pub linear_intercept: f32,
    pub linear_slope: f32,
    pub clamp_min_pct: f32,
    pub clamp_max_pct: f32,
    pub r_min: f32,
    pub r_max: f32,
    /// Results below this are reported invalid (severe hypoxia floor).
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

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SamplingCfg {
    pub motion_hz: u32,
    pub ppg_hz: u32,
    pub ambient_hz: u32,
    pub location_period_ms: u64,
    /// How often the consumer takes a snapshot.
    pub publish_ms: u64,
    /// Max sensor wait per read (ms). Also accepts alias "sample_ms".
    #[serde(alias = "sample_ms")]
    pub sensor_timeout_ms: u64,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            motion_hz: 100,
            ppg_hz: 100,
            ambient_hz: 1,
            location_period_ms: 11_000,
            publish_ms: 1000,
            sensor_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetryCfg {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 20,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FallAlertCfg {
    /// How long a detected fall stays raised in the snapshot before auto-clear.
    pub hold_ms: u32,
}

impl Default for FallAlertCfg {
    fn default() -> Self {
        Self { hold_ms: 3000 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Config {
    pub motion: MotionCfg,
    pub ppg: PpgCfg,
    pub heart_rate: HeartRateCfg,
    pub spo2: Spo2Cfg,
    pub sampling: SamplingCfg,
    pub retry: RetryCfg,
    pub fall_alert: FallAlertCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

fn unit_interval(x: f32) -> bool {
    x > 0.0 && x <= 1.0
}

fn positive(x: f32) -> bool {
    x.is_finite() && x > 0.0
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Motion
        let m = &self.motion;
        if !positive(m.accel_lsb_per_g) {
            eyre::bail!("motion.accel_lsb_per_g must be > 0");
        }
        if !positive(m.gyro_lsb_per_dps) {
            eyre::bail!("motion.gyro_lsb_per_dps must be > 0");
        }
        if !unit_interval(m.lpf_alpha) {
            eyre::bail!("motion.lpf_alpha must be in (0.0, 1.0]");
        }
        if !unit_interval(m.ema_alpha) {
            eyre::bail!("motion.ema_alpha must be in (0.0, 1.0]");
        }
        if !positive(m.dyn_gain) {
            eyre::bail!("motion.dyn_gain must be > 0");
        }
        if !(m.hysteresis_ratio > 0.0 && m.hysteresis_ratio < 1.0) {
            eyre::bail!("motion.hysteresis_ratio must be in (0.0, 1.0)");
        }
        if !positive(m.gyro_gate_dps) {
            eyre::bail!("motion.gyro_gate_dps must be > 0");
        }
        if !positive(m.strong_impact_g) || m.extreme_impact_g < m.strong_impact_g {
            eyre::bail!("motion.extreme_impact_g must be >= motion.strong_impact_g > 0");
        }
        if !(m.fall_angle_deg > 0.0 && m.fall_angle_deg <= 180.0) {
            eyre::bail!("motion.fall_angle_deg must be in (0, 180]");
        }
        if m.fall_cooldown_ms > 10 * 60 * 1000 {
            eyre::bail!("motion.fall_cooldown_ms is unreasonably large (>10min)");
        }

        // PPG
        let p = &self.ppg;
        if p.buffer_capacity < p.rms_window.max(5) || p.buffer_capacity <= p.min_samples_for_hr {
            eyre::bail!("ppg.buffer_capacity must cover rms_window and exceed min_samples_for_hr");
        }
        if !(p.dc_alpha > 0.0 && p.dc_alpha < 1.0) {
            eyre::bail!("ppg.dc_alpha must be in (0.0, 1.0)");
        }
        if !(p.min_dc >= 0.0 && p.min_dc < p.max_dc) {
            eyre::bail!("ppg.min_dc must be >= 0 and below ppg.max_dc");
        }
        if p.min_ac_rms < 0.0 || p.min_perfusion_index < 0.0 {
            eyre::bail!("ppg quality floors must be >= 0");
        }
        if p.rms_window == 0 {
            eyre::bail!("ppg.rms_window must be >= 1");
        }

        // Heart rate
        let h = &self.heart_rate;
        if h.beat_history < h.recent_intervals.max(h.min_intervals) || h.recent_intervals == 0 {
            eyre::bail!("heart_rate.beat_history must hold recent_intervals and min_intervals");
        }
        if !(h.smoothing >= 0.0 && h.smoothing < 1.0) {
            eyre::bail!("heart_rate.smoothing must be in [0.0, 1.0)");
        }
        if !(positive(h.min_bpm) && h.min_bpm < h.max_bpm) {
            eyre::bail!("heart_rate.min_bpm must be > 0 and below heart_rate.max_bpm");
        }

        // SpO2
        let s = &self.spo2;
        if s.every_n_samples == 0 {
            eyre::bail!("spo2.every_n_samples must be >= 1");
        }
        if s.min_samples > p.buffer_capacity {
            eyre::bail!("spo2.min_samples must not exceed ppg.buffer_capacity");
        }
        if !(s.r_min > 0.0 && s.r_min < s.r_max) {
            eyre::bail!("spo2.r_min must be > 0 and below spo2.r_max");
        }
        if !(s.clamp_min_pct.is_finite()
            && s.clamp_max_pct.is_finite()
            && s.clamp_min_pct <= s.clamp_max_pct)
        {
            eyre::bail!("spo2.clamp_min_pct and clamp_max_pct must be finite with min <= max");
        }

        // Sampling
        let sm = &self.sampling;
        if sm.motion_hz == 0 || sm.ppg_hz == 0 || sm.ambient_hz == 0 {
            eyre::bail!("sampling rates (motion_hz, ppg_hz, ambient_hz) must be > 0");
        }
        if sm.publish_ms == 0 {
            eyre::bail!("sampling.publish_ms must be >= 1");
        }
        if sm.sensor_timeout_ms == 0 {
            eyre::bail!("sampling.sensor_timeout_ms must be >= 1");
        }

        // Retry
        if self.retry.max_attempts == 0 {
            eyre::bail!("retry.max_attempts must be >= 1");
        }

        Ok(())
    }
}

/// Motion recording schema.
///
/// Expected headers:
/// t_ms,ax,ay,az,gx,gy,gz
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MotionRow {
    pub t_ms: u32,
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,
}

/// PPG recording schema.
///
/// Expected headers:
/// t_us,red,ir
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PpgRow {
    pub t_us: u64,
    pub red: u32,
    pub ir: u32,
}

const MOTION_HEADERS: [&str; 7] = ["t_ms", "ax", "ay", "az", "gx", "gy", "gz"];
const PPG_HEADERS: [&str; 3] = ["t_us", "red", "ir"];

fn load_rows<T>(
    path: &std::path::Path,
    expected: &[&str],
    timestamp: impl Fn(&T) -> u64,
) -> eyre::Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
{
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open recording CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "recording CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut rows: Vec<T> = Vec::new();
    let mut last_t: Option<u64> = None;
    for (idx, rec) in rdr.deserialize::<T>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let t = timestamp(&row);
        if let Some(prev) = last_t
            && t < prev
        {
            eyre::bail!("recording timestamps must be non-decreasing (row {})", idx + 2);
        }
        last_t = Some(t);
        rows.push(row);
    }
    Ok(rows)
}

pub fn load_motion_csv(path: &std::path::Path) -> eyre::Result<Vec<MotionRow>> {
    load_rows(path, &MOTION_HEADERS, |r: &MotionRow| u64::from(r.t_ms))
}

pub fn load_ppg_csv(path: &std::path::Path) -> eyre::Result<Vec<PpgRow>> {
    load_rows(path, &PPG_HEADERS, |r: &PpgRow| r.t_us)
}
