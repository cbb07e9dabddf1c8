//! Heart-rate and SpO2 estimation from red/IR photoplethysmography.
//!
//! Per sample: buffer the raw values, track each channel's DC level, isolate
//! the pulsatile part with a 5-tap FIR, then re-evaluate signal quality.
//! Heart rate and SpO2 are only recomputed while quality is good; otherwise
//! the last good heart rate is held and SpO2 is reported invalid.

use crate::config::{HeartRateCfg, PpgCfg, Spo2Cfg, VitalCfg};
use crate::error::{BuildError, Result};
use crate::signal::{Channel, HeartBeatHistory, SignalBuffer, SignalPoint};

/// High-pass FIR taps, oldest sample first.
const FIR_TAPS: [f32; 5] = [-0.2, -0.1, 0.0, 0.1, 0.2];
/// RMS is not trusted below this many buffered samples.
const MIN_RMS_SAMPLES: usize = 10;
const THRESHOLD_AVG_WINDOW: usize = 10;
const THRESHOLD_AVG_GAIN: f32 = 0.15;
const THRESHOLD_RMS_GAIN: f32 = 0.2;
/// Reference AC level for the SNR estimate.
const SNR_REFERENCE_RMS: f32 = 50.0;
/// How far outside the plausible band a heart rate may drift.
const SOFT_CLAMP_FACTOR: f32 = 0.1;

/// Clinical SpO2 bands used for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Spo2Status {
    Normal,
    Warning,
    Danger,
    Severe,
    #[default]
    Invalid,
}

impl Spo2Status {
    pub const fn classify(pct: i32) -> Self {
        match pct {
            95.. => Self::Normal,
            90..=94 => Self::Warning,
            80..=89 => Self::Danger,
            75..=79 => Self::Severe,
            _ => Self::Invalid,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning: mild hypoxia",
            Self::Danger => "danger: moderate hypoxia",
            Self::Severe => "severe hypoxia",
            Self::Invalid => "invalid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalQuality {
    pub red_dc: f32,
    pub ir_dc: f32,
    pub red_ac_rms: f32,
    pub ir_ac_rms: f32,
    pub perfusion_index: f32,
    /// `20·log10(ir_ac_rms / 50)`, zero while there is no AC content.
    pub snr_estimate: f32,
    pub contact_detected: bool,
    pub quality_good: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VitalEstimate {
    pub heart_rate_bpm: f32,
    pub heart_rate_valid: bool,
    pub spo2_pct: i32,
    pub spo2_valid: bool,
    pub spo2_status: Spo2Status,
    /// Perfusion-derived score in [0, 1]; zero while quality is poor.
    pub signal_quality: f32,
    pub perfusion_index: f32,
    pub r_ratio: f32,
}

/// Latest DC and AC values per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilteredValues {
    pub red_dc: f32,
    pub ir_dc: f32,
    pub red_ac: f32,
    pub ir_ac: f32,
}

/// Per-channel DC tracker and FIR history.
#[derive(Debug, Clone, Default)]
struct ChannelFilter {
    dc: Option<f32>,
    /// DC-removed values, oldest first.
    taps: [f32; 5],
    seen: usize,
}

impl ChannelFilter {
    /// Returns `(dc, ac)`; AC stays zero until the FIR is primed.
    fn update(&mut self, raw: f32, alpha: f32) -> (f32, f32) {
        let dc = match self.dc {
            Some(prev) => alpha * prev + (1.0 - alpha) * raw,
            None => raw,
        };
        self.dc = Some(dc);
        self.taps.rotate_left(1);
        self.taps[4] = raw - dc;
        self.seen = self.seen.saturating_add(1);
        let ac = if self.seen >= FIR_TAPS.len() {
            self.taps.iter().zip(FIR_TAPS).map(|(x, c)| x * c).sum()
        } else {
            0.0
        };
        (dc, ac)
    }
}

#[derive(Debug, Clone)]
pub struct VitalEstimator {
    ppg: PpgCfg,
    hr: HeartRateCfg,
    spo2: Spo2Cfg,
    buf: SignalBuffer,
    history: HeartBeatHistory,
    red: ChannelFilter,
    ir: ChannelFilter,
    quality: SignalQuality,
    estimate: VitalEstimate,
    last: FilteredValues,
    last_beat_us: Option<u64>,
    hr_state: Option<f32>,
    samples_seen: u64,
}

impl Default for VitalEstimator {
    fn default() -> Self {
        Self::from_valid(VitalCfg::default())
    }
}

impl VitalEstimator {
    pub fn new(cfg: VitalCfg) -> Result<Self> {
        if cfg.ppg.buffer_capacity < FIR_TAPS.len() {
            return Err(BuildError::InvalidConfig("ppg buffer must hold at least 5 samples").into());
        }
        // The beat gate needs strictly more samples than the warm-up count.
        if cfg.ppg.buffer_capacity <= cfg.ppg.min_samples_for_hr {
            return Err(
                BuildError::InvalidConfig("ppg buffer must exceed min_samples_for_hr").into(),
            );
        }
        if cfg.ppg.rms_window == 0 {
            return Err(BuildError::InvalidConfig("ppg rms window must be >= 1").into());
        }
        if cfg.heart_rate.beat_history == 0 || cfg.heart_rate.recent_intervals == 0 {
            return Err(BuildError::InvalidConfig("heart-rate history must be >= 1").into());
        }
        if cfg.spo2.every_n_samples == 0 {
            return Err(BuildError::InvalidConfig("spo2 cadence must be >= 1").into());
        }
        let (lo, hi) = (cfg.spo2.clamp_min_pct, cfg.spo2.clamp_max_pct);
        if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
            return Err(BuildError::InvalidConfig("spo2 clamp bounds must be finite and ordered").into());
        }
        Ok(Self::from_valid(cfg))
    }

    fn from_valid(cfg: VitalCfg) -> Self {
        Self {
            buf: SignalBuffer::with_capacity(cfg.ppg.buffer_capacity),
            history: HeartBeatHistory::with_capacity(cfg.heart_rate.beat_history),
            ppg: cfg.ppg,
            hr: cfg.heart_rate,
            spo2: cfg.spo2,
            red: ChannelFilter::default(),
            ir: ChannelFilter::default(),
            quality: SignalQuality::default(),
            estimate: VitalEstimate::default(),
            last: FilteredValues::default(),
            last_beat_us: None,
            hr_state: None,
            samples_seen: 0,
        }
    }

    /// Return to the freshly constructed state, keeping the configuration.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.history.clear();
        self.red = ChannelFilter::default();
        self.ir = ChannelFilter::default();
        self.quality = SignalQuality::default();
        self.estimate = VitalEstimate::default();
        self.last = FilteredValues::default();
        self.last_beat_us = None;
        self.hr_state = None;
        self.samples_seen = 0;
    }

    pub fn quality(&self) -> &SignalQuality {
        &self.quality
    }

    pub fn estimate(&self) -> VitalEstimate {
        self.estimate
    }

    pub fn filtered(&self) -> FilteredValues {
        self.last
    }

    pub fn buffer(&self) -> &SignalBuffer {
        &self.buf
    }

    pub fn history(&self) -> &HeartBeatHistory {
        &self.history
    }

    pub fn samples_seen(&self) -> u64 {
        self.samples_seen
    }

    /// Feed one red/IR pair taken at `now_us`.
    pub fn update_sample(&mut self, red: u32, ir: u32, now_us: u64) -> VitalEstimate {
        let alpha = self.ppg.dc_alpha;
        let (red_dc, red_ac) = self.red.update(red as f32, alpha);
        let (ir_dc, ir_ac) = self.ir.update(ir as f32, alpha);
        self.last = FilteredValues {
            red_dc,
            ir_dc,
            red_ac,
            ir_ac,
        };
        self.buf.push(SignalPoint {
            red_raw: red,
            ir_raw: ir,
            red_dc,
            ir_dc,
            red_ac,
            ir_ac,
            t_us: now_us,
        });
        self.samples_seen = self.samples_seen.wrapping_add(1);

        let was_good = self.quality.quality_good;
        self.quality = self.assess_quality();
        if was_good && !self.quality.quality_good {
            tracing::warn!(
                contact = self.quality.contact_detected,
                pi = self.quality.perfusion_index,
                "ppg signal quality lost"
            );
        }

        if self.quality.quality_good && self.buf.len() > self.ppg.min_samples_for_hr {
            if self.detect_beat().is_some() {
                self.update_heart_rate();
            }
        } else {
            // A gap in good signal must not be measured as one long beat.
            self.last_beat_us = None;
        }

        if self.samples_seen % u64::from(self.spo2.every_n_samples) == 0 {
            self.update_spo2();
        }

        self.estimate.perfusion_index = self.quality.perfusion_index;
        self.estimate.signal_quality = if self.quality.quality_good {
            (self.quality.perfusion_index / 10.0).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.estimate
    }

    fn assess_quality(&self) -> SignalQuality {
        let FilteredValues { red_dc, ir_dc, .. } = self.last;
        let in_range = |dc: f32| dc > self.ppg.min_dc && dc < self.ppg.max_dc;
        let contact_detected = in_range(red_dc) && in_range(ir_dc);

        let (red_ac_rms, ir_ac_rms) = if self.buf.len() >= MIN_RMS_SAMPLES {
            (
                self.buf.ac_rms(Channel::Red, self.ppg.rms_window),
                self.buf.ac_rms(Channel::Ir, self.ppg.rms_window),
            )
        } else {
            (0.0, 0.0)
        };
        let perfusion_index = if ir_dc > 0.0 {
            100.0 * ir_ac_rms / ir_dc
        } else {
            0.0
        };
        let snr_estimate = if ir_ac_rms > 0.0 {
            20.0 * (ir_ac_rms / SNR_REFERENCE_RMS).log10()
        } else {
            0.0
        };
        let quality_good = contact_detected
            && perfusion_index >= self.ppg.min_perfusion_index
            && ir_ac_rms >= self.ppg.min_ac_rms
            && red_ac_rms >= self.ppg.min_ac_rms;

        SignalQuality {
            red_dc,
            ir_dc,
            red_ac_rms,
            ir_ac_rms,
            perfusion_index,
            snr_estimate,
            contact_detected,
            quality_good,
        }
    }

    /// Look for a local maximum at the previous sample; returns the interval
    /// to the prior beat when one is accepted.
    fn detect_beat(&mut self) -> Option<f32> {
        let next = self.buf.ac_back(Channel::Ir, 0)?;
        let mid = self.buf.ac_back(Channel::Ir, 1)?;
        let prev = self.buf.ac_back(Channel::Ir, 2)?;
        if !(mid > prev && mid >= next) {
            return None;
        }

        let n = THRESHOLD_AVG_WINDOW.min(self.buf.len());
        let avg = self.buf.recent_ac(Channel::Ir, n).sum::<f32>() / n as f32;
        let threshold = (avg.abs() * THRESHOLD_AVG_GAIN)
            .min(self.quality.ir_ac_rms * THRESHOLD_RMS_GAIN)
            .max(self.hr.threshold_floor);
        if mid <= threshold {
            return None;
        }

        let t_beat = self.buf.get_back(1)?.t_us;
        let interval_ms = match self.last_beat_us {
            Some(last) => {
                let dt_ms = t_beat.saturating_sub(last) / 1000;
                if dt_ms < self.hr.refractory_ms {
                    return None;
                }
                Some(dt_ms as f32)
            }
            None => None,
        };
        self.last_beat_us = Some(t_beat);
        tracing::debug!(t_beat, amplitude = mid, threshold, ?interval_ms, "beat detected");
        let interval_ms = interval_ms?;
        self.history.push(interval_ms, t_beat);
        Some(interval_ms)
    }

    fn update_heart_rate(&mut self) {
        if self.history.len() < self.hr.min_intervals {
            return;
        }
        let k = self.hr.recent_intervals.min(self.history.len());
        let (mut weighted, mut weights) = (0.0f32, 0.0f32);
        for (i, iv) in self.history.recent(k).enumerate() {
            let w = (k - i) as f32;
            weighted += w * iv;
            weights += w;
        }
        if weights <= 0.0 || weighted <= 0.0 {
            return;
        }
        let raw_bpm = 60_000.0 / (weighted / weights);
        let smoothed = match self.hr_state {
            Some(prev) => self.hr.smoothing * prev + (1.0 - self.hr.smoothing) * raw_bpm,
            None => raw_bpm,
        };
        let bpm = soft_clamp(smoothed, self.hr.min_bpm, self.hr.max_bpm);
        self.hr_state = Some(bpm);
        self.estimate.heart_rate_bpm = bpm;
        self.estimate.heart_rate_valid = true;
    }

    fn update_spo2(&mut self) {
        let q = self.quality;
        if !q.quality_good || self.buf.len() < self.spo2.min_samples {
            self.mark_spo2_invalid();
            return;
        }
        if !(q.red_dc > 0.0 && q.ir_dc > 0.0 && q.ir_ac_rms > 0.0) {
            self.mark_spo2_invalid();
            return;
        }
        let r = (q.red_ac_rms / q.red_dc) / (q.ir_ac_rms / q.ir_dc);
        self.estimate.r_ratio = r;
        let s = &self.spo2;
        let raw = if r <= s.quad_max_r {
            s.quad_a * r * r + s.quad_b * r + s.quad_c
        } else {
            s.linear_intercept + s.linear_slope * r
        };
        let pct = raw.clamp(s.clamp_min_pct, s.clamp_max_pct).round() as i32;
        let valid = (s.r_min..=s.r_max).contains(&r)
            && q.perfusion_index >= self.ppg.min_perfusion_index
            && pct >= s.valid_floor_pct;
        if !valid {
            tracing::debug!(r, pct, "spo2 rejected");
            self.mark_spo2_invalid();
            return;
        }
        self.estimate.spo2_pct = pct;
        self.estimate.spo2_valid = true;
        self.estimate.spo2_status = Spo2Status::classify(pct);
        tracing::debug!(r, pct, status = self.estimate.spo2_status.label(), "spo2 updated");
    }

    fn mark_spo2_invalid(&mut self) {
        self.estimate.spo2_valid = false;
        self.estimate.spo2_status = Spo2Status::Invalid;
    }
}

/// Let values outside `[lo, hi]` through at a tenth of their excess.
fn soft_clamp(v: f32, lo: f32, hi: f32) -> f32 {
    if v > hi {
        hi + (v - hi) * SOFT_CLAMP_FACTOR
    } else if v < lo {
        lo - (lo - v) * SOFT_CLAMP_FACTOR
    } else {
        v
    }
}
