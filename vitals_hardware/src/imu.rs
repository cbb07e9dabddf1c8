//! Accelerometer + gyroscope source that walks at a fixed cadence and can
//! be told to fall.

use crate::fault::FaultInjector;
use std::time::Duration;
use vitals_traits::{InertialSample, SampleReader};

/// Planar acceleration of one simulated heel strike, in g.
const STEP_PULSE_G: f32 = 0.5;
/// Impact vector of the simulated fall, in g. On a ±2 g part every axis
/// saturates, which still reads as a strong tilted impact.
const FALL_IMPACT_G: [f32; 3] = [-2.5, 2.5, 2.5];

#[derive(Debug, Clone)]
pub struct SimulatedImu {
    lsb_per_g: f32,
    period_ms: u32,
    cadence_spm: f32,
    fall_at_ms: Option<u32>,
    fallen: bool,
    n: u32,
    faults: FaultInjector,
}

impl SimulatedImu {
    /// Still sensor sampled at `hz` with a ±2 g range (16384 counts per g).
    pub fn new(hz: u32) -> Self {
        Self {
            lsb_per_g: 16384.0,
            period_ms: (1000 / hz.max(1)).max(1),
            cadence_spm: 0.0,
            fall_at_ms: None,
            fallen: false,
            n: 0,
            faults: FaultInjector::default(),
        }
    }

    pub fn with_lsb_per_g(mut self, lsb_per_g: f32) -> Self {
        self.lsb_per_g = lsb_per_g;
        self
    }

    /// Walk at `spm` steps per minute until a fall.
    pub fn with_cadence(mut self, spm: f32) -> Self {
        self.cadence_spm = spm.max(0.0);
        self
    }

    pub fn with_fall_at(mut self, ms: u32) -> Self {
        self.fall_at_ms = Some(ms);
        self
    }

    pub fn with_faults(mut self, faults: FaultInjector) -> Self {
        self.faults = faults;
        self
    }

    fn counts(&self, g: f32) -> i16 {
        // `as` saturates out-of-range floats, like a clipped ADC
        (g * self.lsb_per_g).round() as i16
    }

    /// Next sample on the simulated timeline.
    pub fn next_sample(&mut self) -> InertialSample {
        let t_ms = self.n.wrapping_mul(self.period_ms);
        self.n = self.n.wrapping_add(1);

        let one_g = self.counts(1.0);
        if let Some(at) = self.fall_at_ms
            && !self.fallen
            && t_ms >= at
        {
            self.fallen = true;
            let [x, y, z] = FALL_IMPACT_G;
            tracing::trace!(t_ms, "simulated fall impact");
            return InertialSample::accel(self.counts(x), self.counts(y), self.counts(z), t_ms);
        }

        let mut ax = 0;
        if !self.fallen && self.cadence_spm > 0.0 {
            let step_ms = (60_000.0 / self.cadence_spm) as u32;
            if step_ms > 0 && t_ms >= step_ms && t_ms % step_ms < self.period_ms {
                ax = self.counts(STEP_PULSE_G);
            }
        }
        InertialSample::accel(ax, 0, one_g, t_ms)
    }
}

impl SampleReader for SimulatedImu {
    type Sample = InertialSample;

    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<InertialSample, Box<dyn std::error::Error + Send + Sync>> {
        self.faults.check()?;
        Ok(self.next_sample())
    }
}
