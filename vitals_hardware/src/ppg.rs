//! Red/IR optical pulse source.

use crate::fault::FaultInjector;
use std::time::Duration;
use vitals_traits::{PpgSample, SampleReader};

/// Ambient-light floor seen by a photodiode with nothing on it.
const DETACHED_DC: f32 = 1500.0;

#[derive(Debug, Clone)]
pub struct SimulatedPpg {
    hz: f32,
    bpm: f32,
    dc: f32,
    red_amp: f32,
    ir_amp: f32,
    contact: bool,
    n: u64,
    faults: FaultInjector,
}

impl SimulatedPpg {
    /// Finger on the sensor, pulse at 72 bpm with a healthy red/IR ratio.
    pub fn new(hz: u32) -> Self {
        Self {
            hz: hz.max(1) as f32,
            bpm: 72.0,
            dc: 100_000.0,
            red_amp: 2200.0,
            ir_amp: 4000.0,
            contact: true,
            n: 0,
            faults: FaultInjector::default(),
        }
    }

    pub fn with_bpm(mut self, bpm: f32) -> Self {
        self.bpm = bpm;
        self
    }

    /// DC level and pulsatile amplitudes in ADC counts.
    pub fn with_levels(mut self, dc: f32, red_amp: f32, ir_amp: f32) -> Self {
        self.dc = dc;
        self.red_amp = red_amp;
        self.ir_amp = ir_amp;
        self
    }

    pub fn with_contact(mut self, contact: bool) -> Self {
        self.contact = contact;
        self
    }

    pub fn with_faults(mut self, faults: FaultInjector) -> Self {
        self.faults = faults;
        self
    }

    pub fn next_sample(&mut self) -> PpgSample {
        let t = self.n as f32 / self.hz;
        self.n = self.n.wrapping_add(1);
        if !self.contact {
            return PpgSample {
                red: DETACHED_DC as u32,
                ir: DETACHED_DC as u32,
            };
        }
        let phase = (std::f32::consts::TAU * self.bpm / 60.0 * t).sin();
        // 18-bit ADC
        let adc = |v: f32| v.clamp(0.0, 262_143.0) as u32;
        PpgSample {
            red: adc(self.dc + self.red_amp * phase),
            ir: adc(self.dc + self.ir_amp * phase),
        }
    }
}

impl SampleReader for SimulatedPpg {
    type Sample = PpgSample;

    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<PpgSample, Box<dyn std::error::Error + Send + Sync>> {
        self.faults.check()?;
        Ok(self.next_sample())
    }
}
