//! Ambient board (thermometer, hygrometer, gas and light) and beacon-scan sources.

use crate::error::HwError;
use std::time::Duration;
use vitals_traits::{AirQuality, AmbientReading, LocationFix, SampleReader};

/// Clean-air reference resistance of the gas element.
pub const GAS_R0_KOHM: f32 = 76.63;
/// Power-law fit from resistance ratio to TVOC.
const TVOC_SCALE_PPB: f32 = 116.602_07;
const TVOC_EXPONENT: f32 = -2.769_035;

/// Convert a measured gas-element resistance to an air-quality reading.
/// `None` when the resistance is not a positive finite value.
pub fn air_quality(resistance_kohm: f32, r0_kohm: f32) -> Option<AirQuality> {
    let ratio = resistance_kohm / r0_kohm;
    if !(ratio.is_finite() && ratio > 0.0) {
        return None;
    }
    Some(AirQuality {
        tvoc_ppb: TVOC_SCALE_PPB * ratio.powf(TVOC_EXPONENT),
        resistance_kohm,
        ratio,
    })
}

#[derive(Debug, Clone)]
pub struct SimulatedAmbient {
    base_c: f32,
    humidity_pct: Option<f32>,
    gas_kohm: Option<f32>,
    lux: Option<f32>,
    n: u32,
}

impl SimulatedAmbient {
    pub fn new(base_c: f32, humidity_pct: Option<f32>) -> Self {
        Self {
            base_c,
            humidity_pct,
            gas_kohm: None,
            lux: None,
            n: 0,
        }
    }

    /// Report a gas element sitting at `kohm`.
    pub fn with_gas_resistance(mut self, kohm: f32) -> Self {
        self.gas_kohm = Some(kohm);
        self
    }

    pub fn with_lux(mut self, lux: f32) -> Self {
        self.lux = Some(lux);
        self
    }
}

impl SampleReader for SimulatedAmbient {
    type Sample = AmbientReading;

    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<AmbientReading, Box<dyn std::error::Error + Send + Sync>> {
        // Slow ±0.2 °C wobble.
        let drift = 0.2 * (self.n as f32 / 60.0).sin();
        self.n = self.n.wrapping_add(1);
        Ok(AmbientReading {
            temperature_c: self.base_c + drift,
            humidity_pct: self.humidity_pct,
            air: self.gas_kohm.and_then(|r| air_quality(r, GAS_R0_KOHM)),
            lux: self.lux,
        })
    }
}

/// Strongest beacon in one scan, if any was heard.
pub fn strongest(scan: &[LocationFix]) -> Option<LocationFix> {
    scan.iter().copied().max_by_key(|f| f.rssi)
}

/// Replays beacon scans in a loop and reports the strongest of each.
#[derive(Debug, Clone)]
pub struct SimulatedBeacon {
    scans: Vec<Vec<LocationFix>>,
    idx: usize,
}

impl SimulatedBeacon {
    pub fn new(scans: Vec<Vec<LocationFix>>) -> Self {
        Self { scans, idx: 0 }
    }
}

impl SampleReader for SimulatedBeacon {
    type Sample = LocationFix;

    fn read(
        &mut self,
        _timeout: Duration,
    ) -> Result<LocationFix, Box<dyn std::error::Error + Send + Sync>> {
        if self.scans.is_empty() {
            return Err(Box::new(HwError::Disconnected));
        }
        let scan = &self.scans[self.idx % self.scans.len()];
        self.idx = self.idx.wrapping_add(1);
        strongest(scan).ok_or_else(|| HwError::Timeout.into())
    }
}
