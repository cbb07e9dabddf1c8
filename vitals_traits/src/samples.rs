//! Raw reading types delivered by the acquisition layer.

/// One accelerometer + gyroscope reading in raw sensor counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InertialSample {
    pub ax: i16,
    pub ay: i16,
    pub az: i16,
    pub gx: i16,
    pub gy: i16,
    pub gz: i16,
    /// Acquisition time in milliseconds (wrapping).
    pub t_ms: u32,
}

impl InertialSample {
    /// Accelerometer-only reading with a zero gyroscope.
    pub const fn accel(ax: i16, ay: i16, az: i16, t_ms: u32) -> Self {
        Self {
            ax,
            ay,
            az,
            gx: 0,
            gy: 0,
            gz: 0,
            t_ms,
        }
    }
}

/// One red/infrared photoplethysmography reading (18-bit ADC counts).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PpgSample {
    pub red: u32,
    pub ir: u32,
}

/// Metal-oxide gas sensor output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AirQuality {
    /// Estimated total volatile organic compounds.
    pub tvoc_ppb: f32,
    /// Sensing-element resistance.
    pub resistance_kohm: f32,
    /// Resistance over the clean-air reference resistance.
    pub ratio: f32,
}

/// Ambient conditions from the environment board.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AmbientReading {
    pub temperature_c: f32,
    /// Relative humidity, when the sensor provides it.
    pub humidity_pct: Option<f32>,
    pub air: Option<AirQuality>,
    pub lux: Option<f32>,
}

/// Strongest-beacon location fix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocationFix {
    pub major: u16,
    pub minor: u16,
    pub rssi: i32,
}
