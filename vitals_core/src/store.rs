//! Shared latest-value record written by producers and read as a whole.
//!
//! One mutex guards the whole [`SensorSnapshot`]. Setters hold it for a single
//! field write; [`SensorStateStore::snapshot`] holds it for one copy, so a
//! reader never sees a record that mixes two halves of one write.

use std::sync::{Mutex, MutexGuard};
use vitals_traits::{AirQuality, LocationFix};

/// One validity bit per measured field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Field {
    Temperature = 1 << 0,
    Humidity = 1 << 1,
    HeartRate = 1 << 2,
    Spo2 = 1 << 3,
    Steps = 1 << 4,
    Fall = 1 << 5,
    Location = 1 << 6,
    AirQuality = 1 << 7,
    Light = 1 << 8,
}

impl Field {
    pub const ALL: [Self; 9] = [
        Self::Temperature,
        Self::Humidity,
        Self::HeartRate,
        Self::Spo2,
        Self::Steps,
        Self::Fall,
        Self::Location,
        Self::AirQuality,
        Self::Light,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Validity(u16);

impl Validity {
    pub const fn is_set(self, f: Field) -> bool {
        self.0 & (f as u16) != 0
    }

    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn any(self) -> bool {
        self.0 != 0
    }

    const fn with(self, f: Field) -> Self {
        Self(self.0 | f as u16)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SensorSnapshot {
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub heart_rate_bpm: f32,
    pub spo2_pct: i32,
    /// Never decreases.
    pub steps: u32,
    pub fall_detected: bool,
    pub location: LocationFix,
    /// TVOC estimate with the gas resistance and ratio it came from.
    pub air: AirQuality,
    pub lux: f32,
    /// Producer timestamp of the latest write, in milliseconds.
    pub timestamp_ms: u64,
    pub valid: Validity,
    /// Incremented on every committed write.
    pub generation: u64,
}

impl SensorSnapshot {
    pub const fn is_valid(&self, f: Field) -> bool {
        self.valid.is_set(f)
    }
}

#[derive(Debug, Default)]
pub struct SensorStateStore {
    inner: Mutex<SensorSnapshot>,
}

impl SensorStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SensorSnapshot> {
        // Writers never leave the record half-updated, so a poisoned lock is still consistent.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn commit(&self, f: impl FnOnce(&mut SensorSnapshot)) {
        let mut s = self.lock();
        f(&mut s);
        s.generation = s.generation.wrapping_add(1);
    }

    pub fn set_temperature(&self, celsius: f32) {
        self.commit(|s| {
            s.temperature_c = celsius;
            s.valid = s.valid.with(Field::Temperature);
        });
    }

    pub fn set_humidity(&self, pct: f32) {
        self.commit(|s| {
            s.humidity_pct = pct;
            s.valid = s.valid.with(Field::Humidity);
        });
    }

    pub fn set_heart_rate(&self, bpm: f32) {
        self.commit(|s| {
            s.heart_rate_bpm = bpm;
            s.valid = s.valid.with(Field::HeartRate);
        });
    }

    pub fn set_spo2(&self, pct: i32) {
        self.commit(|s| {
            s.spo2_pct = pct;
            s.valid = s.valid.with(Field::Spo2);
        });
    }

    /// Commit heart rate and SpO2 from one producer cycle together.
    /// `None` leaves that field untouched.
    pub fn set_vitals(&self, bpm: Option<f32>, spo2_pct: Option<i32>) {
        if bpm.is_none() && spo2_pct.is_none() {
            return;
        }
        self.commit(|s| {
            if let Some(bpm) = bpm {
                s.heart_rate_bpm = bpm;
                s.valid = s.valid.with(Field::HeartRate);
            }
            if let Some(pct) = spo2_pct {
                s.spo2_pct = pct;
                s.valid = s.valid.with(Field::Spo2);
            }
        });
    }

    /// Store a step total; lower values than the current one are ignored.
    pub fn set_steps(&self, steps: u32) {
        self.commit(|s| {
            s.steps = s.steps.max(steps);
            s.valid = s.valid.with(Field::Steps);
        });
    }

    /// Add one step and return the new total.
    pub fn record_step(&self) -> u32 {
        let mut total = 0;
        self.commit(|s| {
            s.steps = s.steps.saturating_add(1);
            s.valid = s.valid.with(Field::Steps);
            total = s.steps;
        });
        total
    }

    pub fn set_fall_detected(&self, detected: bool) {
        self.commit(|s| {
            s.fall_detected = detected;
            s.valid = s.valid.with(Field::Fall);
        });
    }

    pub fn set_location(&self, fix: LocationFix) {
        self.commit(|s| {
            s.location = fix;
            s.valid = s.valid.with(Field::Location);
        });
    }

    pub fn set_air_quality(&self, air: AirQuality) {
        self.commit(|s| {
            s.air = air;
            s.valid = s.valid.with(Field::AirQuality);
        });
    }

    pub fn set_lux(&self, lux: f32) {
        self.commit(|s| {
            s.lux = lux;
            s.valid = s.valid.with(Field::Light);
        });
    }

    /// The timestamp carries no validity bit of its own.
    pub fn set_timestamp(&self, timestamp_ms: u64) {
        self.commit(|s| s.timestamp_ms = timestamp_ms);
    }

    /// Copy of the whole record taken under the lock.
    pub fn snapshot(&self) -> SensorSnapshot {
        let guard = self.lock();
        let copy = *guard;
        debug_assert_eq!(
            copy.generation, guard.generation,
            "snapshot diverged from the record while the lock was held"
        );
        copy
    }

    pub fn has_valid_measurements(&self) -> bool {
        self.lock().valid.any()
    }

    pub fn valid_count(&self) -> u32 {
        self.lock().valid.count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_store_is_zero_and_invalid() {
        let store = SensorStateStore::new();
        let s = store.snapshot();
        assert_eq!(s, SensorSnapshot::default());
        for f in Field::ALL {
            assert!(!s.is_valid(f));
        }
        assert!(!store.has_valid_measurements());
        assert_eq!(store.valid_count(), 0);
    }

    #[test]
    fn setters_flag_their_field() {
        let store = SensorStateStore::new();
        store.set_temperature(21.5);
        store.set_location(LocationFix {
            major: 1,
            minor: 7,
            rssi: -61,
        });
        let s = store.snapshot();
        assert!(s.is_valid(Field::Temperature));
        assert!(s.is_valid(Field::Location));
        assert!(!s.is_valid(Field::HeartRate));
        assert_eq!(store.valid_count(), 2);
        assert_eq!(s.location.minor, 7);
        assert_eq!(s.generation, 2);
    }

    #[test]
    fn timestamp_has_no_validity_bit() {
        let store = SensorStateStore::new();
        store.set_timestamp(42);
        assert_eq!(store.snapshot().timestamp_ms, 42);
        assert!(!store.has_valid_measurements());
    }

    #[test]
    fn steps_never_go_backwards() {
        let store = SensorStateStore::new();
        store.set_steps(10);
        store.set_steps(4);
        assert_eq!(store.snapshot().steps, 10);
        assert_eq!(store.record_step(), 11);
    }

    #[test]
    fn set_vitals_skips_empty_cycles() {
        let store = SensorStateStore::new();
        store.set_vitals(None, None);
        assert_eq!(store.snapshot().generation, 0);
        store.set_vitals(Some(70.0), None);
        let s = store.snapshot();
        assert!(s.is_valid(Field::HeartRate));
        assert!(!s.is_valid(Field::Spo2));
    }

    #[test]
    fn air_quality_and_light_use_their_own_bits() {
        let store = SensorStateStore::new();
        store.set_air_quality(AirQuality {
            tvoc_ppb: 118.0,
            resistance_kohm: 76.0,
            ratio: 0.99,
        });
        let s = store.snapshot();
        assert!(s.is_valid(Field::AirQuality));
        assert!(!s.is_valid(Field::Light));
        assert_eq!(s.air.tvoc_ppb, 118.0);

        store.set_lux(320.0);
        let s = store.snapshot();
        assert!(s.is_valid(Field::Light));
        assert_eq!(s.lux, 320.0);
        assert_eq!(s.valid.count(), 2);
    }

    #[test]
    fn fall_flag_stores_what_it_is_given() {
        let store = SensorStateStore::new();
        store.set_fall_detected(true);
        assert!(store.snapshot().fall_detected);
        store.set_fall_detected(false);
        let s = store.snapshot();
        assert!(!s.fall_detected);
        assert!(s.is_valid(Field::Fall));
    }
}
