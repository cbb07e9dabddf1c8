//! Producer-side glue between the detectors and the shared store.
//!
//! Each pipeline is owned by one producer and touches the store only after
//! its own computation is done, so the lock is never held across filtering.

use crate::fall_alert::{FallAlert, FallEdge};
use crate::motion::{FallResult, MotionDetector, ScaledInertial};
use crate::store::SensorStateStore;
use crate::vitals::{VitalEstimate, VitalEstimator};
use vitals_traits::{AmbientReading, InertialSample, LocationFix, PpgSample};

/// What one motion sample produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionUpdate {
    pub step: bool,
    pub steps: u32,
    pub fall: FallResult,
    pub edge: FallEdge,
}

#[derive(Debug, Clone)]
pub struct MotionPipeline {
    detector: MotionDetector,
    alert: FallAlert,
    steps: u32,
    falls: u32,
}

impl MotionPipeline {
    pub fn new(detector: MotionDetector, alert: FallAlert) -> Self {
        Self {
            detector,
            alert,
            steps: 0,
            falls: 0,
        }
    }

    pub fn detector(&self) -> &MotionDetector {
        &self.detector
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn falls(&self) -> u32 {
        self.falls
    }

    /// Process one raw sample, using its own timestamp as `now`.
    pub fn process(&mut self, sample: &InertialSample, store: &SensorStateStore) -> MotionUpdate {
        let scaled = self.detector.scale(sample);
        self.process_scaled(&scaled, sample.t_ms, store)
    }

    pub fn process_scaled(
        &mut self,
        sample: &ScaledInertial,
        now_ms: u32,
        store: &SensorStateStore,
    ) -> MotionUpdate {
        let step = self.detector.detect_step_scaled(sample, now_ms);
        let fall = self.detector.detect_fall_scaled(sample, now_ms);
        let edge = self.alert.update(fall.fall_detected, now_ms);

        if step {
            self.steps = store.record_step();
        }
        if fall.fall_detected {
            self.falls = self.falls.saturating_add(1);
        }
        match edge {
            FallEdge::Rising => store.set_fall_detected(true),
            FallEdge::Falling => store.set_fall_detected(false),
            FallEdge::Unchanged => {}
        }
        if step || edge != FallEdge::Unchanged {
            store.set_timestamp(u64::from(now_ms));
        }

        MotionUpdate {
            step,
            steps: self.steps,
            fall,
            edge,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VitalPipeline {
    estimator: VitalEstimator,
    /// Last values committed, so unchanged cycles skip the lock.
    committed: (Option<f32>, Option<i32>),
}

impl VitalPipeline {
    pub fn new(estimator: VitalEstimator) -> Self {
        Self {
            estimator,
            committed: (None, None),
        }
    }

    pub fn estimator(&self) -> &VitalEstimator {
        &self.estimator
    }

    pub fn process(
        &mut self,
        sample: &PpgSample,
        now_us: u64,
        store: &SensorStateStore,
    ) -> VitalEstimate {
        let est = self
            .estimator
            .update_sample(sample.red, sample.ir, now_us);
        let hr = est.heart_rate_valid.then_some(est.heart_rate_bpm);
        let spo2 = est.spo2_valid.then_some(est.spo2_pct);
        let fresh = (
            hr.filter(|v| Some(*v) != self.committed.0),
            spo2.filter(|v| Some(*v) != self.committed.1),
        );
        if fresh.0.is_some() || fresh.1.is_some() {
            store.set_vitals(fresh.0, fresh.1);
            store.set_timestamp(now_us / 1000);
            self.committed = (hr.or(self.committed.0), spo2.or(self.committed.1));
        }
        est
    }
}

/// Publish an ambient reading; humidity only when the sensor has it.
pub fn write_ambient(store: &SensorStateStore, reading: &AmbientReading) {
    store.set_temperature(reading.temperature_c);
    if let Some(h) = reading.humidity_pct {
        store.set_humidity(h);
    }
    if let Some(air) = reading.air {
        store.set_air_quality(air);
    }
    if let Some(lux) = reading.lux {
        store.set_lux(lux);
    }
}

pub fn write_location(store: &SensorStateStore, fix: &LocationFix) {
    store.set_location(*fix);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Field;

    #[test]
    fn fall_flag_follows_latch_edges() {
        let store = SensorStateStore::new();
        let mut p = MotionPipeline::new(MotionDetector::new(100.0).unwrap(), FallAlert::default());
        let rest = ScaledInertial {
            accel_g: [0.0, 0.0, 1.0],
            gyro_dps: [0.0; 3],
        };
        let hit = ScaledInertial {
            accel_g: [0.0, 6.0, 0.0],
            gyro_dps: [0.0; 3],
        };
        p.process_scaled(&rest, 0, &store);
        let u = p.process_scaled(&hit, 10, &store);
        assert_eq!(u.edge, FallEdge::Rising);
        assert!(store.snapshot().fall_detected);
        p.process_scaled(&rest, 2_000, &store);
        assert!(store.snapshot().fall_detected);
        let u = p.process_scaled(&rest, 3_010, &store);
        assert_eq!(u.edge, FallEdge::Falling);
        let s = store.snapshot();
        assert!(!s.fall_detected);
        assert_eq!(s.timestamp_ms, 3_010);
        assert_eq!(p.falls(), 1);
    }

    #[test]
    fn ambient_without_humidity_leaves_it_invalid() {
        let store = SensorStateStore::new();
        write_ambient(
            &store,
            &AmbientReading {
                temperature_c: 22.0,
                ..Default::default()
            },
        );
        let s = store.snapshot();
        assert!(s.is_valid(Field::Temperature));
        assert!(!s.is_valid(Field::Humidity));
        assert!(!s.is_valid(Field::AirQuality));
        assert!(!s.is_valid(Field::Light));
    }

    #[test]
    fn ambient_board_channels_land_in_the_store() {
        let store = SensorStateStore::new();
        let air = vitals_traits::AirQuality {
            tvoc_ppb: 240.0,
            resistance_kohm: 59.0,
            ratio: 0.77,
        };
        write_ambient(
            &store,
            &AmbientReading {
                temperature_c: 24.0,
                humidity_pct: Some(40.0),
                air: Some(air),
                lux: Some(410.0),
            },
        );
        let s = store.snapshot();
        for f in [Field::Temperature, Field::Humidity, Field::AirQuality, Field::Light] {
            assert!(s.is_valid(f), "{f:?}");
        }
        assert_eq!(s.air, air);
        assert_eq!(s.lux, 410.0);
    }
}
