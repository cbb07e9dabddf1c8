#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Signal processing and state fusion for a wearable sensor node.
//!
//! This crate is hardware-agnostic. Raw samples arrive through
//! `vitals_traits::SampleReader`; everything here is computation plus one
//! shared, mutex-guarded record.
//!
//! ## Architecture
//!
//! - **Motion**: step and fall detection from accelerometer + gyroscope (`motion`)
//! - **Vitals**: heart rate and SpO2 from red/IR PPG with quality gating (`vitals`, `signal`)
//! - **Store**: latest value of every quantity, read as one consistent copy (`store`)
//! - **Pipelines**: per-producer glue, including the fall auto-clear latch (`pipeline`, `fall_alert`)
//! - **Runtime**: retrying reads, paced sampler threads, node assembly on one timeline (`retry`, `sampler`, `runner`, `timebase`)
//!
//! The detectors never fail on odd data. They return non-detecting or invalid
//! results and keep the last good values.

pub mod config;
pub mod conversions;
pub mod error;
pub mod fall_alert;
pub mod hw_error;
pub mod mocks;
pub mod motion;
pub mod pipeline;
pub mod retry;
pub mod runner;
pub mod sampler;
pub mod signal;
pub mod store;
pub mod timebase;
pub mod vitals;

pub use config::{FallAlertCfg, MotionCfg, NodeCfg, RetryPolicy, SamplingCfg, VitalCfg};
pub use error::{BuildError, Result, VitalsError};
pub use fall_alert::{FallAlert, FallEdge};
pub use motion::{FallDirection, FallResult, MotionDetector, ScaledInertial};
pub use pipeline::{MotionPipeline, VitalPipeline};
pub use runner::{NodeBuilder, NodeEvent, RunningNode, SensorNode};
pub use store::{Field, SensorSnapshot, SensorStateStore};
pub use vitals::{SignalQuality, Spo2Status, VitalEstimate, VitalEstimator};
