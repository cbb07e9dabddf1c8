//! Simulated sample sources for the sensor node.
//!
//! Each source implements `vitals_traits::SampleReader` and produces values
//! on its own synthetic timeline, so runs are reproducible.
pub mod env;
pub mod error;
pub mod fault;
pub mod imu;
pub mod ppg;

pub use env::{GAS_R0_KOHM, SimulatedAmbient, SimulatedBeacon, air_quality, strongest};
pub use fault::FaultInjector;
pub use imu::SimulatedImu;
pub use ppg::SimulatedPpg;
