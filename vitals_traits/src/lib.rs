pub mod clock;
pub mod samples;

pub use clock::{Clock, MonotonicClock};
pub use samples::{AirQuality, AmbientReading, InertialSample, LocationFix, PpgSample};

/// A source of raw sensor readings.
///
/// Implementations block for at most `timeout` and report transport or
/// bus failures as boxed errors; retry policy lives with the caller.
pub trait SampleReader {
    type Sample;

    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Self::Sample, Box<dyn std::error::Error + Send + Sync>>;
}

impl<R: SampleReader + ?Sized> SampleReader for Box<R> {
    type Sample = R::Sample;

    fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Self::Sample, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read(timeout)
    }
}
