use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum VitalsError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for sensor")]
    Timeout,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("no sample readers attached")]
    NoReaders,
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f32),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
