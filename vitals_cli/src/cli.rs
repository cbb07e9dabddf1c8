//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

pub fn json_mode() -> bool {
    JSON_MODE.get().copied().unwrap_or(false)
}

#[derive(Parser, Debug)]
#[command(name = "vitals", version, about = "Wearable sensor node CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/vitals_config.toml")]
    pub config: PathBuf,

    /// Print snapshots, events and errors as JSON lines; logs go to stderr as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to [logging].level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulated node in real time and publish snapshots
    Run {
        /// Stop after this many seconds
        #[arg(long, value_name = "SECS", default_value_t = 10)]
        seconds: u64,
        /// Simulated walking cadence in steps per minute (0 = standing still)
        #[arg(long, value_name = "SPM", default_value_t = 100.0)]
        cadence: f32,
        /// Simulated pulse rate
        #[arg(long, value_name = "BPM", default_value_t = 72.0)]
        bpm: f32,
        /// Inject a fall this many ms into the IMU timeline
        #[arg(long, value_name = "MS")]
        fall_at_ms: Option<u32>,
        /// Simulate a detached PPG sensor
        #[arg(long, action = ArgAction::SetTrue)]
        no_contact: bool,
    },
    /// Replay recorded CSV streams through the detectors
    Replay {
        /// Motion recording (t_ms,ax,ay,az,gx,gy,gz)
        #[arg(long, value_name = "FILE")]
        motion: PathBuf,
        /// Optional PPG recording (t_us,red,ir)
        #[arg(long, value_name = "FILE")]
        ppg: Option<PathBuf>,
    },
    /// Validate the config and read every simulated source once
    SelfCheck,
}
