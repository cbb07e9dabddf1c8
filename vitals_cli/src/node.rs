//! Simulated node assembly: the `run` and `self-check` commands.

use crate::render::{print_event, print_snapshot};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use vitals_core::retry::read_with_retry;
use vitals_core::{NodeCfg, SensorNode};
use vitals_hardware::{FaultInjector, SimulatedAmbient, SimulatedBeacon, SimulatedImu, SimulatedPpg};
use vitals_traits::clock::MonotonicClock;
use vitals_traits::{LocationFix, SampleReader};

/// Test hook: make the IMU and PPG sims fail every Nth read.
const FAULT_ENV: &str = "VITALS_SIM_FAULT_EVERY";
/// Ctrl-C poll interval while waiting for the next publish.
const TICK: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct SimParams {
    pub cadence_spm: f32,
    pub bpm: f32,
    pub fall_at_ms: Option<u32>,
    pub contact: bool,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            cadence_spm: 0.0,
            bpm: 72.0,
            fall_at_ms: None,
            contact: true,
        }
    }
}

fn faults() -> FaultInjector {
    let every = std::env::var(FAULT_ENV)
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(0);
    FaultInjector::every(every)
}

/// The four simulated sources, configured from the node config.
pub struct SimSources {
    pub imu: SimulatedImu,
    pub ppg: SimulatedPpg,
    pub ambient: SimulatedAmbient,
    pub beacon: SimulatedBeacon,
}

impl SimSources {
    pub fn new(cfg: &NodeCfg, p: &SimParams) -> Self {
        let s = &cfg.sampling;
        let mut imu = SimulatedImu::new(s.motion_hz)
            .with_lsb_per_g(cfg.motion.accel_lsb_per_g)
            .with_cadence(p.cadence_spm)
            .with_faults(faults());
        if let Some(ms) = p.fall_at_ms {
            imu = imu.with_fall_at(ms);
        }
        let ppg = SimulatedPpg::new(s.ppg_hz)
            .with_bpm(p.bpm)
            .with_contact(p.contact)
            .with_faults(faults());
        let beacon = SimulatedBeacon::new(vec![
            vec![
                LocationFix {
                    major: 1,
                    minor: 7,
                    rssi: -61,
                },
                LocationFix {
                    major: 1,
                    minor: 9,
                    rssi: -78,
                },
            ],
            vec![LocationFix {
                major: 1,
                minor: 9,
                rssi: -55,
            }],
        ]);
        Self {
            imu,
            ppg,
            ambient: SimulatedAmbient::new(22.5, Some(45.0))
                .with_gas_resistance(68.0)
                .with_lux(320.0),
            beacon,
        }
    }
}

/// Run the simulated node until `seconds` elapse or Ctrl-C, publishing a
/// snapshot every `publish`.
pub fn run(cfg: NodeCfg, publish: Duration, seconds: u64, p: &SimParams, json: bool) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let sims = SimSources::new(&cfg, p);
    let node = SensorNode::builder()
        .with_config(cfg)
        .motion_reader(sims.imu)
        .ppg_reader(sims.ppg)
        .ambient_reader(sims.ambient)
        .location_reader(sims.beacon)
        .build()?;
    let running = node.start()?;
    tracing::info!(seconds, ?publish, "simulated node running");

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let mut last_generation = None;
    while Instant::now() < deadline && !stop.load(Ordering::Relaxed) {
        let wake = (Instant::now() + publish).min(deadline);
        while Instant::now() < wake && !stop.load(Ordering::Relaxed) {
            std::thread::sleep(wake.saturating_duration_since(Instant::now()).min(TICK));
        }
        for ev in running.drain_events() {
            print_event(&ev, json);
        }
        let snap = running.snapshot();
        if last_generation == Some(snap.generation) {
            tracing::debug!("no new measurements since last publish");
        }
        last_generation = Some(snap.generation);
        print_snapshot(&snap, json);
    }
    if stop.load(Ordering::Relaxed) {
        tracing::info!("interrupted; stopping node");
    }

    for st in running.stats() {
        tracing::info!(
            sampler = %st.name,
            samples = st.samples,
            errors = st.errors,
            stalled_ms = st.stalled_ms,
            "sampler stats"
        );
    }
    let events = running.drain_events();
    let last = running.stop();
    for ev in &events {
        print_event(ev, json);
    }
    if !json {
        println!("final: {}", crate::render::snapshot_text(&last));
    }
    Ok(())
}

fn check_one<R: SampleReader>(
    name: &str,
    reader: &mut R,
    cfg: &NodeCfg,
    clock: &MonotonicClock,
) -> Result<R::Sample> {
    let sample = read_with_retry(reader, cfg.sampling.sensor_timeout, &cfg.retry, clock)
        .wrap_err_with(|| format!("self-check: {name} read failed"))?;
    tracing::info!(source = name, "self-check read ok");
    Ok(sample)
}

/// Read each simulated source once through the retry path.
pub fn self_check(cfg: &NodeCfg, json: bool) -> Result<()> {
    let mut sims = SimSources::new(cfg, &SimParams::default());
    let clock = MonotonicClock::new();
    let imu = check_one("imu", &mut sims.imu, cfg, &clock)?;
    let ppg = check_one("ppg", &mut sims.ppg, cfg, &clock)?;
    let amb = check_one("ambient", &mut sims.ambient, cfg, &clock)?;
    let fix = check_one("beacon", &mut sims.beacon, cfg, &clock)?;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "type": "self_check",
                "ok": true,
                "imu": { "ax": imu.ax, "ay": imu.ay, "az": imu.az },
                "ppg": { "red": ppg.red, "ir": ppg.ir },
                "temperature_c": amb.temperature_c,
                "beacon": { "major": fix.major, "minor": fix.minor, "rssi": fix.rssi },
            })
        );
    } else {
        println!("imu ok: accel=({}, {}, {})", imu.ax, imu.ay, imu.az);
        println!("ppg ok: red={} ir={}", ppg.red, ppg.ir);
        println!("ambient ok: {:.1}C", amb.temperature_c);
        println!("beacon ok: {}/{} rssi={}", fix.major, fix.minor, fix.rssi);
        println!("OK");
    }
    Ok(())
}
