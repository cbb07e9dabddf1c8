#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    let Ok(cfg) = toml::from_str::<vitals_config::Config>(data) else {
        return;
    };
    if cfg.validate().is_err() {
        return;
    }
    // A config that validates must also build both detectors.
    let node = vitals_core::NodeCfg::from(&cfg);
    let _ = vitals_core::MotionDetector::with_config(node.motion, node.sampling.motion_hz as f32);
    let _ = vitals_core::VitalEstimator::new(node.vitals);
});
