use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[rstest]
fn imu_timeout_bubbles_to_cli() {
    let dir = tempdir().unwrap();
    let toml = r#"
[sampling]
sensor_timeout_ms = 5

[retry]
max_attempts = 3
delay_ms = 1
"#;
    let cfg = dir.path().join("cfg.toml");
    fs::write(&cfg, toml).unwrap();

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.env("VITALS_SIM_FAULT_EVERY", "1");
    cmd.arg("--config").arg(&cfg).arg("self-check");
    cmd.assert()
        .code(4)
        .stderr(predicate::str::contains("What happened: Sensor read timed out"))
        .stdout(predicate::str::contains("imu ok").not());
}
