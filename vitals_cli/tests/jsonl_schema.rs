use assert_cmd::prelude::*;
use rstest::rstest;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
motion_hz = 100
ppg_hz = 100
ambient_hz = 10
location_period_ms = 100
publish_ms = 200
sensor_timeout_ms = 10
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("not JSON: {l} ({e})")))
        .collect()
}

/// Every stdout line of a JSON run is one object with a `type` tag.
#[rstest]
fn jsonl_run_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.env_remove("VITALS_SIM_FAULT_EVERY")
        .arg("--json")
        .arg("--log-level")
        .arg("warn")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--seconds", "1", "--cadence", "120"]);
    let out = cmd.output().unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let lines = json_lines(&out.stdout);
    let snapshots: Vec<_> = lines.iter().filter(|v| v["type"] == "snapshot").collect();
    assert!(!snapshots.is_empty());
    for v in &lines {
        assert!(v["type"].is_string(), "untagged line: {v}");
    }
    for key in [
        "timestamp_ms",
        "generation",
        "temperature_c",
        "humidity_pct",
        "heart_rate_bpm",
        "spo2_pct",
        "spo2_status",
        "steps",
        "fall_detected",
        "location",
        "tvoc_ppb",
        "gas_resistance_kohm",
        "gas_ratio",
        "lux",
    ] {
        assert!(snapshots[0].get(key).is_some(), "missing {key}");
    }
    let last = snapshots.last().unwrap();
    assert!(last["temperature_c"].is_number());
    assert_eq!(last["humidity_pct"], 45.0);
    assert!(last["location"]["minor"].is_number());
    assert!(last["tvoc_ppb"].is_number());
    assert_eq!(last["lux"], 320.0);
}

#[rstest]
fn jsonl_replay_summary() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let ppg = dir.path().join("ppg.csv");
    fs::write(&ppg, "t_us,red,ir\n0,100000,100000\n10000,100000,100000\n").unwrap();
    let motion = dir.path().join("motion.csv");
    fs::write(&motion, "t_ms,ax,ay,az,gx,gy,gz\n0,0,0,16384,0,0,0\n").unwrap();

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--motion")
        .arg(&motion)
        .arg("--ppg")
        .arg(&ppg);
    let out = cmd.output().unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    let summary = lines.iter().find(|v| v["type"] == "summary").unwrap();
    assert_eq!(summary["motion_samples"], 1);
    assert_eq!(summary["ppg_samples"], 2);
    assert_eq!(summary["steps"], 0);
    let snap = lines.iter().find(|v| v["type"] == "snapshot").unwrap();
    assert_eq!(snap["heart_rate_bpm"], Value::Null);
}

#[rstest]
fn jsonl_error_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.env("VITALS_SIM_FAULT_EVERY", "1")
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check");
    let out = cmd.output().unwrap();
    assert_eq!(out.status.code(), Some(4));

    let lines = json_lines(&out.stdout);
    let err = lines.last().unwrap();
    assert_eq!(err["type"], "error");
    assert_eq!(err["reason"], "Timeout");
    assert_eq!(err["exit_code"], 4);
    assert!(err["message"].as_str().unwrap().contains("What happened"));
}
