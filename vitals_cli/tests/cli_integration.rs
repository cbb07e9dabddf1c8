use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Every section is optional; keep the run fast and the beacon frequent.
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[sampling]
motion_hz = 100
ppg_hz = 100
ambient_hz = 10
location_period_ms = 100
publish_ms = 200
sensor_timeout_ms = 10

[retry]
max_attempts = 2
delay_ms = 5
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_motion_csv(dir: &tempfile::TempDir) -> PathBuf {
    // Two seconds at rest on a ±16 g part, then one hard sideways impact.
    let mut csv = String::from("t_ms,ax,ay,az,gx,gy,gz\n");
    for i in 0..200u32 {
        csv.push_str(&format!("{},0,0,2048,0,0,0\n", i * 10));
    }
    csv.push_str("2000,0,12288,0,0,0,0\n");
    for i in 201..300u32 {
        csv.push_str(&format!("{},0,0,2048,0,0,0\n", i * 10));
    }
    let path = dir.path().join("motion.csv");
    fs::write(&path, csv).unwrap();
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "OK", "stdout")]
#[case(&["replay"], 2, "required", "stderr")]
#[case(&["bogus"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.env_remove("VITALS_SIM_FAULT_EVERY")
        .arg("--config")
        .arg(&cfg)
        .args(args);
    let assert = cmd.assert().code(code);
    match stream {
        "stdout" => assert.stdout(predicate::str::contains(needle)),
        _ => assert.stderr(predicate::str::contains(needle)),
    };
}

#[test]
fn missing_config_file_is_explained() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--config")
        .arg(dir.path().join("nope.toml"))
        .arg("self-check");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Could not read the config file"));
}

#[rstest]
#[case("[retry]\nmax_attempts = 0\n", "retry.max_attempts must be >= 1")]
#[case("[sampling]\nmotion_hz = 0\n", "sampling rates")]
#[case("[motion]\nhysteresis_ratio = 1.5\n", "motion.hysteresis_ratio")]
fn invalid_config_exits_with_config_code(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();
    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("Invalid configuration"))
        .stderr(predicate::str::contains(needle));
}

#[test]
fn malformed_toml_is_reported() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[sampling]\nmotion_hz = \"fast\"\n").unwrap();
    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--config").arg(&cfg).arg("self-check");
    cmd.assert()
        .code(3)
        .stderr(predicate::str::contains("not valid TOML"));
}

#[test]
fn replay_reports_fall_and_clear() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("cfg.toml");
    fs::write(
        &cfg,
        "[motion]\naccel_lsb_per_g = 2048.0\n\n[fall_alert]\nhold_ms = 500\n",
    )
    .unwrap();
    let motion = write_motion_csv(&dir);

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--motion")
        .arg(&motion);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[2000ms] FALL right"))
        .stdout(predicate::str::contains("[2500ms] fall alert cleared"))
        .stdout(predicate::str::contains("replayed 300 motion / 0 ppg samples"))
        .stdout(predicate::str::contains("1 falls"));
}

#[test]
fn replay_rejects_wrong_headers() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let motion = dir.path().join("motion.csv");
    fs::write(&motion, "time,ax,ay,az\n0,0,0,16384\n").unwrap();

    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--motion")
        .arg(&motion);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid headers in recording CSV"));
}

#[test]
fn short_run_prints_snapshots_and_final() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);
    let mut cmd = Command::cargo_bin("vitals").unwrap();
    cmd.env_remove("VITALS_SIM_FAULT_EVERY")
        .arg("--config")
        .arg(&cfg)
        .args(["run", "--seconds", "1"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("temp="))
        .stdout(predicate::str::contains("final: "));
}
