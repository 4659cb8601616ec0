use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Minimal valid TOML config for sim mode
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[control]
distance_threshold_cm = 30.0
temperature_threshold_c = 23.0
stop_tolerance = 3

[timing]
period_ms = 100
distance_timeout_ms = 10

[telemetry]
# keep test output independent of the host's procfs
enabled = false
"#;
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn proxmotor(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("proxmotor").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("error");
    cmd.env_remove("RUST_LOG")
        .env_remove("PROXMOTOR_SIM_DISTANCE_CM")
        .env_remove("PROXMOTOR_SIM_TEMP_C");
    cmd
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["health"], 0, "ok", "stdout")]
#[case(&["self-check"], 0, "self-check: ok", "stdout")]
#[case(&["run", "--cycles", "2", "--period-ms", "1"], 0, "stopped after 2 cycles", "stdout")]
#[case(&["run", "--cycles"], 2, "value is required", "stderr")]
#[case(&["dose"], 2, "unrecognized subcommand", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let mut cmd = proxmotor(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[rstest]
fn missing_config_file_uses_defaults() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("does-not-exist.toml");
    proxmotor(&cfg)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok"));
}

#[rstest]
#[case("[control]\nstop_tolerance = 0\n", "stop_tolerance")]
#[case("[filter]\ndistance_window = 0\n", "distance_window")]
#[case("[pins]\ntrig = 17\n", "distinct")]
#[case("[control\n", "parse config")]
fn invalid_config_exits_with_code_2(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, toml).unwrap();
    proxmotor(&cfg)
        .arg("health")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}

#[rstest]
fn scripted_sensors_start_and_stop_the_motor() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = proxmotor(&cfg)
        .env("PROXMOTOR_SIM_DISTANCE_CM", "20,40,40,40")
        .env("PROXMOTOR_SIM_TEMP_C", "25")
        .args(["run", "--cycles", "4", "--period-ms", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);

    assert!(stdout.contains("Motor: RUNNING"), "stdout: {stdout}");
    assert!(stdout.contains("Motor stop counter: 1/3"), "stdout: {stdout}");
    assert!(stdout.contains("Motor stop counter: 2/3"), "stdout: {stdout}");
    assert!(stdout.contains("Motor: STOPPED"), "stdout: {stdout}");
    assert!(stdout.contains("Distance: 20.00 cm (filt: 20.00)"), "stdout: {stdout}");
    assert!(stdout.contains("Temperature: 25.0°C"), "stdout: {stdout}");
}

#[rstest]
fn failed_reads_print_dashes_and_keep_running() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    proxmotor(&cfg)
        .env("PROXMOTOR_SIM_DISTANCE_CM", ",")
        .env("PROXMOTOR_SIM_TEMP_C", "-")
        .args(["run", "--cycles", "3", "--period-ms", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Distance: ---- cm (filt: ----)"))
        .stdout(predicate::str::contains("Temperature: ----°C"))
        .stdout(predicate::str::contains("stopped after 3 cycles"));
}

#[rstest]
fn bad_sim_script_is_a_config_error() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    proxmotor(&cfg)
        .env("PROXMOTOR_SIM_DISTANCE_CM", "20,abc")
        .args(["run", "--cycles", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PROXMOTOR_SIM_DISTANCE_CM"));
}

/// Validate the JSONL schema of a run.
#[rstest]
fn json_run_prints_one_object_per_cycle() {
    let dir = tempdir().unwrap();
    let cfg = write_valid_config(&dir);

    let out = proxmotor(&cfg)
        .arg("--json")
        .env("PROXMOTOR_SIM_DISTANCE_CM", "20,")
        .env("PROXMOTOR_SIM_TEMP_C", "25")
        .args(["run", "--cycles", "3", "--period-ms", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8_lossy(&out);
    let objects: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect();

    assert_eq!(objects.len(), 3, "stdout: {stdout}");
    for (i, v) in objects.iter().enumerate() {
        assert_eq!(v["cycle"].as_u64(), Some(i as u64 + 1));
        assert!(v.get("timestamp").and_then(|x| x.as_i64()).is_some());
        assert!(v.get("state").and_then(|x| x.as_str()).is_some());
        assert!(v["telemetry"].is_null());
    }
    assert_eq!(objects[0]["transition"], "started");
    // A failed read keeps the last smoothed value.
    assert!(objects[1]["distance_cm"].is_null());
    assert_eq!(objects[1]["smoothed_distance_cm"], 20.0);
    assert_eq!(objects[1]["state"], "running");
}
