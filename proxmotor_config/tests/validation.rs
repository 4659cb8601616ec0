use proxmotor_config::{load_file, load_toml};
use rstest::rstest;

const FULL: &str = r#"
[pins]
dht = 17
trig = 23
echo = 24
in1 = 27
in2 = 22
ena = 18

[filter]
distance_window = 3
temperature_window = 2

[control]
distance_threshold_cm = 30.0
temperature_threshold_c = 23.0
stop_tolerance = 3
active_duty_pct = 80.0

[timing]
period_ms = 3000
distance_timeout_ms = 50
distance_settle_ms = 50

[motor]
pwm_frequency_hz = 1000.0

[telemetry]
enabled = false

[logging]
level = "debug"
rotation = "daily"
"#;

#[test]
fn accepts_full_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.filter.distance_window, 3);
    assert_eq!(cfg.filter.temperature_window, 2);
    assert!(!cfg.telemetry.enabled);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[rstest]
#[case("[filter]\ndistance_window = 0\n", "filter.distance_window must be >= 1")]
#[case("[filter]\ntemperature_window = 0\n", "filter.temperature_window must be >= 1")]
#[case("[control]\nstop_tolerance = 0\n", "stop_tolerance must be >= 1")]
#[case("[control]\nactive_duty_pct = 0.0\n", "active_duty_pct must be in")]
#[case("[control]\nactive_duty_pct = 120.0\n", "active_duty_pct must be in")]
#[case("[control]\ndistance_threshold_cm = -1.0\n", "distance_threshold_cm must be > 0")]
#[case("[timing]\nperiod_ms = 0\n", "period_ms must be >= 1")]
#[case("[timing]\ndistance_timeout_ms = 0\n", "distance_timeout_ms must be >= 1")]
#[case("[timing]\nperiod_ms = 40\ndistance_timeout_ms = 50\n", "shorter than timing.period_ms")]
#[case("[motor]\npwm_frequency_hz = 0.0\n", "pwm_frequency_hz must be > 0")]
#[case("[pins]\nena = 27\n", "pins must be distinct")]
#[case("[pins]\ndht = 40\n", "bcm numbers")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation must be one of")]
fn rejects_invalid_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    let msg = format!("{err}").to_lowercase();
    assert!(
        msg.contains(&needle.to_lowercase()),
        "expected {needle:?} in {msg:?}"
    );
}

#[test]
fn rejects_unknown_types() {
    let err = load_toml("[control]\nstop_tolerance = \"three\"\n").expect_err("type error");
    assert!(err.to_string().contains("stop_tolerance"));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_file(&dir.path().join("absent.toml")).expect("defaults");
    assert_eq!(cfg.control.distance_threshold_cm, 30.0);
}

#[test]
fn file_parse_errors_name_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[control\n").unwrap();
    let err = load_file(&path).expect_err("bad toml");
    assert!(format!("{err}").contains("bad.toml"));
}
