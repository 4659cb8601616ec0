//! Human-readable error descriptions and structured JSON error formatting.

use proxmotor_core::error::{BuildError, ControlError};
use proxmotor_core::find_control_error;

pub const EXIT_OTHER: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_ACTUATOR: i32 = 3;

fn build_error(err: &eyre::Report) -> Option<&BuildError> {
    err.chain().find_map(|c| c.downcast_ref::<BuildError>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = build_error(err) {
        return match be {
            BuildError::MissingClimateSensor | BuildError::MissingRangeSensor => {
                format!("What happened: {be}.\nLikely causes: A sensor failed to initialize or was not wired into the builder.\nHow to fix: Check the [pins] section and that the sensor is powered.")
            }
            BuildError::MissingMotor => {
                "What happened: No motor was provided to the control loop.\nLikely causes: The H-bridge driver failed to initialize.\nHow to fix: Ensure the motor is created successfully and passed via with_motor(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML or on the command line.\nHow to fix: Edit the config file or the override, then rerun."
            ),
        };
    }

    if let Some(ce) = find_control_error(err) {
        return match ce {
            ControlError::Actuator(msg) => format!(
                "What happened: The motor driver rejected a command ({msg}).\nLikely causes: H-bridge pins claimed by another process, PWM unavailable, or wiring fault.\nHow to fix: Check IN1/IN2/ENA wiring and GPIO permissions; the motor has been released."
            ),
            ControlError::Config(msg) => format!(
                "What happened: Configuration is invalid ({msg}).\nLikely causes: A typo or out-of-range value in the TOML file.\nHow to fix: Edit the config file and run `proxmotor health` to validate it."
            ),
            ControlError::Timeout => "What happened: A sensor read timed out.\nLikely causes: HC-SR04 or DHT11 not wired correctly, or no power/ground.\nHow to fix: Verify the sensor pins and raise timing.distance_timeout_ms if needed.".to_string(),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from init
    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("open hardware pins") {
        return "What happened: Failed to initialize hardware pins.\nLikely causes: Incorrect pin numbers or insufficient GPIO permissions.\nHow to fix: Fix the [pins] values in the config; ensure the process has permission to access GPIO.".to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes: actuator fault 3, configuration 2, anything else 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if build_error(err).is_some() {
        return EXIT_CONFIG;
    }
    match find_control_error(err) {
        Some(ControlError::Actuator(_)) => EXIT_ACTUATOR,
        Some(ControlError::Config(_)) => EXIT_CONFIG,
        _ => EXIT_OTHER,
    }
}

fn reason_name(err: &eyre::Report) -> &'static str {
    match exit_code_for_error(err) {
        EXIT_ACTUATOR => "ActuatorFault",
        EXIT_CONFIG => "InvalidConfig",
        _ => "Error",
    }
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;
    json!({
        "reason": reason_name(err),
        "exit_code": exit_code_for_error(err),
        "message": humanize(err),
    })
    .to_string()
}
