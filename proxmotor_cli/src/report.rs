//! Console and JSON rendering of cycle reports.

use proxmotor_core::{CycleReport, Transition};
use proxmotor_traits::SystemSample;
use serde_json::json;

const ABSENT: &str = "----";

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn one_decimal(v: Option<f32>) -> String {
    v.map_or_else(|| ABSENT.to_string(), |x| format!("{x:.1}"))
}

fn two_decimals(v: Option<f32>) -> String {
    v.map_or_else(|| ABSENT.to_string(), |x| format!("{x:.2}"))
}

fn telemetry_line(t: Option<SystemSample>) -> String {
    match t {
        Some(s) => format!(
            "CPU: {}°C, CPU%: {:.1}, RAM%: {:.1}",
            one_decimal(s.cpu_temp_c),
            s.cpu_percent,
            s.ram_percent
        ),
        None => format!("CPU: {ABSENT}°C, CPU%: {ABSENT}, RAM%: {ABSENT}"),
    }
}

fn climate_line(t: Option<f32>, smoothed: Option<f32>, h: Option<f32>) -> String {
    format!(
        "Temperature: {}°C (filt: {}), Humidity: {}%",
        one_decimal(t),
        one_decimal(smoothed),
        one_decimal(h)
    )
}

fn distance_line(d: Option<f32>, smoothed: Option<f32>) -> String {
    format!(
        "Distance: {} cm (filt: {})",
        two_decimals(d),
        two_decimals(smoothed)
    )
}

/// Motor line for a transition; `None` when nothing worth printing happened.
fn motor_line(t: Transition) -> Option<String> {
    match t {
        Transition::Started => Some("Motor: RUNNING".to_string()),
        Transition::Stopped => Some("Motor: STOPPED".to_string()),
        Transition::StopPending { count, tolerance } => {
            Some(format!("Motor stop counter: {count}/{tolerance}"))
        }
        Transition::Recovered { .. } | Transition::Unchanged => None,
    }
}

/// Text lines for one cycle, without the timestamp prefix.
pub fn console_lines(r: &CycleReport) -> Vec<String> {
    let mut lines = vec![
        telemetry_line(r.telemetry),
        climate_line(r.temperature_c, r.smoothed_temperature_c, r.humidity_pct),
        distance_line(r.distance_cm, r.smoothed_distance_cm),
    ];
    lines.extend(motor_line(r.transition));
    lines
}

fn transition_name(t: Transition) -> &'static str {
    match t {
        Transition::Unchanged => "unchanged",
        Transition::Started => "started",
        Transition::StopPending { .. } => "stop_pending",
        Transition::Recovered { .. } => "recovered",
        Transition::Stopped => "stopped",
    }
}

pub fn json_line(r: &CycleReport, stop_tolerance: u32) -> serde_json::Value {
    let telemetry = r.telemetry.map(|s| {
        json!({
            "cpu_temp_c": s.cpu_temp_c,
            "cpu_percent": s.cpu_percent,
            "ram_percent": s.ram_percent,
        })
    });
    json!({
        "timestamp": chrono::Utc::now().timestamp_millis(),
        "cycle": r.cycle,
        "elapsed_ms": r.elapsed_ms,
        "telemetry": telemetry,
        "temperature_c": r.temperature_c,
        "humidity_pct": r.humidity_pct,
        "distance_cm": r.distance_cm,
        "smoothed_temperature_c": r.smoothed_temperature_c,
        "smoothed_distance_cm": r.smoothed_distance_cm,
        "transition": transition_name(r.transition),
        "state": r.state.as_str(),
        "stop_counter": r.stop_counter,
        "stop_tolerance": stop_tolerance,
    })
}

/// Prints every cycle to stdout, as text or JSON lines.
pub struct Reporter {
    json: bool,
    stop_tolerance: u32,
}

impl Reporter {
    pub fn new(json: bool, stop_tolerance: u32) -> Self {
        Self {
            json,
            stop_tolerance,
        }
    }

    pub fn cycle(&mut self, r: &CycleReport) {
        if self.json {
            println!("{}", json_line(r, self.stop_tolerance));
            return;
        }
        let ts = timestamp();
        for line in console_lines(r) {
            if line.starts_with("Motor") {
                println!("{line}");
            } else {
                println!("[{ts}] {line}");
            }
        }
        println!("{}", "-".repeat(50));
    }
}

pub fn print_self_check(
    temperature_c: Option<f32>,
    humidity_pct: Option<f32>,
    distance_cm: Option<f32>,
    telemetry: Option<SystemSample>,
) {
    if crate::cli::json_mode() {
        println!(
            "{}",
            json!({
                "temperature_c": temperature_c,
                "humidity_pct": humidity_pct,
                "distance_cm": distance_cm,
                "cpu_temp_c": telemetry.and_then(|t| t.cpu_temp_c),
                "ram_percent": telemetry.map(|t| t.ram_percent),
            })
        );
        return;
    }
    println!("{}", telemetry_line(telemetry));
    println!("{}", climate_line(temperature_c, None, humidity_pct));
    println!("{}", distance_line(distance_cm, None));
    println!("self-check: ok");
}
