#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the proximity/temperature motor controller.
//!
//! `Config` and its sections are deserialized from TOML and validated. Every
//! field has a default so an empty file describes the stock wiring and
//! thresholds.
use serde::Deserialize;

/// BCM pin numbers.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pins {
    pub dht: u8,
    pub trig: u8,
    pub echo: u8,
    pub in1: u8,
    pub in2: u8,
    pub ena: u8,
}

impl Default for Pins {
    fn default() -> Self {
        Self {
            dht: 17,
            trig: 23,
            echo: 24,
            in1: 27,
            in2: 22,
            ena: 18,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Moving average window for distance samples (1 = pass-through)
    pub distance_window: usize,
    /// Moving average window for temperature samples (1 = pass-through)
    pub temperature_window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            distance_window: 1,
            temperature_window: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ControlCfg {
    /// Motor may run only while the smoothed distance is below this (cm)
    pub distance_threshold_cm: f32,
    /// Motor may run only while the smoothed temperature is above this (°C)
    pub temperature_threshold_c: f32,
    /// Consecutive failing cycles tolerated while running before stopping
    pub stop_tolerance: u32,
    /// PWM duty applied on start, in percent
    pub active_duty_pct: f32,
}

impl Default for ControlCfg {
    fn default() -> Self {
        Self {
            distance_threshold_cm: 30.0,
            temperature_threshold_c: 23.0,
            stop_tolerance: 3,
            active_duty_pct: 80.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Delay between control cycles (ms). Also accepts alias "base_delay_ms".
    #[serde(alias = "base_delay_ms")]
    pub period_ms: u64,
    /// Upper bound on each HC-SR04 echo edge wait (ms)
    pub distance_timeout_ms: u64,
    /// Trigger line settle time before each ping (ms)
    pub distance_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            period_ms: 3000,
            distance_timeout_ms: 50,
            distance_settle_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MotorCfg {
    /// Software PWM frequency on the enable pin
    pub pwm_frequency_hz: f64,
}

impl Default for MotorCfg {
    fn default() -> Self {
        Self {
            pwm_frequency_hz: 1000.0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryCfg {
    /// Sample CPU temperature/load and RAM usage every cycle
    pub enabled: bool,
    /// sysfs file reporting SoC temperature in millidegrees
    pub thermal_zone: String,
}

impl Default for TelemetryCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            thermal_zone: "/sys/class/thermal/thermal_zone0/temp".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub pins: Pins,
    pub filter: FilterCfg,
    pub control: ControlCfg,
    pub timing: Timing,
    pub motor: MotorCfg,
    pub telemetry: TelemetryCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file. A missing file yields the defaults.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    match std::fs::read_to_string(path) {
        Ok(text) => load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(eyre::eyre!("read config {:?}: {}", path, e)),
    }
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Pins
        let p = &self.pins;
        let all = [p.dht, p.trig, p.echo, p.in1, p.in2, p.ena];
        if all.iter().any(|&pin| pin > 27) {
            eyre::bail!("pins must be BCM numbers in 0..=27");
        }
        for (i, a) in all.iter().enumerate() {
            if all[i + 1..].contains(a) {
                eyre::bail!("pins must be distinct (pin {a} assigned twice)");
            }
        }

        // Filter
        if self.filter.distance_window == 0 {
            eyre::bail!("filter.distance_window must be >= 1");
        }
        if self.filter.temperature_window == 0 {
            eyre::bail!("filter.temperature_window must be >= 1");
        }

        // Control
        if !self.control.distance_threshold_cm.is_finite()
            || self.control.distance_threshold_cm <= 0.0
        {
            eyre::bail!("control.distance_threshold_cm must be > 0");
        }
        if !self.control.temperature_threshold_c.is_finite() {
            eyre::bail!("control.temperature_threshold_c must be finite");
        }
        if self.control.stop_tolerance == 0 {
            eyre::bail!("control.stop_tolerance must be >= 1");
        }
        if !(self.control.active_duty_pct > 0.0 && self.control.active_duty_pct <= 100.0) {
            eyre::bail!("control.active_duty_pct must be in (0.0, 100.0]");
        }

        // Timing
        if self.timing.period_ms == 0 {
            eyre::bail!("timing.period_ms must be >= 1");
        }
        if self.timing.period_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("timing.period_ms is unreasonably large (>24h)");
        }
        if self.timing.distance_timeout_ms == 0 {
            eyre::bail!("timing.distance_timeout_ms must be >= 1");
        }
        if self.timing.distance_timeout_ms >= self.timing.period_ms {
            eyre::bail!("timing.distance_timeout_ms must be shorter than timing.period_ms");
        }

        // Motor
        if !(self.motor.pwm_frequency_hz > 0.0 && self.motor.pwm_frequency_hz.is_finite()) {
            eyre::bail!("motor.pwm_frequency_hz must be > 0");
        }

        // Logging
        if let Some(r) = self.logging.rotation.as_deref()
            && !matches!(r, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never, daily, hourly");
        }

        Ok(())
    }
}
