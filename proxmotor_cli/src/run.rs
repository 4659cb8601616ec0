//! Collaborator assembly and command execution.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use proxmotor_core::error::{ControlError, Report};
use proxmotor_core::runner::{self, RunOptions, RunSummary};
use proxmotor_core::sensors::{SensorReader, sample_system_stats};
use proxmotor_core::{ControlCfg, ControlLoop, FilterCfg, Timing};
use proxmotor_hardware::ProcSystemStats;
use proxmotor_traits::{ClimateSensor, Motor, RangeSensor, SystemStats};

use crate::report::Reporter;

pub type Devices = (Box<dyn ClimateSensor>, Box<dyn RangeSensor>, Box<dyn Motor>);

/// Simulated sensor scripts (comma separated, empty entry = failed read).
#[cfg(not(feature = "hardware"))]
pub const SIM_DISTANCE_ENV: &str = "PROXMOTOR_SIM_DISTANCE_CM";
#[cfg(not(feature = "hardware"))]
pub const SIM_TEMP_ENV: &str = "PROXMOTOR_SIM_TEMP_C";

// Idle readings used when no script is given: far away and cool.
#[cfg(not(feature = "hardware"))]
const SIM_DEFAULT_DISTANCE_CM: f32 = 100.0;
#[cfg(not(feature = "hardware"))]
const SIM_DEFAULT_TEMP_C: f32 = 21.0;
#[cfg(not(feature = "hardware"))]
const SIM_HUMIDITY_PCT: f32 = 45.0;

fn config_error(e: impl std::fmt::Display) -> Report {
    Report::new(ControlError::Config(e.to_string()))
}

#[cfg(feature = "hardware")]
pub fn open_devices(cfg: &proxmotor_config::Config) -> eyre::Result<Devices> {
    let p = &cfg.pins;
    let pins = proxmotor_hardware::PinMap {
        dht: p.dht,
        trig: p.trig,
        echo: p.echo,
        in1: p.in1,
        in2: p.in2,
        ena: p.ena,
    };
    let settle = std::time::Duration::from_millis(cfg.timing.distance_settle_ms);
    let (dht, ranger, motor) =
        proxmotor_hardware::open_devices(pins, settle, cfg.motor.pwm_frequency_hz)
            .map_err(|e| eyre::eyre!("open hardware pins: {e}"))?;
    Ok((Box::new(dht), Box::new(ranger), Box::new(motor)))
}

#[cfg(not(feature = "hardware"))]
pub fn open_devices(_cfg: &proxmotor_config::Config) -> eyre::Result<Devices> {
    use proxmotor_hardware::{
        SimulatedClimateSensor, SimulatedMotor, SimulatedRangeSensor, parse_sim_script,
    };

    let script = |var: &str| -> eyre::Result<Option<Vec<Option<f32>>>> {
        match std::env::var(var) {
            Ok(s) => parse_sim_script(&s)
                .map(Some)
                .map_err(|e| config_error(format!("invalid {var}: {e}"))),
            Err(_) => Ok(None),
        }
    };

    let range = match script(SIM_DISTANCE_ENV)? {
        Some(items) => SimulatedRangeSensor::scripted(items),
        None => SimulatedRangeSensor::constant(SIM_DEFAULT_DISTANCE_CM),
    };
    let climate = match script(SIM_TEMP_ENV)? {
        Some(items) => SimulatedClimateSensor::scripted(items, SIM_HUMIDITY_PCT),
        None => SimulatedClimateSensor::constant(SIM_DEFAULT_TEMP_C, SIM_HUMIDITY_PCT),
    };
    tracing::info!(backend = "sim", "devices opened");
    Ok((Box::new(climate), Box::new(range), Box::new(SimulatedMotor::new())))
}

fn system_stats(cfg: &proxmotor_config::Config) -> Option<ProcSystemStats> {
    cfg.telemetry
        .enabled
        .then(|| ProcSystemStats::new(&cfg.telemetry.thermal_zone))
}

/// Load and validate the config file; every failure is a config error.
pub fn load_config(path: &std::path::Path) -> eyre::Result<proxmotor_config::Config> {
    let cfg = proxmotor_config::load_file(path).map_err(config_error)?;
    cfg.validate().map_err(config_error)?;
    Ok(cfg)
}

pub fn run_loop(
    cfg: &proxmotor_config::Config,
    cycles: Option<u64>,
    period_ms: Option<u64>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<RunSummary> {
    let filter: FilterCfg = (&cfg.filter).into();
    let control: ControlCfg = (&cfg.control).into();
    let mut timing: Timing = (&cfg.timing).into();
    if let Some(ms) = period_ms {
        timing.period_ms = ms;
    }

    let (climate, range, motor) = open_devices(cfg)?;
    let mut builder = ControlLoop::builder()
        .with_climate_sensor(climate)
        .with_range_sensor(range)
        .with_motor(motor)
        .with_filter(filter)
        .with_control(control)
        .with_timing(timing);
    if let Some(stats) = system_stats(cfg) {
        builder = builder.with_system_stats(stats);
    }
    let ctl = builder.build().wrap_err("assemble control loop")?;

    let mut reporter = Reporter::new(crate::cli::json_mode(), cfg.control.stop_tolerance);
    runner::run(ctl, &shutdown, RunOptions { max_cycles: cycles }, |r| {
        reporter.cycle(r)
    })
}

/// One reading from every collaborator, then release the motor.
pub fn self_check(cfg: &proxmotor_config::Config) -> eyre::Result<()> {
    let (climate, range, mut motor) = open_devices(cfg)?;
    let timing: Timing = (&cfg.timing).into();

    let mut sensors = SensorReader::new(climate, range);
    let (temperature_c, humidity_pct) = sensors.read_temperature_humidity();
    let distance_cm = sensors.read_distance(timing.distance_timeout());
    let telemetry = system_stats(cfg).and_then(|mut s| {
        // First CPU% sample only primes the counters.
        let _ = s.sample();
        sample_system_stats(&mut s)
    });

    let released = motor.release();
    crate::report::print_self_check(temperature_c, humidity_pct, distance_cm, telemetry);
    released.map_err(|e| Report::new(ControlError::Actuator(e.to_string())))
}
