pub mod error;
pub mod sysstats;
pub mod util;

#[cfg(feature = "hardware")]
pub mod dht11;
#[cfg(feature = "hardware")]
pub mod hbridge;
#[cfg(feature = "hardware")]
pub mod hcsr04;

use proxmotor_traits::{Climate, ClimateSensor, Motor, RangeSensor};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::HwError;

pub use sysstats::ProcSystemStats;

/// Parse a comma-separated script of readings; an empty or `-` entry is a failed read.
///
/// `"20, 40,,20"` yields `[Some(20.0), Some(40.0), None, Some(20.0)]`.
pub fn parse_sim_script(s: &str) -> Result<Vec<Option<f32>>, std::num::ParseFloatError> {
    s.split(',')
        .map(str::trim)
        .map(|item| match item {
            "" | "-" => Ok(None),
            v => v.parse::<f32>().map(Some),
        })
        .collect()
}

/// Cycles through a script forever.
#[derive(Debug, Clone)]
struct Script {
    items: Vec<Option<f32>>,
    idx: usize,
}

impl Script {
    fn new(items: Vec<Option<f32>>) -> Self {
        Self { items, idx: 0 }
    }

    fn next(&mut self) -> Option<f32> {
        if self.items.is_empty() {
            return None;
        }
        let v = self.items[self.idx % self.items.len()];
        self.idx = self.idx.wrapping_add(1);
        v
    }
}

/// Simulated ultrasonic ranger; a `None` script entry behaves like an echo timeout.
pub struct SimulatedRangeSensor {
    script: Script,
}

impl SimulatedRangeSensor {
    pub fn constant(cm: f32) -> Self {
        Self::scripted(vec![Some(cm)])
    }

    pub fn scripted(items: Vec<Option<f32>>) -> Self {
        Self {
            script: Script::new(items),
        }
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn read_cm(&mut self, _timeout: Duration) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let v = self.script.next().ok_or(HwError::EchoTimeout)?;
        tracing::trace!(cm = v, "simulated range read");
        Ok(v)
    }
}

/// Simulated DHT11; a `None` temperature entry behaves like a failed transaction.
pub struct SimulatedClimateSensor {
    temperature: Script,
    humidity_pct: f32,
}

impl SimulatedClimateSensor {
    pub fn constant(temperature_c: f32, humidity_pct: f32) -> Self {
        Self::scripted(vec![Some(temperature_c)], humidity_pct)
    }

    pub fn scripted(temperatures: Vec<Option<f32>>, humidity_pct: f32) -> Self {
        Self {
            temperature: Script::new(temperatures),
            humidity_pct,
        }
    }
}

impl ClimateSensor for SimulatedClimateSensor {
    fn read(&mut self) -> Result<Climate, Box<dyn std::error::Error + Send + Sync>> {
        let t = self.temperature.next().ok_or(HwError::DhtTimeout)?;
        tracing::trace!(temperature_c = t, "simulated climate read");
        Ok(Climate {
            temperature_c: Some(t),
            humidity_pct: Some(self.humidity_pct),
        })
    }
}

/// Command recorded by [`SimulatedMotor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotorCommand {
    Forward,
    Duty(f32),
    Release,
}

/// Simulated H-bridge that records every command it receives.
#[derive(Debug, Default)]
pub struct SimulatedMotor {
    log: Rc<RefCell<Vec<MotorCommand>>>,
}

impl SimulatedMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the command log; stays readable after the motor is moved away.
    pub fn log(&self) -> Rc<RefCell<Vec<MotorCommand>>> {
        self.log.clone()
    }

    fn record(&self, cmd: MotorCommand) {
        tracing::debug!(?cmd, "simulated motor");
        self.log.borrow_mut().push(cmd);
    }
}

impl Motor for SimulatedMotor {
    fn forward(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(MotorCommand::Forward);
        Ok(())
    }

    fn set_duty_cycle(&mut self, percent: f32) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(MotorCommand::Duty(percent));
        Ok(())
    }

    fn release(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.record(MotorCommand::Release);
        Ok(())
    }
}

#[cfg(feature = "hardware")]
pub use hardware::*;

#[cfg(feature = "hardware")]
mod hardware {
    use std::time::Duration;

    pub use crate::dht11::Dht11;
    pub use crate::hbridge::HBridgeMotor;
    pub use crate::hcsr04::HcSr04;
    use crate::error::Result;

    /// BCM pin assignment for every device the controller drives.
    #[derive(Debug, Clone, Copy)]
    pub struct PinMap {
        pub dht: u8,
        pub trig: u8,
        pub echo: u8,
        pub in1: u8,
        pub in2: u8,
        pub ena: u8,
    }

    /// Claim every pin and return the three devices.
    pub fn open_devices(
        pins: PinMap,
        ranger_settle: Duration,
        pwm_hz: f64,
    ) -> Result<(Dht11, HcSr04, HBridgeMotor)> {
        let dht = Dht11::open(pins.dht)?;
        let ranger = HcSr04::open(pins.trig, pins.echo, ranger_settle)?;
        let motor = HBridgeMotor::open(pins.in1, pins.in2, pins.ena, pwm_hz)?;
        tracing::info!(?pins, pwm_hz, "hardware opened");
        Ok((dht, ranger, motor))
    }
}
