//! One control cycle: read, smooth, evaluate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use proxmotor_traits::clock::Clock;
use proxmotor_traits::{ClimateSensor, Motor, RangeSensor, SystemSample, SystemStats};

use crate::builder::{ControlLoopBuilder, Missing};
use crate::config::{ControlCfg, FilterCfg, Timing};
use crate::error::Result;
use crate::filter::MovingAverage;
use crate::motor::MotorController;
use crate::sensors::{SensorReader, sample_system_stats};
use crate::status::{MotorState, Transition};

/// Everything observed and decided during one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle index.
    pub cycle: u64,
    /// Milliseconds since the loop was built.
    pub elapsed_ms: u64,
    pub telemetry: Option<SystemSample>,
    pub temperature_c: Option<f32>,
    pub humidity_pct: Option<f32>,
    pub distance_cm: Option<f32>,
    pub smoothed_temperature_c: Option<f32>,
    pub smoothed_distance_cm: Option<f32>,
    pub transition: Transition,
    pub state: MotorState,
    pub stop_counter: u32,
}

/// Owns every collaborator and the per-stream filters.
pub struct ControlLoop {
    pub(crate) sensors: SensorReader<Box<dyn ClimateSensor>, Box<dyn RangeSensor>>,
    pub(crate) stats: Option<Box<dyn SystemStats>>,
    pub(crate) motor: MotorController<Box<dyn Motor>>,
    pub(crate) distance_filter: MovingAverage,
    pub(crate) temperature_filter: MovingAverage,
    pub(crate) filter: FilterCfg,
    pub(crate) control: ControlCfg,
    pub(crate) timing: Timing,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) epoch: Instant,
    pub(crate) cycle: u64,
}

impl core::fmt::Debug for ControlLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlLoop")
            .field("cycle", &self.cycle)
            .field("motor", &self.motor)
            .field("control", &self.control)
            .field("timing", &self.timing)
            .finish()
    }
}

impl ControlLoop {
    /// Start building a ControlLoop.
    pub fn builder() -> ControlLoopBuilder<Missing, Missing, Missing> {
        ControlLoopBuilder::default()
    }

    /// Run a single cycle. Only actuator faults are returned as errors.
    pub fn step(&mut self) -> Result<CycleReport> {
        self.cycle += 1;
        let elapsed_ms = self.clock.ms_since(self.epoch);

        let telemetry = self.stats.as_mut().and_then(|s| sample_system_stats(s));
        let (temperature_c, humidity_pct) = self.sensors.read_temperature_humidity();
        let distance_cm = self.sensors.read_distance(self.timing.distance_timeout());

        let smoothed_distance_cm = self.distance_filter.update(distance_cm);
        let smoothed_temperature_c = self.temperature_filter.update(temperature_c);

        let transition =
            self.motor
                .evaluate(smoothed_distance_cm, smoothed_temperature_c, &self.control)?;

        tracing::debug!(
            cycle = self.cycle,
            distance_cm = smoothed_distance_cm,
            temperature_c = smoothed_temperature_c,
            state = self.motor.state().as_str(),
            stop_counter = self.motor.stop_counter(),
            "cycle"
        );

        Ok(CycleReport {
            cycle: self.cycle,
            elapsed_ms,
            telemetry,
            temperature_c,
            humidity_pct,
            distance_cm,
            smoothed_temperature_c,
            smoothed_distance_cm,
            transition,
            state: self.motor.state(),
            stop_counter: self.motor.stop_counter(),
        })
    }

    /// Release the actuator (duty 0, pins freed). Safe to call more than once.
    pub fn release(&mut self) -> Result<()> {
        self.motor.release()
    }

    #[inline]
    pub fn period(&self) -> Duration {
        self.timing.period()
    }

    pub fn clock(&self) -> &Arc<dyn Clock + Send + Sync> {
        &self.clock
    }

    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycle
    }

    #[inline]
    pub fn motor_state(&self) -> MotorState {
        self.motor.state()
    }

    #[inline]
    pub fn stop_counter(&self) -> u32 {
        self.motor.stop_counter()
    }

    pub fn filter_cfg(&self) -> &FilterCfg {
        &self.filter
    }

    pub fn control_cfg(&self) -> &ControlCfg {
        &self.control
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }
}
