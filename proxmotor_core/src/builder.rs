//! Type-state builder for `ControlLoop`.
//!
//! The builder enforces at compile time that the climate sensor, range sensor and
//! motor are provided before `build()` is available. `try_build()` is always
//! available for dynamic checks.

use std::marker::PhantomData;
use std::sync::Arc;

use proxmotor_traits::clock::{Clock, MonotonicClock};
use proxmotor_traits::{ClimateSensor, Motor, RangeSensor, SystemStats};

use crate::config::{ControlCfg, FilterCfg, Timing};
use crate::control::ControlLoop;
use crate::error::{BuildError, Result};
use crate::filter::MovingAverage;
use crate::motor::MotorController;
use crate::sensors::SensorReader;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Builder for `ControlLoop`. All configuration is validated on build.
pub struct ControlLoopBuilder<C, R, M> {
    climate: Option<Box<dyn ClimateSensor>>,
    range: Option<Box<dyn RangeSensor>>,
    motor: Option<Box<dyn Motor>>,
    stats: Option<Box<dyn SystemStats>>,
    filter: Option<FilterCfg>,
    control: Option<ControlCfg>,
    timing: Option<Timing>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _c: PhantomData<C>,
    _r: PhantomData<R>,
    _m: PhantomData<M>,
}

impl Default for ControlLoopBuilder<Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            climate: None,
            range: None,
            motor: None,
            stats: None,
            filter: None,
            control: None,
            timing: None,
            clock: None,
            _c: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }
}

impl<C, R, M> ControlLoopBuilder<C, R, M> {
    /// Move every field into a builder with different type-state markers.
    fn retag<C2, R2, M2>(self) -> ControlLoopBuilder<C2, R2, M2> {
        ControlLoopBuilder {
            climate: self.climate,
            range: self.range,
            motor: self.motor,
            stats: self.stats,
            filter: self.filter,
            control: self.control,
            timing: self.timing,
            clock: self.clock,
            _c: PhantomData,
            _r: PhantomData,
            _m: PhantomData,
        }
    }

    pub fn with_climate_sensor(
        mut self,
        sensor: impl ClimateSensor + 'static,
    ) -> ControlLoopBuilder<Set, R, M> {
        self.climate = Some(Box::new(sensor));
        self.retag()
    }

    pub fn with_range_sensor(
        mut self,
        sensor: impl RangeSensor + 'static,
    ) -> ControlLoopBuilder<C, Set, M> {
        self.range = Some(Box::new(sensor));
        self.retag()
    }

    pub fn with_motor(mut self, motor: impl Motor + 'static) -> ControlLoopBuilder<C, R, Set> {
        self.motor = Some(Box::new(motor));
        self.retag()
    }

    /// Optional host telemetry collaborator.
    pub fn with_system_stats(mut self, stats: impl SystemStats + 'static) -> Self {
        self.stats = Some(Box::new(stats));
        self
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_control(mut self, control: ControlCfg) -> Self {
        self.control = Some(control);
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = Some(timing);
        self
    }

    /// Inject a clock (tests use a simulated one). Defaults to `MonotonicClock`.
    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Build without compile-time presence guarantees.
    pub fn try_build(self) -> Result<ControlLoop> {
        let climate = self
            .climate
            .ok_or_else(|| eyre::Report::new(BuildError::MissingClimateSensor))?;
        let range = self
            .range
            .ok_or_else(|| eyre::Report::new(BuildError::MissingRangeSensor))?;
        let motor = self
            .motor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotor))?;
        let filter = self.filter.unwrap_or_default();
        let control = self.control.unwrap_or_default();
        let timing = self.timing.unwrap_or_default();
        validate(&filter, &control, &timing)?;

        let clock: Arc<dyn Clock + Send + Sync> = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));
        let epoch = clock.now();

        Ok(ControlLoop {
            sensors: SensorReader::new(climate, range),
            stats: self.stats,
            motor: MotorController::new(motor),
            distance_filter: MovingAverage::new(filter.distance_window),
            temperature_filter: MovingAverage::new(filter.temperature_window),
            filter,
            control,
            timing,
            clock,
            epoch,
            cycle: 0,
        })
    }
}

impl ControlLoopBuilder<Set, Set, Set> {
    pub fn build(self) -> Result<ControlLoop> {
        self.try_build()
    }
}

fn invalid(msg: &'static str) -> eyre::Report {
    eyre::Report::new(BuildError::InvalidConfig(msg))
}

fn validate(filter: &FilterCfg, control: &ControlCfg, timing: &Timing) -> Result<()> {
    if filter.distance_window == 0 || filter.temperature_window == 0 {
        return Err(invalid("filter windows must be >= 1"));
    }
    if control.stop_tolerance == 0 {
        return Err(invalid("stop_tolerance must be >= 1"));
    }
    if !control.distance_threshold_cm.is_finite() || !control.temperature_threshold_c.is_finite()
    {
        return Err(invalid("thresholds must be finite"));
    }
    if !(control.active_duty_pct > 0.0 && control.active_duty_pct <= 100.0) {
        return Err(invalid("active_duty_pct must be in (0, 100]"));
    }
    if timing.period_ms == 0 {
        return Err(invalid("period_ms must be >= 1"));
    }
    if timing.distance_timeout_ms == 0 {
        return Err(invalid("distance_timeout_ms must be >= 1"));
    }
    Ok(())
}
