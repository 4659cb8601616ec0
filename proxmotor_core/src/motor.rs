//! Debounced on/off motor control.
//!
//! The motor starts as soon as the run condition holds and stops only after
//! the condition has failed for `stop_tolerance` consecutive cycles while
//! running. Outputs are written on transitions only; a running motor is not
//! re-commanded every cycle.

use proxmotor_traits::Motor;
use tracing::{debug, info, warn};

use crate::config::ControlCfg;
use crate::error::{ControlError, Report, Result};
use crate::hw_error::map_actuator_error;
use crate::status::{MotorState, Transition};

/// True iff both readings are present, distance is below its threshold and
/// temperature is above its threshold.
#[inline]
pub fn run_condition(distance_cm: Option<f32>, temperature_c: Option<f32>, cfg: &ControlCfg) -> bool {
    distance_cm.is_some_and(|d| d < cfg.distance_threshold_cm)
        && temperature_c.is_some_and(|t| t > cfg.temperature_threshold_c)
}

fn actuator(e: Box<dyn std::error::Error + Send + Sync>) -> Report {
    Report::new(map_actuator_error(&*e))
}

/// Owns the actuator and the Stopped/Running debounce state.
pub struct MotorController<M: Motor> {
    motor: M,
    state: MotorState,
    stop_counter: u32,
    released: bool,
}

impl<M: Motor> core::fmt::Debug for MotorController<M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MotorController")
            .field("state", &self.state)
            .field("stop_counter", &self.stop_counter)
            .field("released", &self.released)
            .finish()
    }
}

impl<M: Motor> MotorController<M> {
    pub fn new(motor: M) -> Self {
        Self {
            motor,
            state: MotorState::Stopped,
            stop_counter: 0,
            released: false,
        }
    }

    #[inline]
    pub fn state(&self) -> MotorState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == MotorState::Running
    }

    #[inline]
    pub fn stop_counter(&self) -> u32 {
        self.stop_counter
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Evaluate one cycle with smoothed readings.
    ///
    /// State is only updated after the actuator accepted the command, so a
    /// failed start leaves the controller `Stopped`.
    pub fn evaluate(
        &mut self,
        distance_cm: Option<f32>,
        temperature_c: Option<f32>,
        cfg: &ControlCfg,
    ) -> Result<Transition> {
        if self.released {
            return Err(Report::new(ControlError::Released));
        }
        let tolerance = cfg.stop_tolerance.max(1);

        if run_condition(distance_cm, temperature_c, cfg) {
            let t = match self.state {
                MotorState::Stopped => {
                    self.motor.forward().map_err(actuator)?;
                    self.motor
                        .set_duty_cycle(cfg.active_duty_pct)
                        .map_err(actuator)?;
                    self.state = MotorState::Running;
                    info!(
                        distance_cm,
                        temperature_c,
                        duty_pct = cfg.active_duty_pct,
                        "motor started"
                    );
                    Transition::Started
                }
                MotorState::Running if self.stop_counter > 0 => {
                    debug!(after = self.stop_counter, "stop counter reset");
                    Transition::Recovered {
                        after: self.stop_counter,
                    }
                }
                MotorState::Running => Transition::Unchanged,
            };
            self.stop_counter = 0;
            return Ok(t);
        }

        match self.state {
            MotorState::Running => {
                self.stop_counter += 1;
                if self.stop_counter >= tolerance {
                    self.motor.set_duty_cycle(0.0).map_err(actuator)?;
                    self.state = MotorState::Stopped;
                    self.stop_counter = 0;
                    info!(distance_cm, temperature_c, "motor stopped");
                    Ok(Transition::Stopped)
                } else {
                    debug!(count = self.stop_counter, tolerance, "stop pending");
                    Ok(Transition::StopPending {
                        count: self.stop_counter,
                        tolerance,
                    })
                }
            }
            MotorState::Stopped => {
                self.stop_counter = 0;
                Ok(Transition::Unchanged)
            }
        }
    }

    /// Drive outputs to 0 % duty and release the pins. Runs at most once.
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let was = self.state;
        self.state = MotorState::Stopped;
        self.stop_counter = 0;

        let duty = self.motor.set_duty_cycle(0.0);
        let rel = self.motor.release();
        info!(was = was.as_str(), "motor released");
        duty.and(rel).map_err(actuator)
    }
}

impl<M: Motor> Drop for MotorController<M> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.release()
        {
            warn!(error = %e, "motor release on drop failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingMotor {
        forwards: u32,
        duties: Vec<f32>,
        releases: u32,
    }

    impl Motor for CountingMotor {
        fn forward(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.forwards += 1;
            Ok(())
        }
        fn set_duty_cycle(
            &mut self,
            percent: f32,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.duties.push(percent);
            Ok(())
        }
        fn release(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.releases += 1;
            Ok(())
        }
    }

    fn cfg() -> ControlCfg {
        ControlCfg {
            distance_threshold_cm: 30.0,
            temperature_threshold_c: 23.0,
            stop_tolerance: 3,
            active_duty_pct: 80.0,
        }
    }

    #[test]
    fn condition_requires_both_present_and_strict() {
        let c = cfg();
        assert!(run_condition(Some(20.0), Some(25.0), &c));
        assert!(!run_condition(Some(30.0), Some(25.0), &c));
        assert!(!run_condition(Some(20.0), Some(23.0), &c));
        assert!(!run_condition(None, Some(25.0), &c));
        assert!(!run_condition(Some(20.0), None, &c));
        assert!(!run_condition(None, None, &c));
    }

    #[test]
    fn running_cycles_do_not_reassert_outputs() {
        let mut mc = MotorController::new(CountingMotor::default());
        for _ in 0..5 {
            mc.evaluate(Some(10.0), Some(30.0), &cfg()).expect("eval");
        }
        assert_eq!(mc.motor.forwards, 1);
        assert_eq!(mc.motor.duties, vec![80.0]);
    }

    #[test]
    fn release_is_idempotent_and_zeroes_duty() {
        let mut mc = MotorController::new(CountingMotor::default());
        mc.evaluate(Some(10.0), Some(30.0), &cfg()).expect("start");
        mc.release().expect("release");
        mc.release().expect("second release is a no-op");
        assert_eq!(mc.motor.releases, 1);
        assert_eq!(mc.motor.duties.last().copied(), Some(0.0));
        assert_eq!(mc.state(), MotorState::Stopped);
        let err = mc
            .evaluate(Some(10.0), Some(30.0), &cfg())
            .expect_err("evaluate after release");
        assert!(err.to_string().contains("released"));
    }

    #[test]
    fn zero_tolerance_behaves_like_one() {
        let mut c = cfg();
        c.stop_tolerance = 0;
        let mut mc = MotorController::new(CountingMotor::default());
        mc.evaluate(Some(10.0), Some(30.0), &c).expect("start");
        let t = mc.evaluate(None, None, &c).expect("stop");
        assert_eq!(t, Transition::Stopped);
    }
}
