#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core control logic (hardware-agnostic).
//!
//! This crate runs the proximity/temperature motor loop. All hardware
//! interactions go through the `proxmotor_traits` sensor and motor traits.
//!
//! ## Architecture
//!
//! - **Filtering**: per-stream moving average over optional samples (`filter`)
//! - **Control**: debounced Stopped/Running state machine (`motor`)
//! - **Sensors**: collaborator failures become absent values (`sensors`)
//! - **Orchestration**: one cycle per `ControlLoop::step`, paced by `runner::run`
//! - **Configuration**: runtime config structs (`config`) built from TOML via `conversions`

pub mod builder;
pub mod config;
pub mod control;
pub mod conversions;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod motor;
pub mod runner;
pub mod sensors;
pub mod status;

pub use builder::{ControlLoopBuilder, Missing, Set};
pub use config::{ControlCfg, FilterCfg, Timing};
pub use control::{ControlLoop, CycleReport};
pub use error::{BuildError, ControlError, Report, Result};
pub use filter::MovingAverage;
pub use motor::{MotorController, run_condition};
pub use runner::{RunOptions, RunSummary, StopReason};
pub use status::{MotorState, Transition};

/// Walk an eyre report's chain looking for a `ControlError`.
pub fn find_control_error(e: &Report) -> Option<&ControlError> {
    e.chain().find_map(|c| c.downcast_ref::<ControlError>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_error_is_found_through_context() {
        use eyre::WrapErr;
        let r: Result<()> = Err(Report::new(ControlError::Actuator("pwm".into())));
        let r = r.wrap_err("cycle 4");
        let e = r.expect_err("err");
        assert!(matches!(
            find_control_error(&e),
            Some(ControlError::Actuator(_))
        ));
    }
}
