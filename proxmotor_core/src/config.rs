//! Configuration types for the control loop.
//!
//! These are the runtime configuration structs used by `ControlLoop`.
//! They are separate from the TOML-deserialized config in `proxmotor_config`.

use std::time::Duration;

/// Smoothing window sizes, in samples.
#[derive(Debug, Clone)]
pub struct FilterCfg {
    /// Distance moving average window (1 = pass-through).
    pub distance_window: usize,
    /// Temperature moving average window (1 = pass-through).
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

/// Run condition thresholds and stop debounce.
#[derive(Debug, Clone)]
pub struct ControlCfg {
    /// Run only while smoothed distance is strictly below this (cm).
    pub distance_threshold_cm: f32,
    /// Run only while smoothed temperature is strictly above this (°C).
    pub temperature_threshold_c: f32,
    /// Consecutive condition-false cycles tolerated while running. Must be >= 1.
    pub stop_tolerance: u32,
    /// Duty cycle applied on start, in percent.
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

/// Loop pacing and sensor timeouts.
#[derive(Debug, Clone)]
pub struct Timing {
    /// Delay between cycles (ms).
    pub period_ms: u64,
    /// Max wait for an ultrasonic echo edge (ms).
    pub distance_timeout_ms: u64,
}

impl Timing {
    #[inline]
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    #[inline]
    pub fn distance_timeout(&self) -> Duration {
        Duration::from_millis(self.distance_timeout_ms)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            period_ms: 3000,
            distance_timeout_ms: 50,
        }
    }
}
