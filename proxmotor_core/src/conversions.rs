//! `From` implementations bridging `proxmotor_config` types to `proxmotor_core` types.

use crate::config::{ControlCfg, FilterCfg, Timing};

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&proxmotor_config::FilterCfg> for FilterCfg {
    fn from(c: &proxmotor_config::FilterCfg) -> Self {
        Self {
            distance_window: c.distance_window,
            temperature_window: c.temperature_window,
        }
    }
}

// ── ControlCfg ───────────────────────────────────────────────────────────────

impl From<&proxmotor_config::ControlCfg> for ControlCfg {
    fn from(c: &proxmotor_config::ControlCfg) -> Self {
        Self {
            distance_threshold_cm: c.distance_threshold_cm,
            temperature_threshold_c: c.temperature_threshold_c,
            stop_tolerance: c.stop_tolerance,
            active_duty_pct: c.active_duty_pct,
        }
    }
}

// ── Timing ───────────────────────────────────────────────────────────────────

impl From<&proxmotor_config::Timing> for Timing {
    fn from(c: &proxmotor_config::Timing) -> Self {
        Self {
            period_ms: c.period_ms,
            distance_timeout_ms: c.distance_timeout_ms,
        }
    }
}
