//! Motor state and the per-cycle transition reported to observers.

/// Actuator state held by `MotorController`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorState {
    #[default]
    Stopped,
    Running,
}

impl MotorState {
    pub fn as_str(self) -> &'static str {
        match self {
            MotorState::Stopped => "stopped",
            MotorState::Running => "running",
        }
    }
}

/// What a single evaluation did to the motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Unchanged,
    /// Stopped -> Running; forward output and active duty applied.
    Started,
    /// Running with the condition false; stop counter advanced but below tolerance.
    StopPending { count: u32, tolerance: u32 },
    /// Running and the condition held again after `after` failing cycles.
    Recovered { after: u32 },
    /// Running -> Stopped; duty set to 0.
    Stopped,
}

impl Transition {
    /// Whether the physical motor output changed this cycle.
    pub fn is_state_change(self) -> bool {
        matches!(self, Transition::Started | Transition::Stopped)
    }
}
