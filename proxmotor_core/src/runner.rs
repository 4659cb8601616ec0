use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use proxmotor_traits::clock::Clock;

use crate::control::{ControlLoop, CycleReport};
use crate::error::Result;
use crate::status::Transition;

/// Longest single sleep between shutdown-flag checks.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Options for `run`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Stop after this many cycles. `None` runs until interrupted.
    pub max_cycles: Option<u64>,
}

/// Why the loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    CycleLimit,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Interrupted => "interrupted",
            StopReason::CycleLimit => "cycle_limit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub reason: StopReason,
    pub starts: u32,
    pub stops: u32,
}

/// Split `total` into sleep slices of at most `MAX_SLEEP_SLICE`.
fn sleep_slices(total: Duration) -> impl Iterator<Item = Duration> {
    let mut left = total;
    std::iter::from_fn(move || {
        if left.is_zero() {
            return None;
        }
        let s = left.min(MAX_SLEEP_SLICE);
        left -= s;
        Some(s)
    })
}

/// Sleep for `total`, checking `shutdown` before every slice.
///
/// Returns `true` if the full duration elapsed, `false` if interrupted.
pub fn sleep_interruptible(clock: &dyn Clock, total: Duration, shutdown: &AtomicBool) -> bool {
    for slice in sleep_slices(total) {
        if shutdown.load(Ordering::Relaxed) {
            return false;
        }
        clock.sleep(slice);
    }
    !shutdown.load(Ordering::Relaxed)
}

/// Drive `ctl` until interrupted, the cycle limit is hit, or an actuator fault.
///
/// Every report is handed to `on_cycle`. The motor is released on every exit
/// path; a release failure is only returned when the loop itself succeeded.
pub fn run(
    mut ctl: ControlLoop,
    shutdown: &AtomicBool,
    opts: RunOptions,
    mut on_cycle: impl FnMut(&CycleReport),
) -> Result<RunSummary> {
    tracing::info!(
        period_ms = ctl.timing().period_ms,
        max_cycles = opts.max_cycles,
        "control loop start"
    );

    let outcome = drive(&mut ctl, shutdown, opts, &mut on_cycle);
    let released = ctl.release();

    match (&outcome, released) {
        (Ok(summary), Ok(())) => {
            tracing::info!(
                cycles = summary.cycles,
                reason = summary.reason.as_str(),
                starts = summary.starts,
                stops = summary.stops,
                "control loop stop"
            );
        }
        (Ok(_), Err(e)) => {
            tracing::error!(error = %e, "motor release failed");
            return Err(e);
        }
        (Err(e), rel) => {
            tracing::error!(error = %e, cycles = ctl.cycles(), "control loop aborted");
            if let Err(re) = rel {
                tracing::error!(error = %re, "motor release failed");
            }
        }
    }
    outcome
}

fn drive(
    ctl: &mut ControlLoop,
    shutdown: &AtomicBool,
    opts: RunOptions,
    on_cycle: &mut impl FnMut(&CycleReport),
) -> Result<RunSummary> {
    let mut starts = 0u32;
    let mut stops = 0u32;
    let summary = |cycles, reason, starts, stops| RunSummary {
        cycles,
        reason,
        starts,
        stops,
    };

    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(summary(ctl.cycles(), StopReason::Interrupted, starts, stops));
        }
        if opts.max_cycles == Some(0) {
            return Ok(summary(0, StopReason::CycleLimit, starts, stops));
        }

        let report = ctl.step()?;
        match report.transition {
            Transition::Started => starts += 1,
            Transition::Stopped => stops += 1,
            _ => {}
        }
        on_cycle(&report);

        if opts.max_cycles.is_some_and(|max| ctl.cycles() >= max) {
            return Ok(summary(ctl.cycles(), StopReason::CycleLimit, starts, stops));
        }

        let clock = ctl.clock().clone();
        if !sleep_interruptible(clock.as_ref(), ctl.period(), shutdown) {
            return Ok(summary(ctl.cycles(), StopReason::Interrupted, starts, stops));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmotor_traits::clock::test_clock::TestClock;

    #[test]
    fn slices_never_exceed_the_cap() {
        let v: Vec<_> = sleep_slices(Duration::from_millis(3000)).collect();
        assert_eq!(v.len(), 30);
        assert!(v.iter().all(|d| *d == MAX_SLEEP_SLICE));

        let v: Vec<_> = sleep_slices(Duration::from_millis(250)).collect();
        assert_eq!(
            v,
            vec![
                Duration::from_millis(100),
                Duration::from_millis(100),
                Duration::from_millis(50)
            ]
        );
        assert_eq!(sleep_slices(Duration::ZERO).count(), 0);
    }

    #[test]
    fn full_sleep_when_not_interrupted() {
        let clock = TestClock::new();
        let flag = AtomicBool::new(false);
        assert!(sleep_interruptible(&clock, Duration::from_millis(450), &flag));
        assert_eq!(clock.total_slept(), Duration::from_millis(450));
    }

    #[test]
    fn preset_flag_skips_sleep() {
        let clock = TestClock::new();
        let flag = AtomicBool::new(true);
        assert!(!sleep_interruptible(&clock, Duration::from_secs(3), &flag));
        assert!(clock.sleeps().is_empty());
    }

    /// Clock that raises the shutdown flag after a number of sleeps.
    struct TrippingClock<'a> {
        inner: TestClock,
        flag: &'a AtomicBool,
        trip_after: usize,
    }

    impl Clock for TrippingClock<'_> {
        fn now(&self) -> std::time::Instant {
            self.inner.now()
        }
        fn sleep(&self, d: Duration) {
            self.inner.sleep(d);
            if self.inner.sleeps().len() >= self.trip_after {
                self.flag.store(true, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn flag_raised_mid_sleep_stops_within_one_slice() {
        let flag = AtomicBool::new(false);
        let clock = TrippingClock {
            inner: TestClock::new(),
            flag: &flag,
            trip_after: 2,
        };
        assert!(!sleep_interruptible(&clock, Duration::from_secs(3), &flag));
        assert_eq!(clock.inner.sleeps().len(), 2);
        assert!(clock.inner.total_slept() <= 2 * MAX_SLEEP_SLICE);
    }
}
