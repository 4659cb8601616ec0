use proptest::prelude::*;
use proxmotor_core::{ControlCfg, MotorController, MotorState, MovingAverage, Transition};
use proxmotor_hardware::{MotorCommand, SimulatedMotor};

fn reading() -> impl Strategy<Value = Option<f32>> {
    prop_oneof![
        1 => Just(None),
        4 => (0.0f32..400.0).prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn full_window_average_is_mean_of_last_n(
        n in 1usize..8,
        xs in prop::collection::vec(reading(), 1..60),
    ) {
        let mut f = MovingAverage::new(n);
        let mut kept: Vec<f32> = Vec::new();
        for x in &xs {
            f.add(*x);
            if let Some(v) = x {
                kept.push(*v);
            }
        }
        let got = f.average();
        if kept.is_empty() {
            prop_assert_eq!(got, None);
        } else if kept.len() < n {
            prop_assert_eq!(got, kept.last().copied());
        } else {
            let tail = &kept[kept.len() - n..];
            let mean = tail.iter().map(|v| f64::from(*v)).sum::<f64>() / n as f64;
            let got = got.expect("full window");
            prop_assert!((f64::from(got) - mean).abs() < 1e-3, "got {got}, mean {mean}");
        }
        prop_assert!(f.len() <= n);
    }

    #[test]
    fn absent_samples_leave_average_unchanged(
        n in 1usize..6,
        xs in prop::collection::vec(0.0f32..100.0, 0..12),
        gaps in 1usize..10,
    ) {
        let mut f = MovingAverage::new(n);
        for x in xs {
            f.add(Some(x));
        }
        let before = f.average();
        for _ in 0..gaps {
            f.add(None);
        }
        prop_assert_eq!(f.average(), before);
    }

    #[test]
    fn counter_stays_below_tolerance_and_commands_alternate(
        tolerance in 1u32..6,
        cycles in prop::collection::vec((reading(), reading()), 1..80),
    ) {
        let motor = SimulatedMotor::new();
        let log = motor.log();
        let mut mc = MotorController::new(motor);
        let c = ControlCfg {
            distance_threshold_cm: 30.0,
            temperature_threshold_c: 23.0,
            stop_tolerance: tolerance,
            active_duty_pct: 80.0,
        };

        let mut starts = 0usize;
        let mut stops = 0usize;
        for (d, t) in cycles {
            match mc.evaluate(d, t, &c).expect("evaluate") {
                Transition::Started => starts += 1,
                Transition::Stopped => stops += 1,
                _ => {}
            }
            prop_assert!(mc.stop_counter() < tolerance);
            if mc.state() == MotorState::Stopped {
                prop_assert_eq!(mc.stop_counter(), 0);
            }
        }

        // Starts and stops alternate, beginning with a start.
        prop_assert!(starts == stops || starts == stops + 1);
        let forwards = log.borrow().iter().filter(|c| **c == MotorCommand::Forward).count();
        prop_assert_eq!(forwards, starts);
    }
}
