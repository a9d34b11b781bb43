//! Property checks for the PID controller and the output clamp.

use proptest::prelude::*;
use std::rc::Rc;
use ts_controls::{PidController, PidGains, clamp_power};
use ts_core::ManualClock;

fn gains() -> impl Strategy<Value = PidGains> {
    (-10.0_f64..10.0, -10.0_f64..10.0, -10.0_f64..10.0).prop_map(|(kp, ki, kd)| PidGains {
        kp,
        ki,
        kd,
    })
}

proptest! {
    #[test]
    fn update_after_soft_reset_is_zero(
        gains in gains(),
        history in prop::collection::vec(250.0_f64..350.0, 0..20),
        measured in 0.0_f64..500.0,
        setpoint in 0.0_f64..500.0,
        dt in 0.01_f64..5.0,
    ) {
        let clock = Rc::new(ManualClock::new(0.0));
        let mut pid = PidController::new(gains, clock.clone());
        for m in history {
            clock.advance(dt);
            pid.update(m, 300.0);
        }
        pid.soft_reset();
        clock.advance(dt);
        prop_assert_eq!(pid.update(measured, setpoint), 0.0);
    }

    #[test]
    fn larger_error_gives_larger_output(
        kp in 0.001_f64..1.0,
        ki in 0.0_f64..1.0,
        kd in 0.0_f64..1.0,
        history in prop::collection::vec(250.0_f64..350.0, 1..10),
        error in -50.0_f64..50.0,
        bump in 0.01_f64..10.0,
    ) {
        let dt = 0.5;
        let clock = Rc::new(ManualClock::new(0.0));
        let mut pid = PidController::new(PidGains { kp, ki, kd }, clock.clone());
        for m in history {
            clock.advance(dt);
            pid.update(m, 300.0);
        }
        let mut bumped = pid.clone();
        clock.advance(dt);
        let low = pid.update(300.0 - error, 300.0);
        let high = bumped.update(300.0 - (error + bump), 300.0);
        prop_assert!(high > low);
    }

    #[test]
    fn clamp_stays_in_range(value in prop::num::f64::ANY, max in 0.0_f64..10.0) {
        let clamped = clamp_power(value, max);
        prop_assert!((0.0..=max).contains(&clamped));
    }

    #[test]
    fn clamp_is_identity_inside_range(max in 0.0_f64..10.0, frac in 0.0_f64..=1.0) {
        let value = max * frac;
        prop_assert_eq!(clamp_power(value, max), value);
    }
}

#[test]
fn clamp_reference_points() {
    let max = 0.4;
    assert_eq!(clamp_power(max + 1.0, max), max);
    assert_eq!(clamp_power(-1.0, max), 0.0);
}
