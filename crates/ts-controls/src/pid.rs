//! PID controller for the heater loop.
//!
//! The controller keeps its own integral and derivative history between
//! calls and reads `dt` from an injected [`Clock`]. Its output is a power
//! command in watts and is deliberately unbounded.
//!
//! Two resets exist:
//! - [`PidController::soft_reset`] is a cold start: integral, error and
//!   output are zeroed and the next update is suppressed to `0`.
//! - [`PidController::time_reset`] only rebases the clock, so the integral
//!   built up at the previous setpoint carries into the next one without a
//!   huge `dt` from the time spent elsewhere.
//!
//! An update that sees no elapsed time (a reset immediately followed by an
//! update, or a coarse clock) integrates over the nominal control period
//! instead.

use crate::error::{ControlError, ControlResult};
use crate::period::ControlPeriod;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_core::Clock;

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl PidGains {
    /// # Errors
    ///
    /// Returns an error if any gain is not finite.
    pub fn new(kp: f64, ki: f64, kd: f64) -> ControlResult<Self> {
        let gains = Self { kp, ki, kd };
        gains.validate()?;
        Ok(gains)
    }

    pub fn validate(&self) -> ControlResult<()> {
        if !(self.kp.is_finite() && self.ki.is_finite() && self.kd.is_finite()) {
            return Err(ControlError::InvalidArg {
                what: "PID gains must be finite",
            });
        }
        Ok(())
    }

    /// All three gains multiplied by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            kp: self.kp * factor,
            ki: self.ki * factor,
            kd: self.kd * factor,
        }
    }
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 0.09,
            ki: 0.002,
            kd: 0.2,
        }
    }
}

/// Mutable controller history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Accumulated `error * dt`, kelvin-seconds.
    pub integral: f64,
    /// Error seen by the previous update.
    pub previous_error: f64,
    /// Output returned by the previous update.
    pub output: f64,
    /// Clock reading at the previous update or reset, seconds.
    pub last_update_s: f64,
    /// The next update returns `0` regardless of the computed output.
    pub first_update: bool,
}

impl ControllerState {
    fn cold(now_s: f64) -> Self {
        Self {
            integral: 0.0,
            previous_error: 0.0,
            output: 0.0,
            last_update_s: now_s,
            first_update: true,
        }
    }
}

/// PID controller driving heater power from a temperature error.
#[derive(Debug, Clone)]
pub struct PidController<C> {
    gains: PidGains,
    state: ControllerState,
    /// `dt` used when the clock reports no elapsed time.
    nominal_dt_s: f64,
    clock: C,
}

impl<C: Clock> PidController<C> {
    /// Create a controller in the cold-start state, nominally updated once
    /// per [`ControlPeriod::DEFAULT_S`].
    pub fn new(gains: PidGains, clock: C) -> Self {
        let state = ControllerState::cold(clock.now_s());
        Self {
            gains,
            state,
            nominal_dt_s: ControlPeriod::DEFAULT_S,
            clock,
        }
    }

    /// Use `period` as the nominal update interval.
    pub fn with_period(mut self, period: ControlPeriod) -> Self {
        self.nominal_dt_s = period.dt_s;
        self
    }

    /// Compute a power command for the current measurement.
    ///
    /// # Arguments
    ///
    /// * `measured` - Process variable (sample temperature, K)
    /// * `setpoint` - Target temperature (K)
    ///
    /// # Returns
    ///
    /// `kp*e + ki*∫e dt + kd*de/dt`, or `0` on the first update after a
    /// cold start. When the clock has not advanced since the last update or
    /// reset, `dt` is the nominal control period.
    pub fn update(&mut self, measured: f64, setpoint: f64) -> f64 {
        let now = self.clock.now_s();
        let mut dt = now - self.state.last_update_s;
        if !dt.is_finite() || dt <= 0.0 {
            debug!(dt, nominal_dt_s = self.nominal_dt_s, "no elapsed time, using nominal dt");
            dt = self.nominal_dt_s;
        }

        let error = setpoint - measured;
        self.state.integral += error * dt;
        let derivative = (error - self.state.previous_error) / dt;
        let raw = self.gains.kp * error
            + self.gains.ki * self.state.integral
            + self.gains.kd * derivative;

        self.state.previous_error = error;
        self.state.last_update_s = now;

        let output = if self.state.first_update {
            self.state.first_update = false;
            0.0
        } else {
            raw
        };
        self.state.output = output;
        debug!(measured, setpoint, error, dt, raw, output, "PID update");
        output
    }

    /// Cold start: zero the history, rebase the clock and suppress the
    /// next output.
    pub fn soft_reset(&mut self) {
        self.state = ControllerState::cold(self.clock.now_s());
    }

    /// Rebase the clock only. Integral and previous error are kept and the
    /// next update is not suppressed.
    pub fn time_reset(&mut self) {
        self.state.last_update_s = self.clock.now_s();
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn nominal_dt_s(&self) -> f64 {
        self.nominal_dt_s
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;
    use ts_core::ManualClock;

    fn controller(gains: PidGains) -> (PidController<Rc<ManualClock>>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(0.0));
        (PidController::new(gains, clock.clone()), clock)
    }

    #[test]
    fn first_update_after_construction_is_zero() {
        let (mut pid, clock) = controller(PidGains::new(1.0, 1.0, 1.0).unwrap());
        clock.advance(0.5);
        assert_eq!(pid.update(290.0, 300.0), 0.0);
        // State still advanced.
        assert_eq!(pid.state().previous_error, 10.0);
        assert_eq!(pid.state().integral, 5.0);
        assert!(!pid.state().first_update);
    }

    #[test]
    fn second_update_uses_full_law() {
        let (mut pid, clock) = controller(PidGains::new(2.0, 0.5, 0.25).unwrap());
        clock.advance(1.0);
        pid.update(296.0, 300.0); // e=4, I=4
        clock.advance(0.5);
        let out = pid.update(298.0, 300.0); // e=2, I=5, D=(2-4)/0.5=-4
        assert!((out - (2.0 * 2.0 + 0.5 * 5.0 + 0.25 * -4.0)).abs() < 1e-12);
        assert_eq!(pid.state().output, out);
    }

    #[test]
    fn soft_reset_clears_history() {
        let (mut pid, clock) = controller(PidGains::default());
        clock.advance(0.5);
        pid.update(290.0, 300.0);
        clock.advance(0.5);
        pid.update(291.0, 300.0);
        clock.advance(3.0);
        pid.soft_reset();

        let state = pid.state();
        assert_eq!(state.integral, 0.0);
        assert_eq!(state.previous_error, 0.0);
        assert_eq!(state.output, 0.0);
        assert_eq!(state.last_update_s, 4.0);
        assert!(state.first_update);

        clock.advance(0.5);
        assert_eq!(pid.update(250.0, 300.0), 0.0);
    }

    #[test]
    fn soft_reset_is_idempotent() {
        let (mut pid, clock) = controller(PidGains::default());
        clock.advance(0.5);
        pid.update(290.0, 300.0);
        pid.soft_reset();
        let once = pid.state().clone();
        pid.soft_reset();
        assert_eq!(pid.state(), &once);
    }

    #[test]
    fn time_reset_keeps_integral_and_is_not_suppressed() {
        let (mut pid, clock) = controller(PidGains::new(0.0, 1.0, 0.0).unwrap());
        clock.advance(0.5);
        pid.update(299.0, 300.0); // suppressed, I=0.5
        clock.advance(0.5);
        pid.update(299.0, 300.0); // I=1.0

        clock.advance(600.0);
        pid.time_reset();
        let state = pid.state().clone();
        assert_eq!(state.integral, 1.0);
        assert_eq!(state.previous_error, 1.0);
        assert_eq!(state.last_update_s, 601.0);
        assert!(!state.first_update);

        clock.advance(0.5);
        let out = pid.update(299.0, 300.0);
        // Fresh dt of 0.5 s, not 600.5 s.
        assert!((out - 1.5).abs() < 1e-12);
    }

    #[test]
    fn zero_dt_integrates_over_nominal_period() {
        let (pid, clock) = controller(PidGains::new(1.0, 2.0, 4.0).unwrap());
        let mut pid = pid.with_period(ControlPeriod::new(0.25).unwrap());
        clock.advance(0.25);
        pid.update(295.0, 300.0); // suppressed, e=5, I=1.25
        // Same instant: dt falls back to 0.25 s.
        let out = pid.update(296.0, 300.0); // e=4, I=2.25, D=(4-5)/0.25=-4
        assert!((out - (4.0 + 2.0 * 2.25 + 4.0 * -4.0)).abs() < 1e-12);
        assert_eq!(pid.state().integral, 2.25);
        assert_eq!(pid.state().last_update_s, 0.25);
    }

    #[test]
    fn update_right_after_soft_reset_is_the_suppressed_one() {
        let (mut pid, clock) = controller(PidGains::new(1.0, 1.0, 0.0).unwrap());
        clock.advance(3.0);
        pid.update(280.0, 300.0);
        pid.soft_reset();
        // No clock advance between reset and update.
        assert_eq!(pid.update(290.0, 300.0), 0.0);
        assert!(!pid.state().first_update);
        assert_eq!(pid.state().previous_error, 10.0);
        assert_eq!(pid.state().integral, 10.0 * ControlPeriod::DEFAULT_S);

        clock.advance(0.5);
        assert_eq!(pid.update(290.0, 300.0), 10.0 + 10.0);
    }

    #[test]
    fn update_right_after_time_reset_uses_live_error() {
        let (mut pid, clock) = controller(PidGains::new(2.0, 0.5, 0.25).unwrap());
        clock.advance(0.5);
        pid.update(299.0, 300.0); // suppressed, e=1, I=0.5
        clock.advance(0.5);
        let held = pid.update(299.5, 300.0); // e=0.5, I=0.75
        clock.advance(120.0);
        pid.time_reset();

        let out = pid.update(300.0, 320.0); // e=20, I=0.75+10, D=(20-0.5)/0.5
        let expected = 2.0 * 20.0 + 0.5 * 10.75 + 0.25 * 39.0;
        assert!((out - expected).abs() < 1e-12);
        assert_ne!(out, held);
    }

    #[test]
    fn gains_validation_and_scaling() {
        assert!(PidGains::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(PidGains::new(0.0, f64::INFINITY, 0.0).is_err());
        let scaled = PidGains::new(0.09, 0.002, 0.2).unwrap().scaled(0.1);
        assert!((scaled.kp - 0.009).abs() < 1e-15);
        assert!((scaled.ki - 0.0002).abs() < 1e-15);
        assert!((scaled.kd - 0.02).abs() < 1e-15);
    }
}
