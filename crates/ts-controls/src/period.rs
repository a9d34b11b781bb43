//! Sampling period of the control loop.
//!
//! The loop evaluates the controller once per period and sleeps in
//! between, which bounds the heater command rate and leaves the
//! instruments time to settle.

use crate::error::{ControlError, ControlResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed control period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlPeriod {
    /// Period in seconds.
    pub dt_s: f64,
}

impl ControlPeriod {
    /// Period used on the rig: two evaluations per second.
    pub const DEFAULT_S: f64 = 0.5;

    /// Create a new control period.
    ///
    /// # Errors
    ///
    /// Returns an error if `dt_s` is not finite and positive.
    pub fn new(dt_s: f64) -> ControlResult<Self> {
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "control period must be finite and positive",
            });
        }
        Ok(Self { dt_s })
    }

    /// Create a control period from an update rate in Hz.
    pub fn from_frequency(freq_hz: f64) -> ControlResult<Self> {
        if !freq_hz.is_finite() || freq_hz <= 0.0 {
            return Err(ControlError::InvalidArg {
                what: "control frequency must be finite and positive",
            });
        }
        Self::new(1.0 / freq_hz)
    }

    /// Update rate in Hz.
    pub fn frequency(&self) -> f64 {
        1.0 / self.dt_s
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs_f64(self.dt_s)
    }
}

impl Default for ControlPeriod {
    fn default() -> Self {
        Self {
            dt_s: Self::DEFAULT_S,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_creation() {
        let period = ControlPeriod::new(0.5).unwrap();
        assert_eq!(period.as_duration(), Duration::from_millis(500));
        assert!((period.frequency() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn period_from_frequency() {
        let period = ControlPeriod::from_frequency(4.0).unwrap();
        assert!((period.dt_s - 0.25).abs() < 1e-12);
    }

    #[test]
    fn invalid_periods() {
        assert!(ControlPeriod::new(0.0).is_err());
        assert!(ControlPeriod::new(-0.5).is_err());
        assert!(ControlPeriod::new(f64::NAN).is_err());
        assert!(ControlPeriod::from_frequency(0.0).is_err());
    }

    #[test]
    fn default_is_half_second() {
        assert_eq!(ControlPeriod::default().dt_s, 0.5);
    }
}
