//! Setpoint generator for temperature sweeps.

use crate::error::{AppError, AppResult};

/// Ascending setpoints `start, start + step, …` up to and including `end`.
///
/// Each value is computed as `start + k * step`, so long sweeps do not
/// accumulate rounding drift. The iterator is single-pass; build a new
/// range to walk the sequence again.
#[derive(Debug, Clone, PartialEq)]
pub struct SetpointRange {
    start: f64,
    end: f64,
    step: f64,
    next_index: u64,
}

impl SetpointRange {
    /// # Errors
    ///
    /// Returns an error if a bound is not finite or `step` is not finite
    /// and positive.
    pub fn new(start: f64, end: f64, step: f64) -> AppResult<Self> {
        if !start.is_finite() || !end.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "setpoint bounds must be finite, got {start}..={end}"
            )));
        }
        if !step.is_finite() || step <= 0.0 {
            return Err(AppError::InvalidInput(format!(
                "setpoint step must be finite and positive, got {step}"
            )));
        }
        Ok(Self {
            start,
            end,
            step,
            next_index: 0,
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    fn value(&self, index: u64) -> f64 {
        self.start + index as f64 * self.step
    }
}

impl Iterator for SetpointRange {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        let value = self.value(self.next_index);
        if value <= self.end {
            self.next_index += 1;
            Some(value)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let next = self.value(self.next_index);
        if next > self.end {
            return (0, Some(0));
        }
        // Whole steps left after `next`; rounding can move the count by one.
        let steps = ((self.end - next) / self.step).floor();
        if steps >= (usize::MAX / 2) as f64 {
            return (0, None);
        }
        let steps = steps as usize;
        (steps, steps.checked_add(2))
    }
}

impl std::iter::FusedIterator for SetpointRange {}
