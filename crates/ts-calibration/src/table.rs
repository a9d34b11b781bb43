//! Monotonic lookup-table interpolation.

use crate::{CalibrationError, CalibrationResult};
use serde::{Deserialize, Serialize};
use ts_core::ensure_finite;

/// Piecewise-linear map from a raw reading to a physical value.
///
/// Inputs are stored in ascending order; a table supplied in descending
/// order (diode voltage falls as temperature rises) is reversed on
/// construction. Lookups outside the table clamp to the end values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl CalibrationTable {
    /// Build a table from paired inputs and outputs.
    ///
    /// # Errors
    ///
    /// Fails if fewer than two points are given, the axes differ in length,
    /// a value is not finite, or `xs` is not strictly monotonic.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> CalibrationResult<Self> {
        if xs.len() != ys.len() {
            return Err(CalibrationError::LengthMismatch {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        if xs.len() < 2 {
            return Err(CalibrationError::TooShort { len: xs.len() });
        }
        for (&x, &y) in xs.iter().zip(&ys) {
            ensure_finite(x, "calibration input")?;
            ensure_finite(y, "calibration output")?;
        }

        let (mut xs, mut ys) = (xs, ys);
        if xs[1] < xs[0] {
            xs.reverse();
            ys.reverse();
        }
        if let Some(index) = first_non_increasing(&xs) {
            return Err(CalibrationError::NotMonotonic {
                axis: "input",
                index,
            });
        }

        Ok(Self { xs, ys })
    }

    /// Interpolate the output for raw reading `x`.
    pub fn interpolate(&self, x: f64) -> CalibrationResult<f64> {
        ensure_finite(x, "calibration lookup")?;

        let last = self.xs.len() - 1;
        if x <= self.xs[0] {
            return Ok(self.ys[0]);
        }
        if x >= self.xs[last] {
            return Ok(self.ys[last]);
        }

        // First index with xs[hi] > x; 1..=last because of the guards above.
        let hi = self.xs.partition_point(|&xi| xi <= x);
        let lo = hi - 1;
        let frac = (x - self.xs[lo]) / (self.xs[hi] - self.xs[lo]);
        Ok(self.ys[lo] + frac * (self.ys[hi] - self.ys[lo]))
    }

    /// The same table with input and output swapped.
    ///
    /// Requires the outputs to be strictly monotonic as well.
    pub fn inverse(&self) -> CalibrationResult<Self> {
        Self::new(self.ys.clone(), self.xs.clone()).map_err(|err| match err {
            CalibrationError::NotMonotonic { index, .. } => CalibrationError::NotMonotonic {
                axis: "output",
                index,
            },
            other => other,
        })
    }

    /// Input range covered by the table, ascending.
    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }
}

fn first_non_increasing(values: &[f64]) -> Option<usize> {
    values
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> CalibrationTable {
        CalibrationTable::new(vec![0.0, 1.0, 3.0], vec![10.0, 20.0, 40.0]).unwrap()
    }

    #[test]
    fn interpolates_between_points() {
        let table = ramp();
        assert_eq!(table.interpolate(0.5).unwrap(), 15.0);
        assert_eq!(table.interpolate(2.0).unwrap(), 30.0);
    }

    #[test]
    fn exact_points_are_returned() {
        let table = ramp();
        for (x, y) in table.points().collect::<Vec<_>>() {
            assert_eq!(table.interpolate(x).unwrap(), y);
        }
    }

    #[test]
    fn clamps_outside_domain() {
        let table = ramp();
        assert_eq!(table.interpolate(-5.0).unwrap(), 10.0);
        assert_eq!(table.interpolate(99.0).unwrap(), 40.0);
    }

    #[test]
    fn descending_inputs_are_accepted() {
        let table = CalibrationTable::new(vec![3.0, 1.0, 0.0], vec![40.0, 20.0, 10.0]).unwrap();
        assert_eq!(table.domain(), (0.0, 3.0));
        assert_eq!(table.interpolate(2.0).unwrap(), 30.0);
    }

    #[test]
    fn inverse_swaps_axes() {
        let inv = ramp().inverse().unwrap();
        assert_eq!(inv.interpolate(30.0).unwrap(), 2.0);
    }

    #[test]
    fn rejects_bad_tables() {
        assert_eq!(
            CalibrationTable::new(vec![1.0], vec![1.0]),
            Err(CalibrationError::TooShort { len: 1 })
        );
        assert_eq!(
            CalibrationTable::new(vec![1.0, 2.0], vec![1.0]),
            Err(CalibrationError::LengthMismatch { xs: 2, ys: 1 })
        );
        assert_eq!(
            CalibrationTable::new(vec![0.0, 1.0, 1.0], vec![1.0, 2.0, 3.0]),
            Err(CalibrationError::NotMonotonic {
                axis: "input",
                index: 2
            })
        );
        assert!(CalibrationTable::new(vec![0.0, f64::NAN], vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn inverse_requires_monotonic_outputs() {
        let table = CalibrationTable::new(vec![0.0, 1.0, 2.0], vec![5.0, 6.0, 5.5]).unwrap();
        assert!(matches!(
            table.inverse(),
            Err(CalibrationError::NotMonotonic { axis: "output", .. })
        ));
    }

    #[test]
    fn non_finite_lookup_is_an_error() {
        assert!(ramp().interpolate(f64::NAN).is_err());
    }
}
