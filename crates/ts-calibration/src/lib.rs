//! ts-calibration: sensor calibration tables.
//!
//! Raw thermometer readings (diode forward voltage, RTD resistance) are
//! converted to temperature by piecewise-linear interpolation over a
//! monotonic lookup table. The same tables give the resistivity of the
//! wiring materials as a function of temperature.

pub mod table;
pub mod tables;

pub use table::CalibrationTable;
pub use tables::{Conductor, SensorKind, diode_voltage_to_kelvin, platinum_ohms_to_kelvin};

pub type CalibrationResult<T> = Result<T, CalibrationError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("Calibration table needs at least two points, got {len}")]
    TooShort { len: usize },

    #[error("Calibration axes differ in length: {xs} inputs vs {ys} outputs")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("Calibration {axis} axis is not strictly monotonic at index {index}")]
    NotMonotonic { axis: &'static str, index: usize },

    #[error(transparent)]
    Numeric(#[from] ts_core::TsError),
}
