//! Error types for instrument access.

use thiserror::Error;

/// Result type for instrument operations.
pub type InstrumentResult<T> = Result<T, InstrumentError>;

/// Errors raised by instruments or the adapters built on them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InstrumentError {
    /// The instrument link failed or the device rejected a command.
    #[error("{instrument}: {message}")]
    Io {
        instrument: String,
        message: String,
    },

    /// A command argument the device cannot accept.
    #[error("Invalid command: {what}")]
    InvalidCommand { what: &'static str },

    /// The device returned a reading that is not a finite number.
    #[error("{instrument} returned a non-finite reading: {value}")]
    BadReading { instrument: &'static str, value: f64 },

    #[error("Calibration error: {0}")]
    Calibration(#[from] ts_calibration::CalibrationError),

    #[error(transparent)]
    Numeric(#[from] ts_core::TsError),
}

impl InstrumentError {
    pub fn io(instrument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            instrument: instrument.into(),
            message: message.into(),
        }
    }
}
