//! Error types for the ts-app service layer.

use std::path::PathBuf;

use crate::stage::Stage;

/// Application error type wrapping the backend crates' errors.
///
/// Any `Err` returned by a sequence means the run was aborted; by the time
/// the caller sees it the heater has already been switched off.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read config file: {path}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write config file: {path}")]
    ConfigWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Instrument error: {0}")]
    Instrument(#[from] ts_instruments::InstrumentError),

    #[error("Control error: {0}")]
    Control(#[from] ts_controls::ControlError),

    #[error("Calibration error: {0}")]
    Calibration(#[from] ts_calibration::CalibrationError),

    #[error("Results error: {0}")]
    Results(#[from] ts_results::ResultsError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{stage} did not reach {target_k} K within {ticks} ticks")]
    NotConverged {
        stage: Stage,
        target_k: f64,
        ticks: usize,
    },

    #[error("Sequence cancelled")]
    Cancelled,
}

/// Result type for ts-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<ts_core::TsError> for AppError {
    fn from(err: ts_core::TsError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}
