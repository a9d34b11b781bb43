//! ts-results: per-setpoint records and sweep checkpoints.

pub mod store;
pub mod types;

pub use store::{ResultSink, RunStore};
pub use types::*;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No data found at {path}")]
    NotFound { path: String },
}
