//! Result data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type RunId = String;

/// Lock-in snapshot at one drive frequency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyPoint {
    pub frequency_hz: f64,
    /// AC RMS voltage across the drive sense resistor.
    pub drive_voltage_rms_v: f64,
    pub drive_current_rms_a: f64,
    /// Lock-in magnitude R.
    pub magnitude_v: f64,
    /// Lock-in phase θ.
    pub phase_deg: f64,
}

/// Everything recorded while one setpoint was held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    pub setpoint_k: f64,
    /// Open-loop power applied during the hold.
    pub held_power_w: f64,
    /// Thermometry before the first frequency and after each one.
    pub temperatures_k: Vec<f64>,
    pub points: Vec<FrequencyPoint>,
    pub recorded_at: DateTime<Utc>,
}

impl StageResult {
    /// Spread of the temperatures seen during the hold, kelvin.
    pub fn temperature_drift_k(&self) -> f64 {
        let min = self.temperatures_k.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .temperatures_k
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            max - min
        } else {
            0.0
        }
    }

    pub fn point_at(&self, frequency_hz: f64) -> Option<&FrequencyPoint> {
        self.points
            .iter()
            .find(|p| (p.frequency_hz - frequency_hz).abs() < 1e-9)
    }
}

/// Sweep parameters and bookkeeping written next to the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub start_k: f64,
    pub end_k: f64,
    pub resolution_k: f64,
    pub setpoints_recorded: usize,
    pub complete: bool,
}

impl RunManifest {
    pub fn begin(start_k: f64, end_k: f64, resolution_k: f64) -> Self {
        let started_at = Utc::now();
        Self {
            run_id: started_at.format("%Y%m%dT%H%M%SZ").to_string(),
            started_at,
            finished_at: None,
            start_k,
            end_k,
            resolution_k,
            setpoints_recorded: 0,
            complete: false,
        }
    }

    pub fn finish(&mut self, setpoints_recorded: usize) {
        self.finished_at = Some(Utc::now());
        self.setpoints_recorded = setpoints_recorded;
        self.complete = true;
    }

    /// Wall-clock duration of a finished run.
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
