//! Rig configuration: YAML loading, saving, and validation.
//!
//! Every field has a default matching the bench the protocol was tuned
//! on, so an empty file (or no file) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use ts_calibration::SensorKind;
use ts_controls::{ControlPeriod, PidGains};
use ts_instruments::{Waveform, WaveformShape};
use ts_sim::SimParams;

use crate::error::{AppError, AppResult};

/// Top-level rig configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub control: ControlConfig,
    /// Heater element resistance, Ω.
    pub heater_resistance_ohm: f64,
    /// Stage thermometer type.
    pub sensor: SensorKind,
    pub measurement: MeasurementConfig,
    pub tuning: TuningConfig,
    pub simulation: SimParams,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            control: ControlConfig::default(),
            heater_resistance_ohm: 90.0,
            sensor: SensorKind::Diode,
            measurement: MeasurementConfig::default(),
            tuning: TuningConfig::default(),
            simulation: SimParams::default(),
        }
    }
}

/// Loop gains, actuator limit and stage lengths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    pub gains: PidGains,
    /// Upper bound of the heater command, W.
    pub max_power_w: f64,
    pub control_period_s: f64,
    pub settle_ticks: usize,
    pub average_ticks: usize,
    /// Pre-heat ends once the reading is this close to the first setpoint.
    pub preheat_tolerance_k: f64,
    /// Give up on RAMP or PREHEAT after this many ticks. Unbounded if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_ramp_ticks: Option<usize>,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            max_power_w: 0.4,
            control_period_s: ControlPeriod::DEFAULT_S,
            settle_ticks: 60,
            average_ticks: 40,
            preheat_tolerance_k: 1.5,
            max_ramp_ticks: None,
        }
    }
}

impl ControlConfig {
    pub fn period(&self) -> AppResult<ControlPeriod> {
        Ok(ControlPeriod::new(self.control_period_s)?)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.gains.validate()?;
        self.period()?;
        if !(self.max_power_w.is_finite() && self.max_power_w > 0.0) {
            return Err(AppError::Config(format!(
                "max_power_w must be finite and positive, got {}",
                self.max_power_w
            )));
        }
        if self.average_ticks == 0 {
            return Err(AppError::Config("average_ticks must be at least 1".to_string()));
        }
        if !(self.preheat_tolerance_k.is_finite() && self.preheat_tolerance_k > 0.0) {
            return Err(AppError::Config(format!(
                "preheat_tolerance_k must be finite and positive, got {}",
                self.preheat_tolerance_k
            )));
        }
        if self.max_ramp_ticks == Some(0) {
            return Err(AppError::Config(
                "max_ramp_ticks must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lock-in frequency sweep taken at every held setpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementConfig {
    /// Drive frequencies visited in order, Hz.
    pub frequencies_hz: Vec<f64>,
    /// Generator frequency restored after the sweep and used for setup, Hz.
    pub restore_frequency_hz: f64,
    pub shape: WaveformShape,
    pub amplitude_vpp: f64,
    pub offset_v: f64,
    /// SR830 time-constant index (9 = 300 ms).
    pub lock_in_time_constant: u8,
    /// Wait after auto-gain before reading the lock-in, s.
    pub lock_in_settle_s: f64,
    /// Wait after each auto-phase/auto-gain during setup, s.
    pub setup_settle_s: f64,
    /// Sense resistor in series with the sample, Ω.
    pub drive_resistor_ohm: f64,
}

impl Default for MeasurementConfig {
    fn default() -> Self {
        Self {
            frequencies_hz: vec![1_000.0, 2_000.0, 4_000.0, 8_000.0],
            restore_frequency_hz: 2_000.0,
            shape: WaveformShape::Sine,
            amplitude_vpp: 1.0,
            offset_v: 0.0,
            lock_in_time_constant: 9,
            lock_in_settle_s: 10.0,
            setup_settle_s: 5.0,
            drive_resistor_ohm: 98.8,
        }
    }
}

impl MeasurementConfig {
    /// Generator setting applied during setup.
    pub fn waveform(&self) -> Waveform {
        Waveform {
            shape: self.shape,
            frequency_hz: self.restore_frequency_hz,
            amplitude_vpp: self.amplitude_vpp,
            offset_v: self.offset_v,
        }
    }

    pub fn lock_in_settle(&self) -> Duration {
        Duration::from_secs_f64(self.lock_in_settle_s)
    }

    pub fn setup_settle(&self) -> Duration {
        Duration::from_secs_f64(self.setup_settle_s)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.frequencies_hz.is_empty() {
            return Err(AppError::Config(
                "measurement.frequencies_hz must not be empty".to_string(),
            ));
        }
        for &f in self.frequencies_hz.iter().chain([&self.restore_frequency_hz]) {
            if !(f.is_finite() && f > 0.0) {
                return Err(AppError::Config(format!(
                    "drive frequencies must be finite and positive, got {f}"
                )));
            }
        }
        if !(self.drive_resistor_ohm.is_finite() && self.drive_resistor_ohm > 0.0) {
            return Err(AppError::Config(format!(
                "drive_resistor_ohm must be finite and positive, got {}",
                self.drive_resistor_ohm
            )));
        }
        for (name, value) in [
            ("lock_in_settle_s", self.lock_in_settle_s),
            ("setup_settle_s", self.setup_settle_s),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(AppError::Config(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

/// Short stabilization runs used to check loop behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TuningConfig {
    /// Gains used by tuning runs; gentler than the sweep gains.
    pub gains: PidGains,
    /// Temperature readings taken while holding each target.
    pub observe_samples: usize,
    pub observe_interval_s: f64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        let sweep = PidGains::default();
        Self {
            gains: PidGains {
                kp: sweep.kp * 0.1,
                ki: sweep.ki * 0.1,
                kd: sweep.kd * 0.05,
            },
            observe_samples: 10,
            observe_interval_s: 1.0,
        }
    }
}

impl TuningConfig {
    pub fn observe_interval(&self) -> Duration {
        Duration::from_secs_f64(self.observe_interval_s)
    }

    pub fn validate(&self) -> AppResult<()> {
        self.gains.validate()?;
        if !(self.observe_interval_s.is_finite() && self.observe_interval_s >= 0.0) {
            return Err(AppError::Config(format!(
                "observe_interval_s must be finite and non-negative, got {}",
                self.observe_interval_s
            )));
        }
        Ok(())
    }
}

impl RigConfig {
    /// Control settings for a tuning run: the sweep's limits and stage
    /// lengths with the tuning gains.
    pub fn tuning_control(&self) -> ControlConfig {
        ControlConfig {
            gains: self.tuning.gains,
            ..self.control.clone()
        }
    }

    /// Check every section.
    pub fn validate(&self) -> AppResult<()> {
        self.control.validate()?;
        self.measurement.validate()?;
        self.tuning.validate()?;
        if !(self.heater_resistance_ohm.is_finite() && self.heater_resistance_ohm > 0.0) {
            return Err(AppError::Config(format!(
                "heater_resistance_ohm must be finite and positive, got {}",
                self.heater_resistance_ohm
            )));
        }
        self.simulation.validate()?;
        Ok(())
    }
}

/// Load and validate a rig config from a YAML file.
pub fn load_config(path: &Path) -> AppResult<RigConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: RigConfig = serde_yaml::from_str(&content)
        .map_err(|e| AppError::Config(format!("Failed to parse config YAML: {}", e)))?;
    config.validate()?;

    Ok(config)
}

/// Save a rig config to a YAML file.
pub fn save_config(path: &Path, config: &RigConfig) -> AppResult<()> {
    let content = serde_yaml::to_string(config)
        .map_err(|e| AppError::Config(format!("Failed to serialize config: {}", e)))?;

    std::fs::write(path, content).map_err(|e| AppError::ConfigWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
