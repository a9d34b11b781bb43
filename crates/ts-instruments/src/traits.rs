//! Blocking instrument interfaces.
//!
//! Every call may stall for as long as the instrument link does; no
//! timeout is applied here.

use crate::error::InstrumentResult;
use serde::{Deserialize, Serialize};
use ts_core::Voltage;

/// Calibrated temperature probe.
pub trait Thermometer {
    /// Current sample temperature in kelvin.
    fn temperature(&mut self) -> InstrumentResult<f64>;
}

impl<T: Thermometer + ?Sized> Thermometer for &mut T {
    fn temperature(&mut self) -> InstrumentResult<f64> {
        (**self).temperature()
    }
}

impl<T: Thermometer + ?Sized> Thermometer for Box<T> {
    fn temperature(&mut self) -> InstrumentResult<f64> {
        (**self).temperature()
    }
}

/// Bench multimeter (HP 34401A style).
pub trait Multimeter {
    /// DC voltage, volts.
    fn measure_voltage_dc(&mut self) -> InstrumentResult<f64>;

    /// AC RMS voltage, volts.
    fn measure_voltage_ac(&mut self) -> InstrumentResult<f64>;

    /// Four-wire resistance, ohms.
    fn measure_resistance(&mut self) -> InstrumentResult<f64>;
}

/// Programmable voltage source with a switchable output relay.
pub trait VoltageSource {
    fn set_voltage(&mut self, level: Voltage) -> InstrumentResult<()>;

    fn set_output(&mut self, on: bool) -> InstrumentResult<()>;
}

/// One lock-in snapshot in polar form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LockInReading {
    /// Signal magnitude R, volts.
    pub magnitude_v: f64,
    /// Phase θ relative to the reference, degrees.
    pub phase_deg: f64,
}

/// Lock-in amplifier (SR830 style).
pub trait LockIn {
    /// Select the output filter time constant by the device's index.
    fn set_time_constant(&mut self, index: u8) -> InstrumentResult<()>;

    fn auto_phase(&mut self) -> InstrumentResult<()>;

    fn auto_gain(&mut self) -> InstrumentResult<()>;

    fn read(&mut self) -> InstrumentResult<LockInReading>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformShape {
    #[default]
    Sine,
    Square,
    Triangle,
}

/// Full output setting of a function generator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waveform {
    pub shape: WaveformShape,
    pub frequency_hz: f64,
    /// Peak-to-peak amplitude, volts.
    pub amplitude_vpp: f64,
    pub offset_v: f64,
}

/// Function generator driving the sample.
pub trait FunctionGenerator {
    /// Apply a complete waveform setting at once.
    fn apply(&mut self, waveform: &Waveform) -> InstrumentResult<()>;

    /// Change only the frequency of the active waveform.
    fn set_frequency(&mut self, frequency_hz: f64) -> InstrumentResult<()>;
}
