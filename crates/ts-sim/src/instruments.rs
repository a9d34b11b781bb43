//! Simulated instruments backed by a shared [`BenchState`].

use crate::bench::BenchState;
use std::cell::RefCell;
use std::f64::consts::SQRT_2;
use std::rc::Rc;
use tracing::trace;
use ts_calibration::{CalibrationTable, SensorKind};
use ts_core::Voltage;
use ts_core::constants::ZERO_CELSIUS_K;
use ts_instruments::{
    FunctionGenerator, InstrumentError, InstrumentResult, LockIn, LockInReading, Multimeter,
    VoltageSource, Waveform,
};
use uom::si::electric_potential::volt;

/// Fractional resistance change of the sample per kelvin.
const SAMPLE_TEMPERATURE_COEFFICIENT: f64 = 0.004;

/// Fraction of the sample voltage the lock-in sees at its input.
const LOCK_IN_COUPLING: f64 = 1e-3;

/// Heater supply. The plant sees `V^2 / R` while the output relay is closed.
pub struct SimSourceMeter {
    state: Rc<RefCell<BenchState>>,
}

impl SimSourceMeter {
    pub(crate) fn new(state: Rc<RefCell<BenchState>>) -> Self {
        Self { state }
    }
}

impl VoltageSource for SimSourceMeter {
    fn set_voltage(&mut self, level: Voltage) -> InstrumentResult<()> {
        let volts = level.get::<volt>();
        if !volts.is_finite() || volts < 0.0 {
            return Err(InstrumentError::InvalidCommand {
                what: "supply voltage must be finite and non-negative",
            });
        }
        let mut state = self.state.borrow_mut();
        state.sync();
        state.heater_volts = volts;
        state.apply_heater();
        trace!(volts, power_w = state.plant.power_w, "heater supply set");
        Ok(())
    }

    fn set_output(&mut self, on: bool) -> InstrumentResult<()> {
        let mut state = self.state.borrow_mut();
        state.sync();
        state.heater_output_on = on;
        state.apply_heater();
        Ok(())
    }
}

/// Multimeter wired to the stage thermometer.
///
/// Reports what a real diode or RTD would read at the plant temperature
/// plus uniform noise.
pub struct SimThermometerMeter {
    state: Rc<RefCell<BenchState>>,
    kind: SensorKind,
    kelvin_to_raw: CalibrationTable,
}

impl SimThermometerMeter {
    pub(crate) fn new(state: Rc<RefCell<BenchState>>, kind: SensorKind) -> InstrumentResult<Self> {
        Ok(Self {
            state,
            kind,
            kelvin_to_raw: kind.table()?.inverse()?,
        })
    }

    fn raw(&mut self, wanted: SensorKind) -> InstrumentResult<f64> {
        if self.kind != wanted {
            return Err(InstrumentError::io(
                "simulated thermometer meter",
                format!("sensor is wired as {:?}", self.kind),
            ));
        }
        let kelvin = {
            let mut state = self.state.borrow_mut();
            state.sync();
            let noise = state.noise();
            state.plant.temperature_k + noise
        };
        Ok(self.kelvin_to_raw.interpolate(kelvin)?)
    }
}

impl Multimeter for SimThermometerMeter {
    fn measure_voltage_dc(&mut self) -> InstrumentResult<f64> {
        self.raw(SensorKind::Diode)
    }

    fn measure_voltage_ac(&mut self) -> InstrumentResult<f64> {
        Ok(0.0)
    }

    fn measure_resistance(&mut self) -> InstrumentResult<f64> {
        self.raw(SensorKind::PlatinumRtd)
    }
}

/// RMS voltage across the drive resistor for the active waveform.
fn drive_rms_v(state: &BenchState, drive_resistor_ohm: f64) -> f64 {
    match state.waveform {
        Some(waveform) => {
            let source_rms = waveform.amplitude_vpp / (2.0 * SQRT_2);
            source_rms * drive_resistor_ohm / (drive_resistor_ohm + state.params.sample_ohms)
        }
        None => 0.0,
    }
}

/// Multimeter across the drive resistor in series with the sample.
pub struct SimDriveMeter {
    state: Rc<RefCell<BenchState>>,
    drive_resistor_ohm: f64,
}

impl SimDriveMeter {
    pub(crate) fn new(state: Rc<RefCell<BenchState>>, drive_resistor_ohm: f64) -> Self {
        Self {
            state,
            drive_resistor_ohm,
        }
    }
}

impl Multimeter for SimDriveMeter {
    fn measure_voltage_dc(&mut self) -> InstrumentResult<f64> {
        let state = self.state.borrow();
        Ok(state.waveform.map_or(0.0, |w| w.offset_v))
    }

    fn measure_voltage_ac(&mut self) -> InstrumentResult<f64> {
        Ok(drive_rms_v(&self.state.borrow(), self.drive_resistor_ohm))
    }

    fn measure_resistance(&mut self) -> InstrumentResult<f64> {
        Ok(self.drive_resistor_ohm)
    }
}

pub struct SimFunctionGenerator {
    state: Rc<RefCell<BenchState>>,
}

impl SimFunctionGenerator {
    pub(crate) fn new(state: Rc<RefCell<BenchState>>) -> Self {
        Self { state }
    }
}

impl FunctionGenerator for SimFunctionGenerator {
    fn apply(&mut self, waveform: &Waveform) -> InstrumentResult<()> {
        if !(waveform.frequency_hz.is_finite() && waveform.frequency_hz > 0.0) {
            return Err(InstrumentError::InvalidCommand {
                what: "waveform frequency must be positive",
            });
        }
        if !(waveform.amplitude_vpp.is_finite() && waveform.amplitude_vpp >= 0.0) {
            return Err(InstrumentError::InvalidCommand {
                what: "waveform amplitude must be non-negative",
            });
        }
        self.state.borrow_mut().waveform = Some(*waveform);
        Ok(())
    }

    fn set_frequency(&mut self, frequency_hz: f64) -> InstrumentResult<()> {
        if !(frequency_hz.is_finite() && frequency_hz > 0.0) {
            return Err(InstrumentError::InvalidCommand {
                what: "waveform frequency must be positive",
            });
        }
        let mut state = self.state.borrow_mut();
        match state.waveform.as_mut() {
            Some(waveform) => {
                waveform.frequency_hz = frequency_hz;
                Ok(())
            }
            None => Err(InstrumentError::io(
                "simulated function generator",
                "frequency set before any waveform was applied",
            )),
        }
    }
}

/// Lock-in referenced to the function generator.
///
/// The sample behaves as a resistor with a linear temperature coefficient
/// behind a single-pole roll-off.
pub struct SimLockIn {
    state: Rc<RefCell<BenchState>>,
    drive_resistor_ohm: f64,
    phase_offset_deg: f64,
}

impl SimLockIn {
    pub(crate) fn new(state: Rc<RefCell<BenchState>>, drive_resistor_ohm: f64) -> Self {
        Self {
            state,
            drive_resistor_ohm,
            phase_offset_deg: 0.0,
        }
    }

    fn ideal(&self, state: &BenchState) -> LockInReading {
        let Some(waveform) = state.waveform else {
            return LockInReading {
                magnitude_v: 0.0,
                phase_deg: 0.0,
            };
        };
        let current_a = drive_rms_v(state, self.drive_resistor_ohm) / self.drive_resistor_ohm;
        let sample_ohms = state.params.sample_ohms
            * (1.0
                + SAMPLE_TEMPERATURE_COEFFICIENT * (state.plant.temperature_k - ZERO_CELSIUS_K));
        let ratio = waveform.frequency_hz / state.params.rolloff_hz;
        LockInReading {
            magnitude_v: LOCK_IN_COUPLING * current_a * sample_ohms / (1.0 + ratio * ratio).sqrt(),
            phase_deg: -ratio.atan().to_degrees(),
        }
    }
}

impl LockIn for SimLockIn {
    fn set_time_constant(&mut self, index: u8) -> InstrumentResult<()> {
        if index > 19 {
            return Err(InstrumentError::InvalidCommand {
                what: "time constant index must be in 0..=19",
            });
        }
        self.state.borrow_mut().lock_in_time_constant = Some(index);
        Ok(())
    }

    fn auto_phase(&mut self) -> InstrumentResult<()> {
        let mut state = self.state.borrow_mut();
        state.sync();
        self.phase_offset_deg = -self.ideal(&state).phase_deg;
        state.auto_phase_calls += 1;
        Ok(())
    }

    fn auto_gain(&mut self) -> InstrumentResult<()> {
        self.state.borrow_mut().auto_gain_calls += 1;
        Ok(())
    }

    fn read(&mut self) -> InstrumentResult<LockInReading> {
        let mut state = self.state.borrow_mut();
        state.sync();
        let reading = self.ideal(&state);
        Ok(LockInReading {
            magnitude_v: reading.magnitude_v,
            phase_deg: reading.phase_deg + self.phase_offset_deg,
        })
    }
}
