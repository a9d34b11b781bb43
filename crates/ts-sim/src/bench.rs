//! Shared state of the simulated bench and the factory for its instruments.

use crate::instruments::{
    SimDriveMeter, SimFunctionGenerator, SimLockIn, SimSourceMeter, SimThermometerMeter,
};
use crate::plant::ThermalPlant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use ts_calibration::SensorKind;
use ts_core::{
    Clock, TsError, TsResult, ensure_finite, ensure_positive, ohms, power_for_voltage, volts,
};
use ts_instruments::{InstrumentResult, Waveform};
use uom::si::power::watt;

/// Physical parameters of the simulated rig.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimParams {
    /// Stage temperature at start, K.
    pub initial_k: f64,
    pub bath_k: f64,
    pub heat_capacity_j_per_k: f64,
    pub conductance_w_per_k: f64,
    /// Half-width of the uniform thermometer noise, K.
    pub noise_k: f64,
    pub seed: u64,
    /// Sample impedance in series with the drive resistor, Ω.
    pub sample_ohms: f64,
    /// Corner frequency of the sample's response, Hz.
    pub rolloff_hz: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            initial_k: 295.0,
            bath_k: 295.0,
            heat_capacity_j_per_k: 1.0,
            conductance_w_per_k: 0.005,
            noise_k: 0.02,
            seed: 7,
            sample_ohms: 1_000.0,
            rolloff_hz: 3_000.0,
        }
    }
}

impl SimParams {
    pub fn validate(&self) -> TsResult<()> {
        ensure_finite(self.initial_k, "initial temperature")?;
        ensure_finite(self.bath_k, "bath temperature")?;
        ensure_positive(self.heat_capacity_j_per_k, "heat capacity")?;
        ensure_positive(self.conductance_w_per_k, "thermal conductance")?;
        ensure_positive(self.sample_ohms, "sample impedance")?;
        ensure_positive(self.rolloff_hz, "roll-off frequency")?;
        if !(self.noise_k.is_finite() && self.noise_k >= 0.0) {
            return Err(TsError::InvalidArg {
                what: "thermometer noise must be finite and non-negative",
            });
        }
        Ok(())
    }
}

pub(crate) struct BenchState {
    pub(crate) plant: ThermalPlant,
    pub(crate) params: SimParams,
    clock: Rc<dyn Clock>,
    rng: StdRng,
    /// Heater supply level and relay.
    pub(crate) heater_volts: f64,
    pub(crate) heater_output_on: bool,
    pub(crate) heater_resistance_ohm: f64,
    /// Active function generator setting, if any has been applied.
    pub(crate) waveform: Option<Waveform>,
    pub(crate) lock_in_time_constant: Option<u8>,
    pub(crate) auto_gain_calls: usize,
    pub(crate) auto_phase_calls: usize,
}

impl BenchState {
    /// Catch the plant up with the clock.
    pub(crate) fn sync(&mut self) {
        let now = self.clock.now_s();
        self.plant.advance_to(now);
    }

    pub(crate) fn noise(&mut self) -> f64 {
        let half_width = self.params.noise_k;
        if half_width > 0.0 {
            self.rng.gen_range(-half_width..=half_width)
        } else {
            0.0
        }
    }

    pub(crate) fn apply_heater(&mut self) {
        self.plant.power_w = if self.heater_output_on {
            power_for_voltage(volts(self.heater_volts), ohms(self.heater_resistance_ohm))
                .get::<watt>()
        } else {
            0.0
        };
    }
}

/// Handle to a simulated bench. Cloning shares the same plant.
#[derive(Clone)]
pub struct SimBench {
    state: Rc<RefCell<BenchState>>,
}

impl SimBench {
    /// # Errors
    ///
    /// Returns an error if `params` or `heater_resistance_ohm` are not physical.
    pub fn new(
        params: SimParams,
        heater_resistance_ohm: f64,
        clock: Rc<dyn Clock>,
    ) -> TsResult<Self> {
        params.validate()?;
        ensure_positive(heater_resistance_ohm, "heater resistance")?;
        let plant = ThermalPlant::new(
            params.initial_k,
            params.bath_k,
            params.heat_capacity_j_per_k,
            params.conductance_w_per_k,
            clock.now_s(),
        );
        let rng = StdRng::seed_from_u64(params.seed);
        Ok(Self {
            state: Rc::new(RefCell::new(BenchState {
                plant,
                params,
                clock,
                rng,
                heater_volts: 0.0,
                heater_output_on: false,
                heater_resistance_ohm,
                waveform: None,
                lock_in_time_constant: None,
                auto_gain_calls: 0,
                auto_phase_calls: 0,
            })),
        })
    }

    /// Noise-free stage temperature at the current clock time, K.
    pub fn temperature_k(&self) -> f64 {
        let mut state = self.state.borrow_mut();
        state.sync();
        state.plant.temperature_k
    }

    /// Power currently dissipated in the heater, W.
    pub fn heater_power_w(&self) -> f64 {
        self.state.borrow().plant.power_w
    }

    pub fn heater_output_on(&self) -> bool {
        self.state.borrow().heater_output_on
    }

    pub fn waveform(&self) -> Option<Waveform> {
        self.state.borrow().waveform
    }

    pub fn lock_in_time_constant(&self) -> Option<u8> {
        self.state.borrow().lock_in_time_constant
    }

    pub fn auto_gain_calls(&self) -> usize {
        self.state.borrow().auto_gain_calls
    }

    pub fn auto_phase_calls(&self) -> usize {
        self.state.borrow().auto_phase_calls
    }

    pub fn source_meter(&self) -> SimSourceMeter {
        SimSourceMeter::new(self.state.clone())
    }

    pub fn thermometer_meter(&self, kind: SensorKind) -> InstrumentResult<SimThermometerMeter> {
        SimThermometerMeter::new(self.state.clone(), kind)
    }

    pub fn drive_meter(&self, drive_resistor_ohm: f64) -> SimDriveMeter {
        SimDriveMeter::new(self.state.clone(), drive_resistor_ohm)
    }

    pub fn function_generator(&self) -> SimFunctionGenerator {
        SimFunctionGenerator::new(self.state.clone())
    }

    pub fn lock_in(&self, drive_resistor_ohm: f64) -> SimLockIn {
        SimLockIn::new(self.state.clone(), drive_resistor_ohm)
    }
}
