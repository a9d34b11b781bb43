//! The instruments a control sequence runs against.

use std::rc::Rc;
use ts_core::Clock;
use ts_instruments::{CalibratedThermometer, Heater, ResistiveHeater, Thermometer};
use ts_sim::{SimBench, SimDriveMeter, SimFunctionGenerator, SimLockIn};

use crate::config::RigConfig;
use crate::error::AppResult;
use crate::measurement::LockInSweepCollector;

/// Control-loop instruments and the timebase they share.
///
/// Built once per process and lent to the sequencer. The heater inside is
/// the only one any controller drives.
pub struct Rig {
    pub thermometer: Box<dyn Thermometer>,
    pub heater: Box<dyn Heater>,
    pub clock: Rc<dyn Clock>,
}

impl Rig {
    pub fn new(
        thermometer: Box<dyn Thermometer>,
        heater: Box<dyn Heater>,
        clock: Rc<dyn Clock>,
    ) -> Self {
        Self {
            thermometer,
            heater,
            clock,
        }
    }

    pub fn temperature(&mut self) -> AppResult<f64> {
        Ok(self.thermometer.temperature()?)
    }
}

/// Lock-in collector wired to simulated instruments.
pub type SimCollector = LockInSweepCollector<SimFunctionGenerator, SimDriveMeter, SimLockIn>;

/// A complete rig backed by [`SimBench`].
pub struct SimulatedRig {
    pub rig: Rig,
    pub collector: SimCollector,
    pub bench: SimBench,
}

/// Build a rig whose instruments all share one simulated thermal plant.
pub fn simulated_rig(config: &RigConfig, clock: Rc<dyn Clock>) -> AppResult<SimulatedRig> {
    config.validate()?;
    let bench = SimBench::new(
        config.simulation.clone(),
        config.heater_resistance_ohm,
        clock.clone(),
    )?;

    let thermometer =
        CalibratedThermometer::new(bench.thermometer_meter(config.sensor)?, config.sensor)?;
    let heater = ResistiveHeater::new(bench.source_meter(), config.heater_resistance_ohm)?;
    let drive_resistor_ohm = config.measurement.drive_resistor_ohm;
    let collector = LockInSweepCollector::new(
        bench.function_generator(),
        bench.drive_meter(drive_resistor_ohm),
        bench.lock_in(drive_resistor_ohm),
        config.measurement.clone(),
    );

    Ok(SimulatedRig {
        rig: Rig::new(Box::new(thermometer), Box::new(heater), clock),
        collector,
        bench,
    })
}
