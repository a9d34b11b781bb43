//! Instrument seams for the measurement rig.
//!
//! The control loop and the measurement sweep only ever talk to the bench
//! through the traits in this crate. Wire-level drivers (GPIB/SCPI) live
//! outside the workspace; `ts-sim` provides in-process stand-ins.
//!
//! # Safety
//!
//! The heater is the one instrument that can damage the sample. Drive it
//! through a [`HeaterGuard`]: the guard turns the output off when it goes
//! out of scope, including on error returns and panics.

pub mod error;
pub mod heater;
pub mod thermometer;
pub mod traits;

pub use error::{InstrumentError, InstrumentResult};
pub use heater::{Heater, HeaterGuard, ResistiveHeater};
pub use thermometer::CalibratedThermometer;
pub use traits::{
    FunctionGenerator, LockIn, LockInReading, Multimeter, Thermometer, VoltageSource, Waveform,
    WaveformShape,
};
