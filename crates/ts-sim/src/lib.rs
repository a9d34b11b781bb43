//! In-process stand-ins for the measurement rig.
//!
//! A lumped thermal plant (one heat capacity coupled to a bath) is shared
//! by a set of simulated instruments that implement the `ts-instruments`
//! traits. The plant is advanced lazily to the [`ts_core::Clock`] reading
//! whenever an instrument touches it, so the same bench runs against a
//! virtual clock in tests and against the wall clock interactively.

pub mod bench;
pub mod instruments;
pub mod plant;

pub use bench::{SimBench, SimParams};
pub use instruments::{
    SimDriveMeter, SimFunctionGenerator, SimLockIn, SimSourceMeter, SimThermometerMeter,
};
pub use plant::ThermalPlant;
