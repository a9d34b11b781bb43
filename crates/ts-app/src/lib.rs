//! Shared application layer for thermosweep.
//!
//! Owns everything between the instruments and a front end: the rig
//! configuration, the setpoint generator, the stage sequencer that runs
//! sweeps and tuning runs, and the lock-in measurement collected at every
//! held setpoint.

pub mod config;
pub mod error;
pub mod measurement;
pub mod progress;
pub mod rig;
pub mod sequencer;
pub mod setpoints;
pub mod stage;
pub mod stop;

// Re-export key types for convenience
pub use config::{
    ControlConfig, MeasurementConfig, RigConfig, TuningConfig, load_config, save_config,
};
pub use error::{AppError, AppResult};
pub use measurement::{LockInSweepCollector, MeasurementCollector};
pub use progress::{SequenceEvent, TickProgress};
pub use rig::{Rig, SimCollector, SimulatedRig, simulated_rig};
pub use sequencer::{HoldObservation, Sequencer, SweepSummary};
pub use setpoints::SetpointRange;
pub use stage::Stage;
pub use stop::StopFlag;
