//! Phases of the stabilization protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a sequence currently is.
///
/// A sweep walks `Idle → Preheat → (Ramp → Settle → Average → Hold)* →
/// Done`; a tuning run skips `Preheat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    /// Closed loop toward the first setpoint until within tolerance.
    Preheat,
    /// Closed loop until the measurement reaches the target.
    Ramp,
    /// Fixed number of closed-loop ticks to let transients die out.
    Settle,
    /// Fixed number of closed-loop ticks whose clamped output is averaged.
    Average,
    /// Open loop at the averaged power while measurements are taken.
    Hold,
    Done,
}

impl Stage {
    /// Stages that drive the heater from the controller.
    pub fn is_closed_loop(self) -> bool {
        matches!(self, Stage::Preheat | Stage::Ramp | Stage::Settle | Stage::Average)
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::Idle => "IDLE",
            Stage::Preheat => "PREHEAT",
            Stage::Ramp => "RAMP",
            Stage::Settle => "SETTLE",
            Stage::Average => "AVERAGE",
            Stage::Hold => "HOLD",
            Stage::Done => "DONE",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
