//! Progress events streamed to front ends while a sequence runs.

use crate::stage::Stage;

/// Snapshot of one closed-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickProgress {
    /// Tick count within the current stage, starting at 1.
    pub tick: usize,
    pub measured_k: f64,
    /// Unclamped controller output, W.
    pub raw_output_w: f64,
    /// Power actually commanded, W.
    pub power_w: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceEvent {
    pub stage: Stage,
    /// Setpoint being worked on, K. `None` outside a setpoint.
    pub target_k: Option<f64>,
    /// 1-based position of the setpoint in the run.
    pub setpoint_index: Option<usize>,
    /// Clock time since the sequence started, s.
    pub elapsed_s: f64,
    pub tick: Option<TickProgress>,
}
