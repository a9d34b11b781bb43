//! Feedback control primitives for the temperature loop.
//!
//! One loop, one actuator: a PID controller turns (measured, setpoint)
//! pairs into a heater power command, and the caller projects that command
//! onto the heater's valid range with [`clamp_power`].
//!
//! # Design Principles
//!
//! - **Unbounded controller**: the PID output is never clamped internally
//! - **Injected time**: `dt` comes from a [`ts_core::Clock`], so tests and
//!   simulations run on a virtual clock
//! - **Sampled loop**: one update per [`ControlPeriod`]

pub mod clamp;
pub mod error;
pub mod period;
pub mod pid;

pub use clamp::clamp_power;
pub use error::{ControlError, ControlResult};
pub use period::ControlPeriod;
pub use pid::{ControllerState, PidController, PidGains};
