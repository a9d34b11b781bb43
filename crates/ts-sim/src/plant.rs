//! Lumped thermal model of the sample stage.
//!
//! Dynamics: `C * dT/dt = P - G * (T - T_bath)`.
//!
//! This model captures:
//! - **Heat capacity** `C` of the sample and stage
//! - **Thermal link** `G` to the bath the stage sits in
//! - **Heater power** `P`, held constant between commands

use serde::{Deserialize, Serialize};

/// Largest explicit-Euler step taken when catching up to a new time.
const MAX_STEP_S: f64 = 0.05;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThermalPlant {
    /// Stage temperature, K.
    pub temperature_k: f64,
    /// Bath temperature, K.
    pub bath_k: f64,
    /// Heat capacity, J/K. Must be positive.
    pub heat_capacity_j_per_k: f64,
    /// Thermal conductance to the bath, W/K.
    pub conductance_w_per_k: f64,
    /// Heater power currently dissipated, W.
    pub power_w: f64,
    /// Time the state corresponds to, s.
    pub time_s: f64,
}

impl ThermalPlant {
    pub fn new(
        temperature_k: f64,
        bath_k: f64,
        heat_capacity_j_per_k: f64,
        conductance_w_per_k: f64,
        time_s: f64,
    ) -> Self {
        Self {
            temperature_k,
            bath_k,
            heat_capacity_j_per_k,
            conductance_w_per_k,
            power_w: 0.0,
            time_s,
        }
    }

    /// Temperature derivative at the current state, K/s.
    pub fn dtdt(&self) -> f64 {
        (self.power_w - self.conductance_w_per_k * (self.temperature_k - self.bath_k))
            / self.heat_capacity_j_per_k
    }

    /// Integrate forward to `time_s`. Earlier times are ignored.
    pub fn advance_to(&mut self, time_s: f64) {
        while self.time_s < time_s {
            let remaining = time_s - self.time_s;
            let dt = remaining.min(MAX_STEP_S);
            self.temperature_k += self.dtdt() * dt;
            self.time_s = if dt < remaining {
                self.time_s + dt
            } else {
                time_s
            };
        }
    }

    /// Temperature the plant settles at under constant `power_w`.
    pub fn equilibrium_k(&self, power_w: f64) -> f64 {
        self.bath_k + power_w / self.conductance_w_per_k
    }
}
