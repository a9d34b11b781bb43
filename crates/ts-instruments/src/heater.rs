//! Resistive heater actuation and its shutdown guard.

use crate::error::{InstrumentError, InstrumentResult};
use crate::traits::VoltageSource;
use tracing::{debug, error, info};
use ts_core::{Resistance, ensure_positive, ohms, voltage_for_power, w};

/// Power actuator of the control loop.
pub trait Heater {
    /// Command dissipated power in watts. Does not switch the output on.
    fn set_power(&mut self, watts: f64) -> InstrumentResult<()>;

    /// Close the output relay.
    fn enable(&mut self) -> InstrumentResult<()>;

    /// Open the output relay.
    fn disable(&mut self) -> InstrumentResult<()>;
}

impl<H: Heater + ?Sized> Heater for &mut H {
    fn set_power(&mut self, watts: f64) -> InstrumentResult<()> {
        (**self).set_power(watts)
    }

    fn enable(&mut self) -> InstrumentResult<()> {
        (**self).enable()
    }

    fn disable(&mut self) -> InstrumentResult<()> {
        (**self).disable()
    }
}

impl<H: Heater + ?Sized> Heater for Box<H> {
    fn set_power(&mut self, watts: f64) -> InstrumentResult<()> {
        (**self).set_power(watts)
    }

    fn enable(&mut self) -> InstrumentResult<()> {
        (**self).enable()
    }

    fn disable(&mut self) -> InstrumentResult<()> {
        (**self).disable()
    }
}

/// Heater element of known resistance driven by a voltage source.
///
/// Power is converted to the drive level with `V = sqrt(P * R)`.
pub struct ResistiveHeater<S> {
    source: S,
    resistance: Resistance,
}

impl<S: VoltageSource> ResistiveHeater<S> {
    /// # Errors
    ///
    /// Returns an error if `resistance_ohm` is not finite and positive.
    pub fn new(source: S, resistance_ohm: f64) -> InstrumentResult<Self> {
        let resistance_ohm = ensure_positive(resistance_ohm, "heater resistance")?;
        Ok(Self {
            source,
            resistance: ohms(resistance_ohm),
        })
    }

    pub fn resistance(&self) -> Resistance {
        self.resistance
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}

impl<S: VoltageSource> Heater for ResistiveHeater<S> {
    fn set_power(&mut self, watts: f64) -> InstrumentResult<()> {
        if !watts.is_finite() || watts < 0.0 {
            return Err(InstrumentError::InvalidCommand {
                what: "heater power must be finite and non-negative",
            });
        }
        self.source
            .set_voltage(voltage_for_power(w(watts), self.resistance))
    }

    fn enable(&mut self) -> InstrumentResult<()> {
        self.source.set_output(true)
    }

    fn disable(&mut self) -> InstrumentResult<()> {
        self.source.set_output(false)
    }
}

/// Scoped ownership of the heater output.
///
/// [`HeaterGuard::engage`] zeroes the power and switches the output on.
/// The output is switched off again exactly once: by [`HeaterGuard::release`]
/// on the normal path, or by `Drop` when the guard is abandoned by an error
/// return or a panic.
pub struct HeaterGuard<'h> {
    heater: &'h mut dyn Heater,
    power_w: f64,
    released: bool,
}

impl<'h> HeaterGuard<'h> {
    pub fn engage(heater: &'h mut dyn Heater) -> InstrumentResult<Self> {
        // Built first so a failing enable still runs the shutdown in Drop.
        let mut guard = Self {
            heater,
            power_w: 0.0,
            released: false,
        };
        guard.heater.set_power(0.0)?;
        guard.heater.enable()?;
        info!("heater output enabled");
        Ok(guard)
    }

    pub fn set_power(&mut self, watts: f64) -> InstrumentResult<()> {
        self.heater.set_power(watts)?;
        self.power_w = watts;
        debug!(power_w = watts, "heater power");
        Ok(())
    }

    /// Last power successfully commanded, watts.
    pub fn power_w(&self) -> f64 {
        self.power_w
    }

    /// Zero the power and switch the output off.
    pub fn release(mut self) -> InstrumentResult<()> {
        self.released = true;
        self.shutdown()
    }

    fn shutdown(&mut self) -> InstrumentResult<()> {
        let zeroed = self.heater.set_power(0.0);
        if let Err(err) = &zeroed {
            error!(%err, "failed to zero heater power during shutdown");
        }
        self.heater.disable()?;
        self.power_w = 0.0;
        info!("heater output disabled");
        zeroed
    }
}

impl Drop for HeaterGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = self.shutdown() {
            error!(%err, "heater shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ts_core::Voltage;
    use uom::si::electric_potential::volt;

    #[derive(Default)]
    struct RecordingSource {
        volts: Vec<f64>,
        output: Vec<bool>,
    }

    impl VoltageSource for RecordingSource {
        fn set_voltage(&mut self, level: Voltage) -> InstrumentResult<()> {
            self.volts.push(level.get::<volt>());
            Ok(())
        }

        fn set_output(&mut self, on: bool) -> InstrumentResult<()> {
            self.output.push(on);
            Ok(())
        }
    }

    #[test]
    fn power_maps_to_square_root_voltage() {
        let mut heater = ResistiveHeater::new(RecordingSource::default(), 90.0).unwrap();
        heater.set_power(0.4).unwrap();
        heater.set_power(0.0).unwrap();
        let volts = &heater.source().volts;
        assert!((volts[0] - 6.0).abs() < 1e-12);
        assert_eq!(volts[1], 0.0);
    }

    #[test]
    fn rejects_negative_and_nan_power() {
        let mut heater = ResistiveHeater::new(RecordingSource::default(), 90.0).unwrap();
        assert!(heater.set_power(-0.1).is_err());
        assert!(heater.set_power(f64::NAN).is_err());
        assert!(heater.source().volts.is_empty());
    }

    #[test]
    fn rejects_bad_resistance() {
        assert!(ResistiveHeater::new(RecordingSource::default(), 0.0).is_err());
        assert!(ResistiveHeater::new(RecordingSource::default(), -5.0).is_err());
    }

    #[test]
    fn guard_release_disables_once() {
        let mut heater = ResistiveHeater::new(RecordingSource::default(), 90.0).unwrap();
        {
            let mut guard = HeaterGuard::engage(&mut heater).unwrap();
            guard.set_power(0.1).unwrap();
            assert_eq!(guard.power_w(), 0.1);
            guard.release().unwrap();
        }
        assert_eq!(heater.source().output, vec![true, false]);
        assert_eq!(heater.source().volts.last(), Some(&0.0));
    }

    #[test]
    fn dropped_guard_disables_heater() {
        let mut heater = ResistiveHeater::new(RecordingSource::default(), 90.0).unwrap();
        {
            let mut guard = HeaterGuard::engage(&mut heater).unwrap();
            guard.set_power(0.2).unwrap();
        }
        assert_eq!(heater.source().output, vec![true, false]);
        assert_eq!(heater.source().volts.last(), Some(&0.0));
    }
}
