use proptest::prelude::*;
use ts_core::{Tolerances, Voltage, nearly_equal};
use ts_instruments::{Heater, InstrumentError, InstrumentResult, ResistiveHeater, VoltageSource};
use uom::si::electric_potential::volt;

#[derive(Default)]
struct LastLevel {
    volts: Option<f64>,
}

impl VoltageSource for LastLevel {
    fn set_voltage(&mut self, level: Voltage) -> InstrumentResult<()> {
        self.volts = Some(level.get::<volt>());
        Ok(())
    }

    fn set_output(&mut self, _on: bool) -> InstrumentResult<()> {
        Ok(())
    }
}

proptest! {
    #[test]
    fn commanded_level_dissipates_requested_power(
        watts in 0.0f64..5.0,
        ohms in 1.0f64..1_000.0,
    ) {
        let mut heater = ResistiveHeater::new(LastLevel::default(), ohms).unwrap();
        heater.set_power(watts).unwrap();
        let v = heater.source().volts.unwrap();
        let tol = Tolerances { abs: 1e-12, rel: 1e-9 };
        prop_assert!(nearly_equal(v * v / ohms, watts, tol));
    }

    #[test]
    fn negative_power_never_reaches_the_source(watts in -5.0f64..-1e-9) {
        let mut heater = ResistiveHeater::new(LastLevel::default(), 90.0).unwrap();
        let is_invalid = matches!(
            heater.set_power(watts),
            Err(InstrumentError::InvalidCommand { .. })
        );
        prop_assert!(is_invalid);
        prop_assert!(heater.source().volts.is_none());
    }
}

#[test]
fn nan_power_is_rejected() {
    let mut heater = ResistiveHeater::new(LastLevel::default(), 90.0).unwrap();
    assert!(heater.set_power(f64::NAN).is_err());
    assert!(ResistiveHeater::new(LastLevel::default(), 0.0).is_err());
}
