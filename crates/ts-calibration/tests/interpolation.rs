//! Property checks over the built-in calibration tables.

use proptest::prelude::*;
use ts_calibration::{diode_voltage_to_kelvin, platinum_ohms_to_kelvin};

proptest! {
    #[test]
    fn diode_temperature_falls_as_voltage_rises(a in 0.05_f64..1.7, b in 0.05_f64..1.7) {
        let table = diode_voltage_to_kelvin().unwrap();
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        prop_assert!(table.interpolate(lo).unwrap() >= table.interpolate(hi).unwrap());
    }

    #[test]
    fn platinum_lookup_stays_inside_table(ohms in 0.0_f64..400.0) {
        let table = platinum_ohms_to_kelvin().unwrap();
        let t = table.interpolate(ohms).unwrap();
        prop_assert!((73.0..=508.5).contains(&t));
    }

    #[test]
    fn inverse_round_trips_inside_domain(kelvin in 1.4_f64..500.0) {
        let to_kelvin = diode_voltage_to_kelvin().unwrap();
        let to_volts = to_kelvin.inverse().unwrap();
        let v = to_volts.interpolate(kelvin).unwrap();
        let back = to_kelvin.interpolate(v).unwrap();
        prop_assert!((back - kelvin).abs() < 1e-6);
    }
}
