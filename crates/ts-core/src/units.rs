// ts-core/src/units.rs

use uom::si::f64::{
    ElectricCurrent as UomElectricCurrent, ElectricPotential as UomElectricPotential,
    ElectricalResistance as UomElectricalResistance, Frequency as UomFrequency,
    Power as UomPower, ThermodynamicTemperature as UomThermodynamicTemperature, Time as UomTime,
};

// Public canonical unit types (SI, f64)
pub type Current = UomElectricCurrent;
pub type Voltage = UomElectricPotential;
pub type Resistance = UomElectricalResistance;
pub type Frequency = UomFrequency;
pub type Power = UomPower;
pub type Temperature = UomThermodynamicTemperature;
pub type Time = UomTime;

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

#[inline]
pub fn w(v: f64) -> Power {
    use uom::si::power::watt;
    Power::new::<watt>(v)
}

#[inline]
pub fn volts(v: f64) -> Voltage {
    use uom::si::electric_potential::volt;
    Voltage::new::<volt>(v)
}

#[inline]
pub fn ohms(v: f64) -> Resistance {
    use uom::si::electrical_resistance::ohm;
    Resistance::new::<ohm>(v)
}

#[inline]
pub fn amps(v: f64) -> Current {
    use uom::si::electric_current::ampere;
    Current::new::<ampere>(v)
}

#[inline]
pub fn hz(v: f64) -> Frequency {
    use uom::si::frequency::hertz;
    Frequency::new::<hertz>(v)
}

#[inline]
pub fn s(v: f64) -> Time {
    use uom::si::time::second;
    Time::new::<second>(v)
}

/// Drive voltage that dissipates `power` in `load`: `V = sqrt(P * R)`.
pub fn voltage_for_power(power: Power, load: Resistance) -> Voltage {
    use uom::si::electrical_resistance::ohm;
    use uom::si::power::watt;
    volts((power.get::<watt>() * load.get::<ohm>()).sqrt())
}

/// Power dissipated by `voltage` across `load`: `P = V^2 / R`.
pub fn power_for_voltage(voltage: Voltage, load: Resistance) -> Power {
    use uom::si::electric_potential::volt;
    use uom::si::electrical_resistance::ohm;
    let v = voltage.get::<volt>();
    w(v * v / load.get::<ohm>())
}

/// Ohm's law current through a sense resistor.
pub fn current_through(voltage: Voltage, load: Resistance) -> Current {
    use uom::si::electric_potential::volt;
    use uom::si::electrical_resistance::ohm;
    amps(voltage.get::<volt>() / load.get::<ohm>())
}

pub mod constants {
    /// Offset between Celsius and Kelvin scales.
    pub const ZERO_CELSIUS_K: f64 = 273.15;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::electric_current::ampere;
    use uom::si::electric_potential::volt;
    use uom::si::power::watt;

    #[test]
    fn constructors_smoke() {
        let _t = k(300.0);
        let _p = w(0.4);
        let _v = volts(6.0);
        let _r = ohms(90.0);
        let _i = amps(0.01);
        let _f = hz(2_000.0);
        let _dt = s(0.5);
    }

    #[test]
    fn power_voltage_conversion_round_trips() {
        let v = voltage_for_power(w(0.4), ohms(90.0));
        assert!((v.get::<volt>() - 6.0).abs() < 1e-12);
        let p = power_for_voltage(v, ohms(90.0));
        assert!((p.get::<watt>() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn drive_current_from_sense_voltage() {
        let i = current_through(volts(0.988), ohms(98.8));
        assert!((i.get::<ampere>() - 0.01).abs() < 1e-12);
    }
}
