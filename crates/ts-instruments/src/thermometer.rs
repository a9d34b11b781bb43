//! Thermometers built from a multimeter and a calibration table.

use crate::error::{InstrumentError, InstrumentResult};
use crate::traits::{Multimeter, Thermometer};
use ts_calibration::{CalibrationTable, SensorKind};

/// Reads the raw sensor quantity on a multimeter and converts it to kelvin.
///
/// A diode is read as DC volts, a platinum RTD as four-wire ohms.
pub struct CalibratedThermometer<M> {
    meter: M,
    kind: SensorKind,
    table: CalibrationTable,
}

impl<M: Multimeter> CalibratedThermometer<M> {
    pub fn new(meter: M, kind: SensorKind) -> InstrumentResult<Self> {
        Ok(Self {
            meter,
            kind,
            table: kind.table()?,
        })
    }

    /// Use a custom table instead of the built-in one for `kind`.
    pub fn with_table(meter: M, kind: SensorKind, table: CalibrationTable) -> Self {
        Self { meter, kind, table }
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Last raw reading without conversion.
    pub fn raw(&mut self) -> InstrumentResult<f64> {
        let value = match self.kind {
            SensorKind::Diode => self.meter.measure_voltage_dc()?,
            SensorKind::PlatinumRtd => self.meter.measure_resistance()?,
        };
        if !value.is_finite() {
            return Err(InstrumentError::BadReading {
                instrument: "thermometer multimeter",
                value,
            });
        }
        Ok(value)
    }

    pub fn into_inner(self) -> M {
        self.meter
    }
}

impl<M: Multimeter> Thermometer for CalibratedThermometer<M> {
    fn temperature(&mut self) -> InstrumentResult<f64> {
        let raw = self.raw()?;
        Ok(self.table.interpolate(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMeter {
        volts: f64,
        ohms: f64,
    }

    impl Multimeter for FixedMeter {
        fn measure_voltage_dc(&mut self) -> InstrumentResult<f64> {
            Ok(self.volts)
        }

        fn measure_voltage_ac(&mut self) -> InstrumentResult<f64> {
            Ok(0.0)
        }

        fn measure_resistance(&mut self) -> InstrumentResult<f64> {
            Ok(self.ohms)
        }
    }

    #[test]
    fn diode_reads_dc_voltage() {
        let meter = FixedMeter {
            volts: 0.559639,
            ohms: f64::NAN,
        };
        let mut therm = CalibratedThermometer::new(meter, SensorKind::Diode).unwrap();
        assert_eq!(therm.temperature().unwrap(), 300.0);
    }

    #[test]
    fn rtd_reads_resistance() {
        let meter = FixedMeter {
            volts: f64::NAN,
            ohms: 100.0,
        };
        let mut therm = CalibratedThermometer::new(meter, SensorKind::PlatinumRtd).unwrap();
        assert!((therm.temperature().unwrap() - 273.15).abs() < 1e-9);
    }

    #[test]
    fn non_finite_raw_reading_is_rejected() {
        let meter = FixedMeter {
            volts: f64::NAN,
            ohms: 100.0,
        };
        let mut therm = CalibratedThermometer::new(meter, SensorKind::Diode).unwrap();
        assert!(matches!(
            therm.temperature(),
            Err(InstrumentError::BadReading { .. })
        ));
    }
}
