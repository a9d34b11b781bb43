//! Built-in calibration tables for the rig's thermometers.

use crate::{CalibrationResult, CalibrationTable};
use serde::{Deserialize, Serialize};
use ts_core::units::constants::ZERO_CELSIUS_K;

/// Silicon diode forward voltage (V) at 10 µA excitation, falling with temperature.
const DIODE_VOLTS: [f64; 144] = [
    1.644290, 1.642990, 1.641570, 1.640030, 1.638370, 1.636600, 1.634720, 1.632740,
    1.630670, 1.628520, 1.626290, 1.624000, 1.621660, 1.619280, 1.616870, 1.614450,
    1.612000, 1.609510, 1.606970, 1.604380, 1.601730, 1.599020, 1.596260, 1.59344,
    1.59057, 1.58764, 1.58465, 1.57848, 1.57202, 1.56533, 1.55845, 1.55145,
    1.54436, 1.53721, 1.53000, 1.52273, 1.51541, 1.49698, 1.47868, 1.46086,
    1.44374, 1.42747, 1.41207, 1.39751, 1.38373, 1.37065, 1.35820, 1.34632,
    1.33499, 1.32416, 1.31381, 1.30390, 1.29439, 1.28526, 1.27645, 1.26794,
    1.25967, 1.25161, 1.24372, 1.23596, 1.22830, 1.22070, 1.21311, 1.20548,
    1.197748, 1.181548, 1.162797, 1.140817, 1.125923, 1.119448, 1.115658, 1.112810,
    1.110421, 1.108261, 1.106244, 1.104324, 1.102476, 1.100681, 1.098930, 1.097216,
    1.095534, 1.093878, 1.092244, 1.090627, 1.089024, 1.085842, 1.082669, 1.079492,
    1.076303, 1.073099, 1.069881, 1.066650, 1.063403, 1.060141, 1.056862, 1.048584,
    1.040183, 1.031651, 1.027594, 1.022984, 1.014181, 1.005244, 0.986974, 0.968209,
    0.949000, 0.929390, 0.909416, 0.889114, 0.868518, 0.847659, 0.826560, 0.805242,
    0.783720, 0.762007, 0.740115, 0.718054, 0.695834, 0.673462, 0.650949, 0.628302,
    0.621141, 0.605528, 0.582637, 0.559639, 0.536542, 0.513361, 0.490106, 0.466760,
    0.443371, 0.419960, 0.396503, 0.373002, 0.349453, 0.325839, 0.302161, 0.278416,
    0.254592, 0.230697, 0.206758, 0.182832, 0.159010, 0.135480, 0.112553, 0.090681,
];

/// Temperatures (K) matching `DIODE_VOLTS`.
const DIODE_KELVIN: [f64; 144] = [
    1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 2.1,
    2.2, 2.3, 2.4, 2.5, 2.6, 2.7, 2.8, 2.9,
    3.0, 3.1, 3.2, 3.3, 3.4, 3.5, 3.6, 3.7,
    3.8, 3.9, 4.0, 4.2, 4.4, 4.6, 4.8, 5.0,
    5.2, 5.4, 5.6, 5.8, 6.0, 6.5, 7.0, 7.5,
    8.0, 8.5, 9.0, 9.5, 10.0, 10.5, 11.0, 11.5,
    12.0, 12.5, 13.0, 13.5, 14.0, 14.5, 15.0, 15.5,
    16.0, 16.5, 17.0, 17.5, 18.0, 18.5, 19.0, 19.5,
    20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0,
    28.0, 29.0, 30.0, 31.0, 32.0, 33.0, 34.0, 35.0,
    36.0, 37.0, 38.0, 39.0, 40.0, 42.0, 44.0, 46.0,
    48.0, 50.0, 52.0, 54.0, 56.0, 58.0, 60.0, 65.0,
    70.0, 75.0, 77.35, 80.0, 85.0, 90.0, 100.0, 110.0,
    120.0, 130.0, 140.0, 150.0, 160.0, 170.0, 180.0, 190.0,
    200.0, 210.0, 220.0, 230.0, 240.0, 250.0, 260.0, 270.0,
    273.0, 280.0, 290.0, 300.0, 310.0, 320.0, 330.0, 340.0,
    350.0, 360.0, 370.0, 380.0, 390.0, 400.0, 410.0, 420.0,
    430.0, 440.0, 450.0, 460.0, 470.0, 480.0, 490.0, 500.0,
];

/// Platinum RTD calibration points, degrees Celsius.
const PLATINUM_CELSIUS: [f64; 88] = [
    -200.0, -195.0, -190.0, -185.0, -180.0, -175.0, -170.0, -165.0,
    -160.0, -155.0, -150.0, -145.0, -140.0, -135.0, -130.0, -125.0,
    -120.0, -115.0, -110.0, -105.0, -100.0, -95.0, -90.0, -85.0,
    -80.0, -75.0, -70.0, -65.0, -60.0, -55.0, -50.0, -45.0,
    -40.0, -35.0, -30.0, -25.0, -20.0, -15.0, -10.0, -5.0,
    0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0,
    40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0,
    80.0, 85.0, 90.0, 95.0, 100.0, 105.0, 110.0, 115.0,
    120.0, 125.0, 130.0, 135.0, 140.0, 145.0, 150.0, 155.0,
    160.0, 165.0, 170.0, 175.0, 180.0, 185.0, 190.0, 195.0,
    200.0, 205.0, 210.0, 215.0, 220.0, 225.0, 230.0, 235.0,
];

/// Platinum RTD resistance (Ω) matching `PLATINUM_CELSIUS`.
const PLATINUM_OHMS: [f64; 88] = [
    18.52, 20.68, 22.83, 24.97, 27.10, 29.22, 31.33, 33.44,
    35.54, 37.64, 39.72, 41.80, 43.88, 45.94, 48.00, 50.06,
    52.11, 54.15, 56.19, 58.23, 60.26, 62.28, 64.30, 66.31,
    68.33, 70.33, 72.33, 74.33, 76.33, 78.32, 80.31, 82.29,
    84.27, 86.25, 88.22, 90.19, 92.16, 94.12, 96.09, 98.04,
    100.00, 101.95, 103.90, 105.85, 107.79, 109.73, 111.67, 113.61,
    115.54, 117.47, 119.40, 121.32, 123.24, 125.16, 127.08, 128.99,
    130.90, 132.80, 134.71, 136.61, 138.51, 140.40, 142.29, 144.18,
    146.07, 147.95, 149.83, 151.71, 153.58, 155.46, 157.33, 159.19,
    161.05, 162.91, 164.77, 166.63, 168.48, 170.33, 172.17, 174.02,
    175.86, 177.69, 179.53, 181.36, 183.19, 185.01, 186.84, 188.66,
];

/// Copper resistivity points, K.
const COPPER_KELVIN: [f64; 11] = [
    4.0, 10.0, 20.0, 50.0, 77.0, 100.0, 150.0, 200.0, 250.0, 295.0, 400.0,
];

/// Copper resistivity matching `COPPER_KELVIN`, 1e-8 Ω·m.
const COPPER_RESISTIVITY: [f64; 11] = [
    0.015, 0.015, 0.017, 0.084, 0.21, 0.34, 0.70, 1.07, 1.41, 1.70, 2.38,
];

const NICHROME_KELVIN: [f64; 2] = [4.0, 298.0];

/// 1e-8 Ω·m.
const NICHROME_RESISTIVITY: [f64; 2] = [105.0, 110.0];

/// Tables above are in units of 1e-8 Ω·m.
const RESISTIVITY_SCALE: f64 = 1e-8;

/// Thermometer types the rig knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Silicon diode read as a DC voltage.
    #[default]
    Diode,
    /// Platinum RTD read as a four-wire resistance.
    PlatinumRtd,
}

impl SensorKind {
    /// Table mapping this sensor's raw reading to kelvin.
    pub fn table(self) -> CalibrationResult<CalibrationTable> {
        match self {
            SensorKind::Diode => diode_voltage_to_kelvin(),
            SensorKind::PlatinumRtd => platinum_ohms_to_kelvin(),
        }
    }

    pub fn raw_unit(self) -> &'static str {
        match self {
            SensorKind::Diode => "V",
            SensorKind::PlatinumRtd => "Ω",
        }
    }
}

/// Wire materials with tabulated resistivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conductor {
    Copper,
    Nichrome,
}

impl Conductor {
    /// Table mapping temperature (K) to resistivity (Ω·m).
    pub fn resistivity_table(self) -> CalibrationResult<CalibrationTable> {
        let (kelvin, rho): (&[f64], &[f64]) = match self {
            Conductor::Copper => (&COPPER_KELVIN, &COPPER_RESISTIVITY),
            Conductor::Nichrome => (&NICHROME_KELVIN, &NICHROME_RESISTIVITY),
        };
        CalibrationTable::new(
            kelvin.to_vec(),
            rho.iter().map(|r| r * RESISTIVITY_SCALE).collect(),
        )
    }

    /// Resistivity at `kelvin`, Ω·m. Clamps to the tabulated range.
    pub fn resistivity_ohm_m(self, kelvin: f64) -> CalibrationResult<f64> {
        self.resistivity_table()?.interpolate(kelvin)
    }
}

/// Diode voltage (V) to temperature (K).
pub fn diode_voltage_to_kelvin() -> CalibrationResult<CalibrationTable> {
    CalibrationTable::new(DIODE_VOLTS.to_vec(), DIODE_KELVIN.to_vec())
}

/// Platinum RTD resistance (Ω) to temperature (K).
pub fn platinum_ohms_to_kelvin() -> CalibrationResult<CalibrationTable> {
    let kelvin = PLATINUM_CELSIUS
        .iter()
        .map(|c| c + ZERO_CELSIUS_K)
        .collect();
    CalibrationTable::new(PLATINUM_OHMS.to_vec(), kelvin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_are_valid() {
        assert_eq!(diode_voltage_to_kelvin().unwrap().len(), 144);
        assert_eq!(platinum_ohms_to_kelvin().unwrap().len(), 88);
    }

    #[test]
    fn diode_reference_points() {
        let table = diode_voltage_to_kelvin().unwrap();
        assert_eq!(table.interpolate(1.644290).unwrap(), 1.4);
        assert_eq!(table.interpolate(0.090681).unwrap(), 500.0);
        assert_eq!(table.interpolate(0.559639).unwrap(), 300.0);
    }

    #[test]
    fn platinum_ice_point() {
        let table = platinum_ohms_to_kelvin().unwrap();
        let t = table.interpolate(100.0).unwrap();
        assert!((t - 273.15).abs() < 1e-9);
    }

    #[test]
    fn copper_resistivity_points() {
        let rho = Conductor::Copper.resistivity_ohm_m(295.0).unwrap();
        assert!((rho - 1.70e-8).abs() < 1e-20);
        // Flat below 10 K, clamped past the table.
        assert_eq!(
            Conductor::Copper.resistivity_ohm_m(7.0).unwrap(),
            Conductor::Copper.resistivity_ohm_m(4.0).unwrap()
        );
        assert_eq!(
            Conductor::Copper.resistivity_ohm_m(1_000.0).unwrap(),
            Conductor::Copper.resistivity_ohm_m(400.0).unwrap()
        );
    }

    #[test]
    fn nichrome_is_nearly_flat() {
        let cold = Conductor::Nichrome.resistivity_ohm_m(4.0).unwrap();
        let warm = Conductor::Nichrome.resistivity_ohm_m(298.0).unwrap();
        let mid = Conductor::Nichrome.resistivity_ohm_m(151.0).unwrap();
        assert!((cold - 105e-8).abs() < 1e-20);
        assert!((warm - 110e-8).abs() < 1e-20);
        assert!((mid - 107.5e-8).abs() < 1e-18);
    }

    #[test]
    fn copper_table_cannot_be_inverted() {
        // Equal resistivity at 4 K and 10 K.
        assert!(Conductor::Copper.resistivity_table().unwrap().inverse().is_err());
    }

    #[test]
    fn sensor_kind_selects_table() {
        let diode = SensorKind::Diode.table().unwrap();
        let rtd = SensorKind::PlatinumRtd.table().unwrap();
        assert_ne!(diode.domain(), rtd.domain());
        assert_eq!(SensorKind::default(), SensorKind::Diode);
    }
}
