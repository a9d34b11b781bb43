//! Measurements taken while a setpoint is held open loop.

use chrono::Utc;
use tracing::{debug, info};
use ts_core::{Clock, current_through, ohms, volts};
use ts_instruments::{FunctionGenerator, LockIn, Multimeter, Thermometer};
use ts_results::{FrequencyPoint, StageResult};
use uom::si::electric_current::ampere;

use crate::config::MeasurementConfig;
use crate::error::AppResult;

/// Runs the data collection for one held setpoint.
///
/// Called synchronously from HOLD with the heater parked at the held
/// power. Implementations leave `setpoint_k` and `held_power_w` at zero;
/// the sequencer fills them in.
pub trait MeasurementCollector {
    fn collect(
        &mut self,
        thermometer: &mut dyn Thermometer,
        clock: &dyn Clock,
    ) -> AppResult<StageResult>;
}

impl<T: MeasurementCollector + ?Sized> MeasurementCollector for &mut T {
    fn collect(
        &mut self,
        thermometer: &mut dyn Thermometer,
        clock: &dyn Clock,
    ) -> AppResult<StageResult> {
        (**self).collect(thermometer, clock)
    }
}

/// Lock-in readings at a list of drive frequencies.
///
/// The sample is driven by a function generator through a sense resistor;
/// a multimeter across the resistor gives the drive current and the lock-in
/// gives the sample response. The stage temperature is read before the
/// first frequency and after each one.
pub struct LockInSweepCollector<G, M, L> {
    generator: G,
    drive_meter: M,
    lock_in: L,
    config: MeasurementConfig,
}

impl<G, M, L> LockInSweepCollector<G, M, L>
where
    G: FunctionGenerator,
    M: Multimeter,
    L: LockIn,
{
    pub fn new(generator: G, drive_meter: M, lock_in: L, config: MeasurementConfig) -> Self {
        Self {
            generator,
            drive_meter,
            lock_in,
            config,
        }
    }

    /// One-time instrument setup before a run.
    ///
    /// Applies the drive waveform, selects the lock-in time constant, then
    /// auto-phases and auto-gains with a settle wait after each.
    pub fn prepare(&mut self, clock: &dyn Clock) -> AppResult<()> {
        self.lock_in.set_time_constant(self.config.lock_in_time_constant)?;
        self.generator.apply(&self.config.waveform())?;

        self.lock_in.auto_phase()?;
        clock.sleep(self.config.setup_settle());
        self.lock_in.auto_gain()?;
        clock.sleep(self.config.setup_settle());
        info!(
            frequency_hz = self.config.restore_frequency_hz,
            amplitude_vpp = self.config.amplitude_vpp,
            "measurement instruments prepared"
        );
        Ok(())
    }

    pub fn config(&self) -> &MeasurementConfig {
        &self.config
    }

    pub fn into_parts(self) -> (G, M, L) {
        (self.generator, self.drive_meter, self.lock_in)
    }
}

impl<G, M, L> MeasurementCollector for LockInSweepCollector<G, M, L>
where
    G: FunctionGenerator,
    M: Multimeter,
    L: LockIn,
{
    fn collect(
        &mut self,
        thermometer: &mut dyn Thermometer,
        clock: &dyn Clock,
    ) -> AppResult<StageResult> {
        let mut temperatures_k = Vec::with_capacity(self.config.frequencies_hz.len() + 1);
        let mut points = Vec::with_capacity(self.config.frequencies_hz.len());
        temperatures_k.push(thermometer.temperature()?);

        for &frequency_hz in &self.config.frequencies_hz {
            self.generator.set_frequency(frequency_hz)?;
            let drive_voltage_rms_v = self.drive_meter.measure_voltage_ac()?;
            self.lock_in.auto_gain()?;
            clock.sleep(self.config.lock_in_settle());
            let reading = self.lock_in.read()?;
            temperatures_k.push(thermometer.temperature()?);

            debug!(
                frequency_hz,
                drive_voltage_rms_v,
                magnitude_v = reading.magnitude_v,
                phase_deg = reading.phase_deg,
                "lock-in point"
            );
            points.push(FrequencyPoint {
                frequency_hz,
                drive_voltage_rms_v,
                drive_current_rms_a: current_through(
                    volts(drive_voltage_rms_v),
                    ohms(self.config.drive_resistor_ohm),
                )
                .get::<ampere>(),
                magnitude_v: reading.magnitude_v,
                phase_deg: reading.phase_deg,
            });
        }

        self.generator.set_frequency(self.config.restore_frequency_hz)?;
        info!(?temperatures_k, "recorded temperature range");

        Ok(StageResult {
            setpoint_k: 0.0,
            held_power_w: 0.0,
            temperatures_k,
            points,
            recorded_at: Utc::now(),
        })
    }
}
