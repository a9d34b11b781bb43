//! Stage sequencer: drives the heater through RAMP, SETTLE, AVERAGE and
//! HOLD for every setpoint of a sweep.
//!
//! Every closed-loop tick reads the thermometer once, updates the PID,
//! clamps the output to `[0, max_power_w]`, commands the heater, and sleeps
//! one control period on the shared clock. The heater is held through a
//! [`HeaterGuard`] for the whole sequence, so any error return or panic
//! leaves it switched off.

use std::rc::Rc;
use tracing::{debug, info, warn};
use ts_controls::{ControlPeriod, PidController, clamp_power};
use ts_core::{Clock, mean};
use ts_instruments::{HeaterGuard, Thermometer};
use ts_results::{ResultSink, RunManifest, StageResult};

use crate::config::{ControlConfig, TuningConfig};
use crate::error::{AppError, AppResult};
use crate::measurement::MeasurementCollector;
use crate::progress::{SequenceEvent, TickProgress};
use crate::rig::Rig;
use crate::setpoints::SetpointRange;
use crate::stage::Stage;
use crate::stop::StopFlag;

/// Outcome of a completed sweep.
#[derive(Debug, Clone)]
pub struct SweepSummary {
    /// One entry per setpoint, in setpoint order.
    pub results: Vec<StageResult>,
    pub manifest: RunManifest,
    /// Clock time the sweep took, s.
    pub elapsed_s: f64,
}

/// What a tuning run saw while holding one target open loop.
#[derive(Debug, Clone, PartialEq)]
pub struct HoldObservation {
    pub target_k: f64,
    pub held_power_w: f64,
    pub ramp_ticks: usize,
    pub temperatures_k: Vec<f64>,
}

impl HoldObservation {
    pub fn mean_temperature_k(&self) -> Option<f64> {
        mean(&self.temperatures_k)
    }

    /// Largest deviation from the target seen during the hold, K.
    pub fn max_deviation_k(&self) -> f64 {
        self.temperatures_k
            .iter()
            .map(|t| (t - self.target_k).abs())
            .fold(0.0, f64::max)
    }
}

/// Result of one closed-loop tick.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tick {
    measured_k: f64,
    power_w: f64,
}

pub struct Sequencer<'p> {
    config: ControlConfig,
    period: ControlPeriod,
    pid: PidController<Rc<dyn Clock>>,
    clock: Rc<dyn Clock>,
    stop: Option<StopFlag>,
    progress: Option<&'p mut dyn FnMut(SequenceEvent)>,
    stage: Stage,
    target_k: Option<f64>,
    setpoint_index: Option<usize>,
    started_s: f64,
}

impl<'p> Sequencer<'p> {
    /// # Errors
    ///
    /// Returns an error if `config` does not validate.
    pub fn new(config: &ControlConfig, clock: Rc<dyn Clock>) -> AppResult<Self> {
        config.validate()?;
        let period = config.period()?;
        let pid = PidController::new(config.gains, clock.clone()).with_period(period);
        let started_s = clock.now_s();
        Ok(Self {
            config: config.clone(),
            period,
            pid,
            clock,
            stop: None,
            progress: None,
            stage: Stage::Idle,
            target_k: None,
            setpoint_index: None,
            started_s,
        })
    }

    /// Sequencer timed by the rig's own clock.
    pub fn for_rig(config: &ControlConfig, rig: &Rig) -> AppResult<Self> {
        Self::new(config, rig.clock.clone())
    }

    /// Abort with [`AppError::Cancelled`] at the next tick once `stop` is set.
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_progress(mut self, progress: &'p mut dyn FnMut(SequenceEvent)) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn controller(&self) -> &PidController<Rc<dyn Clock>> {
        &self.pid
    }

    pub fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Full sweep: pre-heat to the first setpoint, then stabilize, hold and
    /// measure every setpoint, checkpointing after each one.
    ///
    /// `sink.save_partial` is called with the results so far after every
    /// setpoint (index from 1), `save_final` and `record_manifest` once at
    /// the end. The heater is off when this returns, on every path.
    pub fn run_sweep(
        &mut self,
        rig: &mut Rig,
        setpoints: SetpointRange,
        collector: &mut dyn MeasurementCollector,
        sink: &mut dyn ResultSink,
    ) -> AppResult<SweepSummary> {
        self.started_s = self.clock.now_s();
        let mut manifest = RunManifest::begin(setpoints.start(), setpoints.end(), setpoints.step());
        info!(
            run_id = %manifest.run_id,
            start_k = setpoints.start(),
            end_k = setpoints.end(),
            step_k = setpoints.step(),
            "sweep started"
        );

        let thermometer: &mut dyn Thermometer = rig.thermometer.as_mut();
        let mut heater = HeaterGuard::engage(rig.heater.as_mut())?;

        self.pid.soft_reset();
        self.preheat(thermometer, &mut heater, setpoints.start())?;
        self.pid.soft_reset();

        let mut results = Vec::new();
        for (offset, target_k) in setpoints.enumerate() {
            let index = offset + 1;
            self.setpoint_index = Some(index);
            let held_power_w = self.stabilize(thermometer, &mut heater, target_k)?;
            let result = self.hold(thermometer, &mut heater, collector, target_k, held_power_w)?;
            results.push(result);
            sink.save_partial(&results, index)?;
            info!(index, target_k, held_power_w, "measurement taken");
        }

        sink.save_final(&results)?;
        manifest.finish(results.len());
        sink.record_manifest(&manifest)?;
        heater.release()?;

        let elapsed_s = self.elapsed_s();
        self.finish();
        info!(setpoints = results.len(), elapsed_s, "sweep finished");
        Ok(SweepSummary {
            results,
            manifest,
            elapsed_s,
        })
    }

    /// Stabilize each target without pre-heat or instrument sweep, then
    /// watch the temperature under the held power.
    pub fn run_tuning(
        &mut self,
        rig: &mut Rig,
        targets: impl IntoIterator<Item = f64>,
        tuning: &TuningConfig,
    ) -> AppResult<Vec<HoldObservation>> {
        self.started_s = self.clock.now_s();
        let thermometer: &mut dyn Thermometer = rig.thermometer.as_mut();
        let mut heater = HeaterGuard::engage(rig.heater.as_mut())?;
        self.pid.soft_reset();

        let mut observations = Vec::new();
        for (offset, target_k) in targets.into_iter().enumerate() {
            self.setpoint_index = Some(offset + 1);
            self.pid.time_reset();
            let ramp_ticks = self.ramp(thermometer, &mut heater, target_k)?;
            self.settle(thermometer, &mut heater, target_k)?;
            let held_power_w = self.average(thermometer, &mut heater, target_k)?;

            self.enter(Stage::Hold, Some(target_k));
            heater.set_power(held_power_w)?;
            let mut temperatures_k = Vec::with_capacity(tuning.observe_samples);
            for _ in 0..tuning.observe_samples {
                self.check_stop()?;
                let measured_k = thermometer.temperature()?;
                debug!(measured_k, "hold observation");
                temperatures_k.push(measured_k);
                self.clock.sleep(tuning.observe_interval());
            }
            observations.push(HoldObservation {
                target_k,
                held_power_w,
                ramp_ticks,
                temperatures_k,
            });
        }

        heater.release()?;
        self.finish();
        Ok(observations)
    }

    /// Closed loop toward `start_k` until the reading is within the
    /// pre-heat tolerance. Returns the number of ticks taken.
    pub fn preheat(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        start_k: f64,
    ) -> AppResult<usize> {
        self.enter(Stage::Preheat, Some(start_k));
        let tolerance = self.config.preheat_tolerance_k;
        let mut measured_k = thermometer.temperature()?;
        let mut ticks = 0;
        while (measured_k - start_k).abs() > tolerance {
            self.check_tick_limit(Stage::Preheat, start_k, ticks)?;
            ticks += 1;
            measured_k = self.tick(thermometer, heater, start_k, ticks)?.measured_k;
        }
        info!(ticks, measured_k, "finished preheating");
        Ok(ticks)
    }

    /// RAMP, SETTLE and AVERAGE for one setpoint. Returns the held power.
    ///
    /// The controller clock is rebased first so time spent holding the
    /// previous setpoint does not show up as one huge `dt`.
    pub fn stabilize(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        target_k: f64,
    ) -> AppResult<f64> {
        self.pid.time_reset();
        self.ramp(thermometer, heater, target_k)?;
        self.settle(thermometer, heater, target_k)?;
        self.average(thermometer, heater, target_k)
    }

    /// Closed loop until a reading is at or above `target_k`.
    ///
    /// Returns the number of ticks taken; zero when already there.
    pub fn ramp(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        target_k: f64,
    ) -> AppResult<usize> {
        self.enter(Stage::Ramp, Some(target_k));
        let mut measured_k = thermometer.temperature()?;
        let mut ticks = 0;
        while measured_k < target_k {
            self.check_tick_limit(Stage::Ramp, target_k, ticks)?;
            ticks += 1;
            measured_k = self.tick(thermometer, heater, target_k, ticks)?.measured_k;
        }
        debug!(ticks, measured_k, target_k, "ramp reached target");
        Ok(ticks)
    }

    /// Exactly `settle_ticks` closed-loop ticks, whatever the readings.
    pub fn settle(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        target_k: f64,
    ) -> AppResult<()> {
        self.enter(Stage::Settle, Some(target_k));
        for tick in 1..=self.config.settle_ticks {
            self.tick(thermometer, heater, target_k, tick)?;
        }
        Ok(())
    }

    /// Exactly `average_ticks` closed-loop ticks. Returns the mean of the
    /// clamped power commands.
    pub fn average(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        target_k: f64,
    ) -> AppResult<f64> {
        self.enter(Stage::Average, Some(target_k));
        let mut powers_w = Vec::with_capacity(self.config.average_ticks);
        for tick in 1..=self.config.average_ticks {
            powers_w.push(self.tick(thermometer, heater, target_k, tick)?.power_w);
        }
        // average_ticks >= 1 is checked by ControlConfig::validate.
        let held_power_w = mean(&powers_w).unwrap_or(0.0);
        debug!(held_power_w, "averaged heater power");
        Ok(held_power_w)
    }

    /// Park the heater at `held_power_w` open loop and run the collector.
    pub fn hold(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        collector: &mut dyn MeasurementCollector,
        target_k: f64,
        held_power_w: f64,
    ) -> AppResult<StageResult> {
        self.enter(Stage::Hold, Some(target_k));
        self.check_stop()?;
        heater.set_power(held_power_w)?;
        let mut result = collector.collect(thermometer, &*self.clock)?;
        result.setpoint_k = target_k;
        result.held_power_w = held_power_w;
        Ok(result)
    }

    fn tick(
        &mut self,
        thermometer: &mut dyn Thermometer,
        heater: &mut HeaterGuard<'_>,
        target_k: f64,
        tick: usize,
    ) -> AppResult<Tick> {
        self.check_stop()?;
        let measured_k = thermometer.temperature()?;
        let raw_output_w = self.pid.update(measured_k, target_k);
        let power_w = clamp_power(raw_output_w, self.config.max_power_w);
        heater.set_power(power_w)?;
        debug!(
            stage = %self.stage,
            tick,
            measured_k,
            raw_output_w,
            power_w,
            "control tick"
        );

        if self.progress.is_some() {
            let mut event = self.event();
            event.tick = Some(TickProgress {
                tick,
                measured_k,
                raw_output_w,
                power_w,
            });
            self.emit(event);
        }

        self.clock.sleep(self.period.as_duration());
        Ok(Tick {
            measured_k,
            power_w,
        })
    }

    fn check_stop(&self) -> AppResult<()> {
        match &self.stop {
            Some(stop) if stop.is_stop_requested() => {
                warn!(stage = %self.stage, "stop requested, aborting sequence");
                Err(AppError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    fn check_tick_limit(&self, stage: Stage, target_k: f64, ticks: usize) -> AppResult<()> {
        match self.config.max_ramp_ticks {
            Some(limit) if ticks >= limit => {
                warn!(%stage, target_k, ticks, "giving up on unreachable target");
                Err(AppError::NotConverged {
                    stage,
                    target_k,
                    ticks,
                })
            }
            _ => Ok(()),
        }
    }

    fn enter(&mut self, stage: Stage, target_k: Option<f64>) {
        self.stage = stage;
        self.target_k = target_k;
        match target_k {
            Some(target_k) => info!(%stage, target_k, "entering stage"),
            None => info!(%stage, "entering stage"),
        }
        let event = self.event();
        self.emit(event);
    }

    fn finish(&mut self) {
        self.setpoint_index = None;
        self.enter(Stage::Done, None);
    }

    fn elapsed_s(&self) -> f64 {
        self.clock.now_s() - self.started_s
    }

    fn event(&self) -> SequenceEvent {
        SequenceEvent {
            stage: self.stage,
            target_k: self.target_k,
            setpoint_index: self.setpoint_index,
            elapsed_s: self.elapsed_s(),
            tick: None,
        }
    }

    fn emit(&mut self, event: SequenceEvent) {
        if let Some(cb) = self.progress.as_deref_mut() {
            cb(event);
        }
    }
}
