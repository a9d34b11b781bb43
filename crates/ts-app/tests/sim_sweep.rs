//! Full sweeps against the simulated bench on a virtual clock.

use std::rc::Rc;

use ts_app::*;
use ts_core::{Clock, ManualClock};
use ts_results::RunStore;

fn fresh_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(name);
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn config() -> RigConfig {
    let mut config = RigConfig::default();
    config.control.max_ramp_ticks = Some(20_000);
    config
}

#[test]
fn simulated_sweep_writes_checkpoints_and_final_data() {
    let dir = fresh_dir("ts_app_sim_sweep");
    let config = config();
    let clock = Rc::new(ManualClock::new(0.0));
    let SimulatedRig {
        mut rig,
        mut collector,
        bench,
    } = simulated_rig(&config, clock.clone()).unwrap();
    let mut store = RunStore::new(dir.clone()).unwrap();

    collector.prepare(&*clock).unwrap();
    assert_eq!(bench.lock_in_time_constant(), Some(9));
    assert_eq!(bench.auto_phase_calls(), 1);

    let mut sequencer = Sequencer::for_rig(&config.control, &rig).unwrap();
    let started_s = clock.now_s();
    let summary = sequencer
        .run_sweep(
            &mut rig,
            SetpointRange::new(300.0, 302.0, 1.0).unwrap(),
            &mut collector,
            &mut store,
        )
        .unwrap();

    assert_eq!(summary.results.len(), 3);
    assert_eq!(store.partial_indices().unwrap(), vec![1, 2, 3]);
    assert_eq!(store.load_final().unwrap(), summary.results);
    let manifest = store.load_manifest().unwrap();
    assert!(manifest.complete);
    assert_eq!(manifest.setpoints_recorded, 3);

    for (result, setpoint) in summary.results.iter().zip([300.0, 301.0, 302.0]) {
        assert_eq!(result.setpoint_k, setpoint);
        assert_eq!(result.temperatures_k.len(), 5);
        assert_eq!(result.points.len(), 4);
        assert!(result.held_power_w > 0.0 && result.held_power_w <= 0.4);
        for point in &result.points {
            let expected = point.drive_voltage_rms_v / 98.8;
            assert!((point.drive_current_rms_a - expected).abs() < 1e-15);
        }
    }
    let frequencies: Vec<f64> = summary.results[0]
        .points
        .iter()
        .map(|p| p.frequency_hz)
        .collect();
    assert_eq!(frequencies, vec![1_000.0, 2_000.0, 4_000.0, 8_000.0]);

    // Generator restored and heater off once the sweep is over.
    assert_eq!(bench.waveform().unwrap().frequency_hz, 2_000.0);
    assert!(!bench.heater_output_on());
    assert_eq!(bench.heater_power_w(), 0.0);
    // Timed by the same clock the rig was built with.
    assert!(summary.elapsed_s > 0.0);
    assert_eq!(summary.elapsed_s, clock.now_s() - started_s);
}

#[test]
fn stop_before_start_leaves_no_final_data() {
    let dir = fresh_dir("ts_app_sim_cancel");
    let config = config();
    let clock = Rc::new(ManualClock::new(0.0));
    let SimulatedRig {
        mut rig,
        mut collector,
        bench,
    } = simulated_rig(&config, clock.clone()).unwrap();
    let mut store = RunStore::new(dir).unwrap();

    let stop = StopFlag::new();
    stop.request_stop();
    let mut sequencer = Sequencer::for_rig(&config.control, &rig)
        .unwrap()
        .with_stop_flag(stop);
    let outcome = sequencer.run_sweep(
        &mut rig,
        SetpointRange::new(300.0, 302.0, 1.0).unwrap(),
        &mut collector,
        &mut store,
    );

    assert!(matches!(outcome, Err(AppError::Cancelled)));
    assert_eq!(sequencer.stage(), Stage::Preheat);
    assert!(!store.final_path().exists());
    assert!(store.partial_indices().unwrap().is_empty());
    assert!(!bench.heater_output_on());
}

#[test]
fn tuning_run_holds_near_each_target() {
    let mut config = config();
    config.simulation.noise_k = 0.0;
    let clock = Rc::new(ManualClock::new(0.0));
    let SimulatedRig { mut rig, bench, .. } = simulated_rig(&config, clock.clone()).unwrap();

    let mut sequencer = Sequencer::for_rig(&config.tuning_control(), &rig).unwrap();
    let observations = sequencer
        .run_tuning(&mut rig, [296.0, 297.0], &config.tuning)
        .unwrap();

    assert_eq!(observations.len(), 2);
    for observation in &observations {
        assert_eq!(observation.temperatures_k.len(), 10);
        assert!(observation.held_power_w >= 0.0);
    }
    assert!(!bench.heater_output_on());
}
