use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use ts_app::{
    AppError, AppResult, RigConfig, SequenceEvent, Sequencer, SetpointRange, Stage, StopFlag,
    SimulatedRig, load_config, save_config, simulated_rig,
};
use ts_calibration::{Conductor, SensorKind};
use ts_core::{Clock, ManualClock, SystemClock};
use ts_results::{RunStore, StageResult};

#[derive(Parser)]
#[command(name = "ts-cli")]
#[command(about = "ThermoSweep CLI - temperature-stabilized lock-in sweeps", long_about = None)]
struct Cli {
    /// Rig configuration YAML (defaults are used when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Run the simulated rig against the wall clock instead of a virtual one
    #[arg(long, global = true)]
    realtime: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stabilize every setpoint from START to END and record lock-in data
    Sweep {
        /// First setpoint, K
        start: f64,
        /// Last setpoint (inclusive), K
        end: f64,
        /// Setpoint spacing, K
        resolution: f64,
        /// Directory for checkpoints and final data
        output_dir: PathBuf,
    },
    /// Stabilize a few targets and watch the held temperature
    Tune {
        /// First target, K
        first: f64,
        /// Last target (inclusive), K
        last: f64,
        /// Target spacing, K
        #[arg(long, default_value_t = 1.0)]
        step: f64,
    },
    /// Print thermometer readings
    Monitor {
        /// Number of readings (runs until interrupted when omitted)
        #[arg(short = 'n', long)]
        samples: Option<usize>,
        /// Seconds between readings
        #[arg(long, default_value_t = 1.0)]
        interval: f64,
    },
    /// Convert a raw sensor reading to kelvin
    Convert {
        /// Diode volts or RTD ohms
        raw: f64,
        #[arg(long, value_enum, default_value_t = SensorArg::Diode)]
        sensor: SensorArg,
    },
    /// Resistivity of a wiring material at a temperature
    Resistivity {
        /// Temperature, K
        kelvin: f64,
        #[arg(long, value_enum, default_value_t = MaterialArg::Copper)]
        material: MaterialArg,
    },
    /// Summarize a sweep output directory
    Show {
        output_dir: PathBuf,
    },
    /// Write the default rig configuration to a file
    InitConfig {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SensorArg {
    Diode,
    Rtd,
}

#[derive(Clone, Copy, ValueEnum)]
enum MaterialArg {
    Copper,
    Nichrome,
}

impl From<MaterialArg> for Conductor {
    fn from(arg: MaterialArg) -> Self {
        match arg {
            MaterialArg::Copper => Conductor::Copper,
            MaterialArg::Nichrome => Conductor::Nichrome,
        }
    }
}

impl From<SensorArg> for SensorKind {
    fn from(arg: SensorArg) -> Self {
        match arg {
            SensorArg::Diode => SensorKind::Diode,
            SensorArg::Rtd => SensorKind::PlatinumRtd,
        }
    }
}

fn main() -> AppResult<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RigConfig::default(),
    };

    match cli.command {
        Commands::Sweep {
            start,
            end,
            resolution,
            output_dir,
        } => cmd_sweep(&config, cli.realtime, start, end, resolution, &output_dir),
        Commands::Tune { first, last, step } => cmd_tune(&config, cli.realtime, first, last, step),
        Commands::Monitor { samples, interval } => {
            cmd_monitor(&config, cli.realtime, samples, interval)
        }
        Commands::Convert { raw, sensor } => cmd_convert(raw, sensor.into()),
        Commands::Resistivity { kelvin, material } => cmd_resistivity(kelvin, material.into()),
        Commands::Show { output_dir } => cmd_show(&output_dir),
        Commands::InitConfig { path } => {
            save_config(&path, &RigConfig::default())?;
            println!("✓ Wrote default config to {}", path.display());
            Ok(())
        }
    }
}

fn make_clock(realtime: bool) -> Rc<dyn Clock> {
    if realtime {
        Rc::new(SystemClock::new())
    } else {
        Rc::new(ManualClock::new(0.0))
    }
}

/// Signal that asked the run to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shutdown {
    Interrupt,
    Terminate,
}

/// Mark `stop` for `signal`. Returns `false` when a stop was already pending.
fn request_shutdown(stop: &StopFlag, signal: Shutdown) -> bool {
    if stop.is_stop_requested() {
        warn!(?signal, "stop already requested, waiting for the heater to switch off");
        return false;
    }
    warn!(?signal, "stopping at the next tick");
    stop.request_stop();
    true
}

#[cfg(unix)]
async fn watch_signals(stop: StopFlag) -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    loop {
        let received = tokio::select! {
            _ = interrupt.recv() => Shutdown::Interrupt,
            _ = terminate.recv() => Shutdown::Terminate,
        };
        request_shutdown(&stop, received);
    }
}

#[cfg(not(unix))]
async fn watch_signals(stop: StopFlag) -> io::Result<()> {
    loop {
        tokio::signal::ctrl_c().await?;
        request_shutdown(&stop, Shutdown::Interrupt);
    }
}

/// Route Ctrl-C and SIGTERM to `stop` so the sequence unwinds through the
/// heater guard. Signals stay caught for the life of the process.
fn install_stop_handler(stop: StopFlag) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!(%err, "could not start signal listener; Ctrl-C will not stop cleanly");
                return;
            }
        };
        if let Err(err) = runtime.block_on(watch_signals(stop)) {
            warn!(%err, "signal listener failed; Ctrl-C will not stop cleanly");
        }
    });
}

fn cmd_sweep(
    config: &RigConfig,
    realtime: bool,
    start: f64,
    end: f64,
    resolution: f64,
    output_dir: &Path,
) -> AppResult<()> {
    let setpoints = SetpointRange::new(start, end, resolution)?;
    let clock = make_clock(realtime);
    let SimulatedRig {
        mut rig,
        mut collector,
        ..
    } = simulated_rig(config, clock.clone())?;
    let mut store = RunStore::new(output_dir.to_path_buf())?;

    let stop = StopFlag::new();
    install_stop_handler(stop.clone());

    println!(
        "Sweeping {start} K → {end} K in {resolution} K steps into {}",
        output_dir.display()
    );
    collector.prepare(&*clock)?;

    let mut last_stage = None;
    let mut on_event = |event: SequenceEvent| render_progress(&event, &mut last_stage);
    let summary = Sequencer::for_rig(&config.control, &rig)?
        .with_stop_flag(stop)
        .with_progress(&mut on_event)
        .run_sweep(&mut rig, setpoints, &mut collector, &mut store);
    clear_progress_line();
    let summary = summary?;

    println!(
        "✓ Sweep complete: {} setpoints in {:.1} s (run {})",
        summary.results.len(),
        summary.elapsed_s,
        summary.manifest.run_id
    );
    println!("  Final data: {}", store.final_path().display());
    Ok(())
}

fn cmd_tune(config: &RigConfig, realtime: bool, first: f64, last: f64, step: f64) -> AppResult<()> {
    let targets = SetpointRange::new(first, last, step)?;
    let SimulatedRig { mut rig, .. } = simulated_rig(config, make_clock(realtime))?;

    let stop = StopFlag::new();
    install_stop_handler(stop.clone());

    let mut last_stage = None;
    let mut on_event = |event: SequenceEvent| render_progress(&event, &mut last_stage);
    let observations = Sequencer::for_rig(&config.tuning_control(), &rig)?
        .with_stop_flag(stop)
        .with_progress(&mut on_event)
        .run_tuning(&mut rig, targets, &config.tuning);
    clear_progress_line();

    println!("{:>10} {:>12} {:>10} {:>14}", "target K", "held W", "ramp", "max dev K");
    for obs in observations? {
        println!(
            "{:>10.3} {:>12.6} {:>10} {:>14.4}",
            obs.target_k,
            obs.held_power_w,
            obs.ramp_ticks,
            obs.max_deviation_k()
        );
    }
    Ok(())
}

fn cmd_monitor(
    config: &RigConfig,
    realtime: bool,
    samples: Option<usize>,
    interval: f64,
) -> AppResult<()> {
    if !(interval.is_finite() && interval >= 0.0) {
        return Err(AppError::InvalidInput(format!(
            "interval must be finite and non-negative, got {interval}"
        )));
    }
    let clock = make_clock(realtime);
    let SimulatedRig { mut rig, .. } = simulated_rig(config, clock.clone())?;
    let stop = StopFlag::new();
    install_stop_handler(stop.clone());

    let mut taken = 0;
    while samples.is_none_or(|n| taken < n) && !stop.is_stop_requested() {
        let t = rig.temperature()?;
        println!("{:>10.3} s  {:>10.4} K", clock.now_s(), t);
        taken += 1;
        clock.sleep(Duration::from_secs_f64(interval));
    }
    info!(readings = taken, "monitor finished");
    Ok(())
}

fn cmd_convert(raw: f64, sensor: SensorKind) -> AppResult<()> {
    let kelvin = sensor.table()?.interpolate(raw)?;
    println!(
        "{raw} {} → {kelvin:.4} K ({:.4} °C)",
        sensor.raw_unit(),
        kelvin - ts_core::constants::ZERO_CELSIUS_K
    );
    Ok(())
}

fn cmd_resistivity(kelvin: f64, material: Conductor) -> AppResult<()> {
    let rho = material.resistivity_ohm_m(kelvin)?;
    println!("{material:?} at {kelvin} K: {rho:.4e} Ω·m");
    Ok(())
}

fn cmd_show(output_dir: &Path) -> AppResult<()> {
    let store = RunStore::open(output_dir.to_path_buf())?;

    match store.load_manifest() {
        Ok(manifest) => {
            println!("Run {}", manifest.run_id);
            println!(
                "  Sweep: {} K → {} K, step {} K",
                manifest.start_k, manifest.end_k, manifest.resolution_k
            );
            println!("  Started: {}", manifest.started_at.to_rfc3339());
            if let Some(duration) = manifest.duration() {
                println!("  Duration: {} s", duration.num_seconds());
            }
            println!(
                "  Complete: {} ({} setpoints)",
                manifest.complete, manifest.setpoints_recorded
            );
        }
        Err(err) => println!("No manifest ({err})"),
    }

    let results = if store.final_path().exists() {
        store.load_final()?
    } else if let Some((index, partial)) = store.load_latest_partial()? {
        println!("  Final data missing; showing checkpoint {index}");
        partial
    } else {
        println!("No results recorded");
        return Ok(());
    };

    print_results(&results);
    Ok(())
}

fn print_results(results: &[StageResult]) {
    println!(
        "\n{:>10} {:>10} {:>10} {:>10} {:>14} {:>10}",
        "setpoint", "held W", "drift K", "f Hz", "R V", "θ deg"
    );
    for result in results {
        for (i, point) in result.points.iter().enumerate() {
            if i == 0 {
                print!(
                    "{:>10.3} {:>10.5} {:>10.4}",
                    result.setpoint_k,
                    result.held_power_w,
                    result.temperature_drift_k()
                );
            } else {
                print!("{:>10} {:>10} {:>10}", "", "", "");
            }
            println!(
                " {:>10.0} {:>14.6e} {:>10.3}",
                point.frequency_hz, point.magnitude_v, point.phase_deg
            );
        }
    }
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(event: &SequenceEvent, last_stage: &mut Option<(Stage, Option<usize>)>) {
    let key = (event.stage, event.setpoint_index);
    if *last_stage != Some(key) {
        clear_progress_line();
        match (event.target_k, event.setpoint_index) {
            (Some(target), Some(index)) => {
                println!("[{index}] {} → {target:.3} K", event.stage.label())
            }
            (Some(target), None) => println!("{} → {target:.3} K", event.stage.label()),
            _ => println!("{}", event.stage.label()),
        }
        *last_stage = Some(key);
    }

    if let Some(tick) = &event.tick {
        print!(
            "\r  tick={:<5} T={:>9.4} K  P={:>7.4} W  raw={:>8.4}  t={:.1}s",
            tick.tick, tick.measured_k, tick.power_w, tick.raw_output_w, event.elapsed_s
        );
        let _ = io::stdout().flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_requests_stop_and_later_ones_are_absorbed() {
        let stop = StopFlag::new();
        assert!(request_shutdown(&stop, Shutdown::Terminate));
        assert!(stop.is_stop_requested());
        assert!(!request_shutdown(&stop, Shutdown::Interrupt));
        assert!(!request_shutdown(&stop, Shutdown::Terminate));
        assert!(stop.is_stop_requested());
    }

    #[test]
    fn material_args_map_to_conductors() {
        assert_eq!(Conductor::from(MaterialArg::Copper), Conductor::Copper);
        assert_eq!(Conductor::from(MaterialArg::Nichrome), Conductor::Nichrome);
        assert!(cmd_resistivity(77.0, Conductor::Copper).is_ok());
    }

    #[test]
    fn cli_parses_resistivity() {
        let cli = Cli::try_parse_from(["ts-cli", "resistivity", "295", "--material", "nichrome"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Resistivity {
                kelvin,
                material: MaterialArg::Nichrome,
            } if kelvin == 295.0
        ));
    }
}
