//! Photoreactor host runner.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  SimulatedReactor     LogEventSink    JsonConfigFile         │
//! │  (+ FswebcamCamera)   (EventSink)     (ConfigPort)           │
//! │                       ValuesFile                             │
//! │                       (PhaseSource)                          │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ────────────────       │
//! │                                                              │
//! │  ┌──────────────────────────────────────────────────────┐    │
//! │  │          ReactorRuntime (pure control logic)          │    │
//! │  │  lights · capture · cycle · quench · sensors          │    │
//! │  └──────────────────────────────────────────────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The runner loads config, starts a run, ticks at the configured cadence
//! for the requested duration and stops, leaving every output off.
//!
//! Relays, sensors and the degas valve are always simulated here; the
//! runner never drives a relay board.  Only the camera can be real: without
//! `--simulate` pictures are taken with fswebcam.  Real pins need a
//! `RelayBoard` composed into a `HardwareAdapter`, which this binary does
//! not do.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use tracing_subscriber::EnvFilter;

use photoreactor::adapters::config_file::JsonConfigFile;
use photoreactor::adapters::fswebcam::FswebcamCamera;
use photoreactor::adapters::log_sink::LogEventSink;
use photoreactor::adapters::sim::SimulatedReactor;
use photoreactor::adapters::values_file::ValuesFile;
use photoreactor::app::ports::ConfigPort;
use photoreactor::app::runtime::ReactorRuntime;
use photoreactor::config::ReactorConfig;
use photoreactor::error::ReactorError;

#[derive(Parser, Debug)]
#[command(name = "photoreactor")]
#[command(version, about = "Run the photoreactor controller on this host")]
struct Args {
    /// JSON configuration file (defaults when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Phase record (on|off, light, dark, picture minutes)
    #[arg(long, default_value = "values.txt")]
    values: PathBuf,

    /// Stop the run after this many seconds
    #[arg(long, default_value_t = 600)]
    duration_secs: u64,

    /// Use the simulated camera instead of fswebcam
    #[arg(long)]
    simulate: bool,

    /// Advance simulated time without sleeping
    #[arg(long)]
    fast: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match &args.config {
        Some(path) => JsonConfigFile::new(path)
            .load()
            .with_context(|| format!("loading {}", path.display()))?,
        None => ReactorConfig::default(),
    };
    config.validate().context("configuration out of range")?;
    info!(
        "Photoreactor: folder={} interval={}s quench={} degas={}",
        config.folder, config.picture_interval_secs, config.quench.enabled, config.degas_enabled
    );

    let mut values = ValuesFile::new(&args.values);
    let mut sink = LogEventSink::new();

    let mut hw = if args.simulate {
        SimulatedReactor::new()
    } else {
        SimulatedReactor::new().with_camera(FswebcamCamera::new())
    };
    run(config, &args, &mut hw, &mut values, &mut sink)
}

/// Drive one run to completion.
fn run(
    config: ReactorConfig,
    args: &Args,
    hw: &mut SimulatedReactor,
    values: &mut ValuesFile,
    sink: &mut LogEventSink,
) -> Result<()> {
    let tick = Duration::from_millis(u64::from(config.tick_interval_ms.max(1)));
    let tick_secs = tick.as_secs_f64();
    let mut runtime = ReactorRuntime::new(config);

    runtime.poll_phase(0.0, values, sink);
    runtime.start(0.0, hw, sink).context("starting run")?;

    let ticks = (args.duration_secs as f64 / tick_secs).ceil() as u64;
    let mut now = 0.0;
    for _ in 0..ticks {
        if !args.fast {
            thread::sleep(tick);
        }
        now += tick_secs;
        hw.advance(tick_secs);
        runtime.poll_phase(now, values, sink);
        match runtime.tick(now, hw, sink) {
            Ok(()) => {}
            Err(e @ ReactorError::IoFatal { .. }) => {
                error!("{}; stopping", e);
                break;
            }
            Err(e) => warn!("tick: {}", e),
        }
    }

    runtime.stop(hw, sink);
    let t = runtime.build_telemetry();
    info!(
        "Done: {} artifact(s), O2={:?} P={:?}, quench targets left={}",
        hw.artifacts().len(),
        t.oxygen,
        t.pressure,
        t.quench_targets_left
    );
    Ok(())
}
