//! Footfall Application
//!
//! Command-line front end for the footfall vibration-floor monitor. Replays
//! recorded sample streams or generates synthetic footsteps, printing one JSON
//! line per detected footstep on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Replay a recording (one SampleFrame JSON object per line)
//! footfall replay --input walk.jsonl
//!
//! # Twenty synthetic footsteps with a custom configuration
//! footfall simulate --steps 20 --seed 7 --config floor.json
//!
//! # Print the default configuration
//! footfall config > floor.json
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use footfall_native::simulation::FootstepSimulator;
use footfall_native::{Event, FootstepMonitor, MonitorConfig, PositionEstimate, SampleFrame};

/// Frames of background fed after warmup and between simulated footsteps
const SIMULATION_GAP: usize = 300;

/// Footfall vibration-floor monitor
#[derive(Parser, Debug)]
#[command(name = "footfall")]
#[command(author, version, about = "Footstep detection and localization on instrumented floors", long_about = None)]
struct Cli {
    /// Logging verbosity level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a recorded stream through a monitor
    Replay {
        /// JSON-lines file of sample frames
        #[arg(short, long)]
        input: PathBuf,

        /// Monitor configuration (JSON); defaults if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate synthetic footsteps and localize them
    Simulate {
        /// Number of footsteps
        #[arg(short = 'n', long, default_value = "10")]
        steps: usize,

        /// Random seed for positions and noise
        #[arg(short, long, default_value = "1")]
        seed: u64,

        /// Monitor configuration (JSON); defaults if omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as JSON
    Config,
}

/// One detected footstep, as printed by `replay`
#[derive(Serialize)]
struct ReplayRecord<'a> {
    event: &'a Event,
    position: Option<&'a PositionEstimate>,
}

/// One detected footstep, as printed by `simulate`
#[derive(Serialize)]
struct SimulationRecord<'a> {
    step: usize,
    true_x_cm: f64,
    true_y_cm: f64,
    error_cm: Option<f64>,
    position: Option<&'a PositionEstimate>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Footfall v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Replay { input, config } => replay(&input, config.as_deref()),
        Commands::Simulate { steps, seed, config } => simulate(steps, seed, config.as_deref()),
        Commands::Config => print_config(),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MonitorConfig> {
    match path {
        Some(path) => {
            let config = MonitorConfig::load(path)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        None => Ok(MonitorConfig::default()),
    }
}

/// Replay a JSON-lines recording
fn replay(input: &Path, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut monitor = FootstepMonitor::new(config)?;

    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let reader = BufReader::new(file);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut frames = 0u64;
    let mut malformed = 0u64;
    let mut footsteps = 0u64;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", input.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: SampleFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                malformed += 1;
                debug!(line = line_no + 1, error = %e, "Skipping malformed frame");
                continue;
            }
        };
        frames += 1;

        let output = monitor.push_frame(frame);
        if let Some(event) = output.event() {
            footsteps += 1;
            let record = ReplayRecord { event, position: output.position.as_ref() };
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        }
    }

    if malformed > 0 {
        warn!(malformed, "Malformed lines skipped");
    }
    let stats = monitor.detector().stats();
    info!(
        frames,
        footsteps,
        rejected = stats.rejected,
        ignored_samples = stats.ignored_samples,
        spike_rate_hz = monitor.neuron().spike_rate(),
        "Replay complete"
    );
    Ok(())
}

/// Generate synthetic footsteps at random positions
fn simulate(steps: usize, seed: u64, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let mut monitor = FootstepMonitor::new(config)?;
    let mut sim = FootstepSimulator::new(&config, seed);
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let warmup = config.detector.warmup_samples as usize + SIMULATION_GAP;
    for frame in sim.quiet(warmup) {
        monitor.push_frame(frame);
    }

    let margin = config.surface.width_cm.min(config.surface.height_cm) * 0.1;
    let mut detected = 0usize;
    let mut total_error = 0.0;

    for step in 0..steps {
        let (x, y) = sim.random_position(margin);
        let mut frames = sim.footstep(x, y);
        frames.extend(sim.quiet(SIMULATION_GAP));

        for frame in frames {
            let output = monitor.push_frame(frame);
            if output.event().is_none() {
                continue;
            }
            detected += 1;
            let error_cm = output
                .position
                .as_ref()
                .map(|p| (p.raw_x_cm - x).hypot(p.raw_y_cm - y));
            total_error += error_cm.unwrap_or(0.0);

            let record = SimulationRecord {
                step,
                true_x_cm: x,
                true_y_cm: y,
                error_cm,
                position: output.position.as_ref(),
            };
            serde_json::to_writer(&mut out, &record)?;
            writeln!(out)?;
        }
    }

    #[allow(clippy::cast_precision_loss)]
    let mean_error_cm = if detected > 0 { total_error / detected as f64 } else { 0.0 };
    if detected < steps {
        warn!(steps, detected, "Some footsteps were not detected");
    }
    info!(steps, detected, mean_error_cm, "Simulation complete");
    Ok(())
}

/// Print the default configuration
fn print_config() -> anyhow::Result<()> {
    println!("{}", MonitorConfig::default().to_json_pretty()?);
    Ok(())
}
