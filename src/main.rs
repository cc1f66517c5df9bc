/*
 * Boid Flocking Simulation - Headless Runner
 *
 * Plays the role of the host timer: sets the flock up once through the
 * Driver, then invokes it once per tick and writes each tick's positions,
 * velocities, accelerations and trails as one JSON object per line.
 */

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use flock::{BoundaryMode, Driver, DriverInputs, DriverOutcome, FlockConfig, SeedSource, TickOutput};

#[derive(Parser)]
#[command(name = "flock", about = "Headless 3D boid flocking simulation")]
struct Cli {
    /// TOML config file (defaults are used for anything it leaves out)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of boids scattered in the bounds when the config lists no positions
    #[arg(long)]
    agents: Option<usize>,

    /// Number of ticks to run after setup
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Pause between ticks, in milliseconds
    #[arg(long, default_value_t = 0)]
    interval_ms: u64,

    /// Fixed seed for start points and initial velocities
    #[arg(long, conflicts_with = "wall_clock")]
    seed: Option<u64>,

    /// Seed initial velocities from the current time
    #[arg(long)]
    wall_clock: bool,

    /// Bounce off the bounds instead of wrapping around
    #[arg(long)]
    mirror: bool,

    /// Enable verbose debug output
    #[arg(long)]
    verbose: bool,
}

#[derive(Serialize)]
struct TickRecord<'a> {
    tick: u64,
    #[serde(flatten)]
    output: &'a TickOutput,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<FlockConfig> {
    let mut config = match &cli.config {
        Some(path) => FlockConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => FlockConfig::default(),
    };

    if let Some(count) = cli.agents {
        config.agent_count = count;
        config.positions = None;
    }
    if let Some(seed) = cli.seed {
        config.seed = SeedSource::Fixed(seed);
    }
    if cli.wall_clock {
        config.seed = SeedSource::WallClock;
    }

    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let inputs = DriverInputs::from_config(&config).context("invalid attractor curves")?;
    let mut driver = Driver::from_config(&config);
    if cli.mirror {
        driver.set_boundary_mode(BoundaryMode::Mirror);
    }

    // A fresh driver always sets up on its first call
    if let DriverOutcome::Initialized { boids } = driver.solve(&inputs).context("flock setup failed")? {
        tracing::info!("flock ready with {boids} boids");
    }

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let interval = Duration::from_millis(cli.interval_ms);

    for tick in 1..=cli.ticks {
        if let DriverOutcome::Ticked(output) = driver.solve(&inputs)? {
            serde_json::to_writer(&mut out, &TickRecord { tick, output: &output })?;
            writeln!(out)?;
        }
        if !interval.is_zero() {
            out.flush()?;
            thread::sleep(interval);
        }
    }

    out.flush()?;
    Ok(())
}
