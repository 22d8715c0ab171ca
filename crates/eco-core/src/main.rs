//! Ecosystem Simulation Engine
//!
//! Loads a run configuration, spawns the configured organisms from their
//! species libraries and runs the simulation, writing an event log and
//! periodic world snapshots.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use eco_core::events::EventLogger;
use eco_core::output::{self, SnapshotGenerator};
use eco_core::pacing::PhasedLoop;
use eco_core::setup;
use eco_core::{Config, Ecosystem, Grid};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "ecosim")]
#[command(about = "An organism lifecycle and ecosystem simulation")]
struct Args {
    /// Run configuration file
    #[arg(long, default_value = eco_core::config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Random seed, overriding the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate, overriding the configuration
    #[arg(long)]
    ticks: Option<u64>,

    /// Directory for the event log and snapshots
    #[arg(long, default_value = "output")]
    output: PathBuf,

    /// Log per-organism detail
    #[arg(long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(seed) = args.seed {
        config.simulation.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.simulation.ticks = ticks;
    }

    match run(&config, &args.output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Simulation aborted: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, output_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let sim = &config.simulation;
    println!("Ecosystem Simulation");
    println!("====================");
    println!("Seed: {}", sim.seed);
    println!("Grid: {}x{}", sim.grid_x_size, sim.grid_y_size);
    println!("Ticks: {}", sim.ticks);
    println!();

    fs::create_dir_all(output_dir)?;
    let mut logger = EventLogger::new(output_dir.join("events.jsonl"))?;

    let grid = Grid::new(sim.grid_x_size, sim.grid_y_size, sim.seed);
    let mut eco = Ecosystem::with_builtin_handlers(Box::new(grid), sim.seed, sim.seconds_per_tick);

    let summary = setup::spawn_all(config, &mut eco)?;
    println!("Spawned {} organisms", summary.total);
    for (species, count) in &summary.by_species {
        println!("  {}: {}", species, count);
    }
    if summary.skipped > 0 {
        println!("  ({} skipped)", summary.skipped);
    }
    logger.log_batch(&eco.drain_events())?;

    let mut generator = SnapshotGenerator::new(sim.snapshot_interval);
    write_snapshots(&eco, &mut generator, "simulation_start", output_dir);

    let mut pacing = (sim.tick_rate > 0.0).then(|| PhasedLoop::new(sim.tick_rate));

    for _ in 0..sim.ticks {
        if let Some(pacing) = pacing.as_mut() {
            pacing.limit();
        }

        eco.run_tick()?;
        let events = eco.drain_events();
        if !events.is_empty() {
            tracing::debug!("Tick {}: {} events", eco.tick(), events.len());
        }
        logger.log_batch(&events)?;

        let tick = eco.tick();
        if generator.should_snapshot(tick) {
            write_snapshots(&eco, &mut generator, "periodic", output_dir);
        }
        if tick % 100 == 0 {
            tracing::info!("Tick {} / {} ({} organisms)", tick, sim.ticks, eco.population());
        }
        if eco.population() == 0 {
            tracing::info!("Population died out at tick {}", tick);
            break;
        }
    }

    if !generator.has_snapshot(eco.tick()) {
        write_snapshots(&eco, &mut generator, "simulation_end", output_dir);
    }
    logger.flush()?;

    println!();
    println!(
        "Simulation complete at {} with {} organisms.",
        eco.timestamp(),
        eco.population()
    );
    println!(
        "Logged {} events, generated {} snapshots.",
        logger.event_count(),
        generator.snapshot_count()
    );
    Ok(())
}

fn write_snapshots(eco: &Ecosystem, generator: &mut SnapshotGenerator, trigger: &str, dir: &Path) {
    let snapshot = output::generate_snapshot(eco, generator, trigger);
    if let Err(e) = output::write_snapshot_to_dir(&snapshot, dir) {
        tracing::warn!("Could not write snapshot at tick {}: {}", eco.tick(), e);
    }
    if let Err(e) = output::write_current_state(&snapshot, dir) {
        tracing::warn!("Could not write current state at tick {}: {}", eco.tick(), e);
    }
}
