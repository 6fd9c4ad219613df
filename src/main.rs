use anyhow::Result;
use budding_colony::output::{save_final_positions, save_snapshots, SnapshotFormat, TrajectoryWriter};
use budding_colony::ColonySimulation;
use clap::Parser;
use colony_common::SimulationConfig;
use log::{debug, error, info, trace};
use std::path::PathBuf;
use std::time::Instant;

/// Command-line arguments for the colony simulation
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Simulation config file (.toml)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override `timing.total_steps`
    #[arg(long)]
    steps: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting budding colony simulation...");

    // --- Load Configuration ---
    let mut config = SimulationConfig::load(&args.config)?;
    if let Some(steps) = args.steps {
        config.timing.total_steps = steps;
    }
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    // --- Initialize Simulation ---
    let mut sim = ColonySimulation::new(config)?;
    info!(
        "Seeded {} founder cells; force model: {}.",
        sim.current_cell_count(),
        sim.force_model().name()
    );
    debug!("Simulation Parameters: {:#?}", sim.params());

    let total_steps = sim.config().timing.total_steps;
    let record_interval_steps = sim.config().timing.record_interval_steps;
    let dt = sim.params().dt;
    let base_filename = sim.config().output.base_filename.clone();

    let mut trajectory = if sim.config().output.save_trajectory {
        Some(TrajectoryWriter::create(&base_filename)?)
    } else {
        None
    };

    info!("Recording every {} steps ({:.2} time units).", record_interval_steps, record_interval_steps as f64 * dt);
    info!("Starting simulation loop for {} steps...", total_steps);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;

    // --- Initial Snapshot (step 0) ---
    sim.record_snapshot()?;
    if let Some(writer) = trajectory.as_mut() {
        writer.write_frame(0, &sim.colony)?;
    }

    for step in 0..total_steps {
        let step_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during simulation step {}: {}", step + 1, e);
            anyhow::bail!("Simulation step failed.");
        }
        let step_duration = step_start_time.elapsed();

        let current_time = Instant::now();
        let should_print_status = current_time.duration_since(previous_print_time).as_secs_f64() >= 5.0;
        let is_record_step = (step + 1) % record_interval_steps == 0;
        let is_last_step = step + 1 == total_steps;

        if should_print_status || is_record_step || is_last_step {
            info!(
                "Step [{}/{}] (t={:.2}) | Cells: {} | Buds: {} | Step Time: {:6.2} ms | Elapsed: {:.2} s",
                step + 1,
                total_steps,
                (step + 1) as f64 * dt,
                sim.current_cell_count(),
                sim.colony.bud_count(),
                step_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = current_time;

            if is_record_step || is_last_step {
                sim.record_snapshot()?;
                if let Some(writer) = trajectory.as_mut() {
                    writer.write_frame(step + 1, &sim.colony)?;
                }
            }
        } else {
            trace!("Step [{}/{}] completed in {:.2} ms", step + 1, total_steps, step_duration.as_secs_f64() * 1000.0);
        }
    }

    let total_duration = start_time.elapsed();
    info!(
        "Simulation finished in {:.3} seconds with {} cells (max overlap {:.4}).",
        total_duration.as_secs_f64(),
        sim.current_cell_count(),
        sim.colony.max_overlap()
    );

    // --- Save Recorded Data ---
    if let Some(writer) = &trajectory {
        info!("{} trajectory frames written to {}", writer.frames_written(), writer.dir().display());
    }

    if sim.config().output.save_stats {
        let format = SnapshotFormat::parse(sim.config().output.format.as_deref());
        save_snapshots(sim.get_recorded_snapshots(), &base_filename, format)?;
    } else {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    if sim.config().output.save_positions {
        save_final_positions(&sim.colony, &base_filename)?;
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
