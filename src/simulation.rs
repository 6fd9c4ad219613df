use crate::colony::{Colony, TransitionCounts};
use crate::force::ForceModel;
use anyhow::Result;
use colony_common::{CellRecord, SimParams, SimulationConfig, Snapshot, Vec2};
use log::{debug, trace};
use rand::prelude::*;
use rayon::prelude::*;

/// Drives a budding colony through fixed-order timesteps on the CPU.
pub struct ColonySimulation {
    /// The simulation configuration, including initial conditions and parameters.
    config: SimulationConfig,
    /// Constants derived from `config`; never changed during a run.
    params: SimParams,
    /// The force law chosen for this run.
    force_model: ForceModel,
    pub colony: Colony,
    /// Host-side RNG for founder placement and bud angles.
    pub rng: StdRng,
    /// The current simulation step number.
    pub current_time_step: u32,
    recorded_snapshots: Vec<Snapshot>,
}

impl ColonySimulation {
    /// Creates a new `ColonySimulation`, seeding the RNG and placing founder cells.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let params = config.get_sim_params();
        let mut rng = StdRng::seed_from_u64(config.initial_conditions.seed);
        let colony = Colony::seed_founders(&params, config.initial_conditions.num_founders, &mut rng)?;
        Ok(Self::with_colony(config, colony, rng))
    }

    /// Wraps an existing colony, e.g. one assembled cell by cell.
    pub fn with_colony(config: SimulationConfig, colony: Colony, rng: StdRng) -> Self {
        let params = config.get_sim_params();
        let force_model = ForceModel::from_params(&params);
        Self {
            config,
            params,
            force_model,
            colony,
            rng,
            current_time_step: 0,
            recorded_snapshots: Vec::new(),
        }
    }

    /// Advances the simulation by one timestep (`dt`).
    pub fn step(&mut self) -> Result<TransitionCounts> {
        // --- 1. Growth and lifecycle (serial transitions) ---
        let transitions = self.advance_cell_cycle()?;

        // --- 2. Mechanics: compute every force, then move every cell ---
        self.advance_mechanics();

        for cell in self.colony.cells_mut() {
            cell.tick_age();
        }
        self.current_time_step += 1;
        Ok(transitions)
    }

    /// Grows every cell, evaluates cycle transitions on the start-of-step
    /// population, then performs the budding and mitosis they call for.
    pub fn advance_cell_cycle(&mut self) -> Result<TransitionCounts> {
        self.colony.grow_all(&self.params);
        let signals = self.colony.update_cell_cycles(&self.params);
        let transitions = self.colony.resolve_transitions(&self.params, &mut self.rng)?;
        if transitions.buddings > 0 || transitions.mitoses > 0 {
            debug!(
                "Step {}: {} buddings, {} mitoses ({} mitosis signals), {} cells.",
                self.current_time_step,
                transitions.buddings,
                transitions.mitoses,
                signals,
                self.colony.cell_count()
            );
        }
        Ok(transitions)
    }

    /// Two-phase mechanics update. Forces are computed in parallel from an
    /// immutable view of the population; positions are written only after the
    /// whole pass finished.
    pub fn advance_mechanics(&mut self) {
        let model = self.force_model;
        let dt = self.params.dt;

        // Phase 1: read-only force pass.
        let population = self.colony.cells();
        let forces: Vec<Vec2> = population
            .par_iter()
            .map(|cell| model.net_force(cell, population))
            .collect();

        // Phase 2: apply.
        self.colony
            .cells_mut()
            .par_iter_mut()
            .zip(forces.into_par_iter())
            .for_each(|(cell, force)| {
                cell.set_force(force);
                cell.update_location(dt);
            });
        trace!("Integrated {} cells with the {} model.", self.colony.cell_count(), model.name());
    }

    /// Retrieves the current `(x, y)` position of every cell, ordered by id.
    pub fn get_results(&self) -> Vec<(f64, f64)> {
        self.colony
            .cells()
            .iter()
            .map(|cell| (cell.position().x, cell.position().y))
            .collect()
    }

    /// Returns the current number of cells in the colony.
    pub fn current_cell_count(&self) -> usize {
        self.colony.cell_count()
    }

    /// Provides access to the simulation parameters.
    pub fn params(&self) -> &SimParams {
        &self.params
    }

    /// Provides access to the original simulation configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn force_model(&self) -> ForceModel {
        self.force_model
    }

    /// Collects the colony metrics and stores them as a Snapshot.
    pub fn record_snapshot(&mut self) -> Result<()> {
        let cells = self.colony.cells();
        let total = cells.len();
        let current_sim_time = self.current_time_step as f64 * self.params.dt;

        debug!("Recording snapshot at step {} (t={:.2})...", self.current_time_step, current_sim_time);

        let mean_radius = if total > 0 {
            cells.iter().map(|cell| cell.radius()).sum::<f64>() / total as f64
        } else {
            0.0
        };

        let cell_records = self.config.output.save_positions_in_snapshot.then(|| {
            cells
                .iter()
                .map(|cell| CellRecord {
                    id: cell.id().0,
                    x: cell.position().x,
                    y: cell.position().y,
                    radius: cell.radius(),
                })
                .collect()
        });

        let snapshot = Snapshot {
            step: self.current_time_step,
            time: current_sim_time,
            total_cell_count: total as u32,
            bud_count: self.colony.bud_count() as u32,
            phase_counts: self.colony.phase_counts(),
            mean_radius,
            max_overlap: self.colony.max_overlap(),
            cells: cell_records,
        };

        self.recorded_snapshots.push(snapshot);
        Ok(())
    }

    /// Provides access to the recorded snapshots.
    pub fn get_recorded_snapshots(&self) -> &[Snapshot] {
        &self.recorded_snapshots
    }
}
