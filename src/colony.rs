use crate::cell::{Cell, CellId, CycleSignal, Phase};
use anyhow::Result;
use colony_common::{SimParams, Vec2};
use log::{debug, trace};
use rand::distr::Uniform;
use rand::prelude::*;
use rayon::prelude::*;

/// Owns every live cell. A cell's id is its index in `cells`; cells are never removed.
#[derive(Debug, Default, Clone)]
pub struct Colony {
    cells: Vec<Cell>,
}

/// Counts of the lifecycle events resolved during one step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransitionCounts {
    pub buddings: usize,
    pub mitoses: usize,
}

impl Colony {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `count` founders scattered uniformly in a square of side
    /// `placement_extent` centred on the origin. Max radii are drawn from
    /// `radius_average * [1 - spread, 1 + spread)`.
    pub fn seed_founders<R: Rng + ?Sized>(params: &SimParams, count: u32, rng: &mut R) -> Result<Self> {
        let mut colony = Colony::new();
        let half = 0.5 * params.placement_extent;
        let coord_dist = (half > 0.0).then(|| Uniform::new(-half, half)).transpose()?;
        let spread = params.max_radius_spread;
        let max_radius_dist = (spread > 0.0)
            .then(|| Uniform::new(params.radius_average * (1.0 - spread), params.radius_average * (1.0 + spread)))
            .transpose()?;

        for _ in 0..count {
            let position = match &coord_dist {
                Some(dist) => Vec2::new(rng.sample(dist), rng.sample(dist)),
                None => Vec2::zero(),
            };
            let max_radius = match &max_radius_dist {
                Some(dist) => rng.sample(dist),
                None => params.radius_average,
            };
            let init_radius = params.founder_initial_radius.min(max_radius);
            colony.add_founder(position, max_radius, init_radius)?;
        }
        debug!("Seeded {} founder cells.", colony.cell_count());
        Ok(colony)
    }

    /// Read-only view of every live cell, ordered by id.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn cell(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.index())
    }

    /// # Panics
    /// If `id` does not belong to this colony.
    pub fn cell_mut(&mut self, id: CellId) -> &mut Cell {
        &mut self.cells[id.index()]
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Identity the next registered cell must carry.
    pub fn next_id(&self) -> CellId {
        CellId(self.cells.len() as u32)
    }

    pub fn add_founder(&mut self, position: Vec2, max_radius: f64, init_radius: f64) -> Result<CellId> {
        let cell = Cell::founder(self.next_id(), position, max_radius, init_radius);
        self.register_cell(cell)
    }

    /// Takes ownership of a new cell. Its id must be the next free one.
    pub fn register_cell(&mut self, cell: Cell) -> Result<CellId> {
        let id = cell.id();
        if id != self.next_id() {
            anyhow::bail!(
                "Cannot register cell {}: next free id is {}.",
                id,
                self.next_id()
            );
        }
        self.cells.push(cell);
        Ok(id)
    }

    /// Grows every cell by one step (only G1 cells change).
    pub fn grow_all(&mut self, params: &SimParams) {
        self.cells.par_iter_mut().for_each(|cell| cell.grow(params));
    }

    /// Evaluates every cell's cycle transition, then applies the mitosis
    /// signals buds raised for their mothers. Returns the number of signals.
    pub fn update_cell_cycles(&mut self, params: &SimParams) -> usize {
        let signals: Vec<CycleSignal> = self
            .cells
            .iter_mut()
            .filter_map(|cell| cell.update_cell_cycle(params))
            .collect();
        for signal in &signals {
            match *signal {
                CycleSignal::MotherEntersMitosis(mother) => {
                    trace!("Bud signalled mother {} into mitosis.", mother);
                    self.cell_mut(mother).enter_mitosis();
                }
            }
        }
        signals.len()
    }

    /// Buds `mother` (which must be in S without a bud) and registers the new cell.
    pub fn perform_budding<R: Rng + ?Sized>(&mut self, mother: CellId, params: &SimParams, rng: &mut R) -> Result<CellId> {
        let new_id = self.next_id();
        let bud = self.cell_mut(mother).bud(new_id, params, rng);
        self.register_cell(bud)
    }

    /// Separates `mother` (which must be in M) from its bud.
    pub fn perform_mitosis(&mut self, mother: CellId) {
        let daughter = self.cell_mut(mother).complete_mitosis();
        self.cell_mut(daughter).detach_from_mother();
    }

    /// Buds every cell in S and divides every cell in M, in id order.
    /// Cells registered here are not visited until the next step.
    pub fn resolve_transitions<R: Rng + ?Sized>(&mut self, params: &SimParams, rng: &mut R) -> Result<TransitionCounts> {
        let mut counts = TransitionCounts::default();
        for idx in 0..self.cells.len() {
            let id = CellId(idx as u32);
            match self.cells[idx].phase() {
                Phase::S => {
                    let bud = self.perform_budding(id, params, rng)?;
                    trace!("Cell {} budded cell {}.", id, bud);
                    counts.buddings += 1;
                }
                Phase::M => {
                    self.perform_mitosis(id);
                    counts.mitoses += 1;
                }
                Phase::G1 | Phase::G2 => {}
            }
        }
        Ok(counts)
    }

    /// Cells still attached to their mother.
    pub fn bud_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_bud()).count()
    }

    /// Number of cells per phase, indexed by `Phase::index`.
    pub fn phase_counts(&self) -> [u32; 4] {
        let mut counts = [0u32; 4];
        for cell in &self.cells {
            counts[cell.phase().index()] += 1;
        }
        counts
    }

    /// Largest pairwise overlap anywhere in the colony.
    pub fn max_overlap(&self) -> f64 {
        let population = self.cells();
        population
            .par_iter()
            .map(|cell| cell.max_overlap(population))
            .reduce(|| 0.0, f64::max)
    }
}
