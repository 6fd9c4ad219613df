use crate::config::ForceModelKind;
use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, fixed for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams {
    // Time
    /// Explicit Euler timestep shared by growth and position integration.
    pub dt: f64,

    // Founders
    pub radius_average: f64,
    pub max_radius_spread: f64,
    pub founder_initial_radius: f64,
    pub placement_extent: f64,

    // Growth: f(r) = k_g1 * r + k_g2
    pub k_g1: f64,
    pub k_g2: f64,

    // Cell cycle
    /// Fraction of max radius above which a non-bud cell enters S (k_G1).
    pub k_g1_threshold: f64,
    /// Fraction of max radius above which a bud triggers mitosis on its mother.
    pub k_mitosis: f64,
    /// Bud initial radius as a fraction of the mother's max radius.
    pub bud_radius_fraction: f64,

    // Mechanics
    pub force_model: ForceModelKind,
    /// Spring stiffness of the primary model.
    pub k_spring: f64,
    /// Adhesion cutoff, as a multiple of the summed radii.
    pub k_neighbor: f64,
    /// Equilibrium separation of unrelated cells, as a fraction of the summed radii.
    pub k_repulsion_cell_cell: f64,
    pub k_adhesion_mother_bud: f64,
    pub k_adhesion_cell_cell: f64,
    /// Linear-spring repulsion and adhesion coefficients.
    pub k_r: f64,
    pub k_a: f64,
    /// Sum over every overlapping neighbor instead of keeping the last one.
    pub linear_spring_accumulate: bool,
    /// Decay constant of the exponential potential.
    pub k_exp_decay: f64,
}

impl Default for SimParams {
    fn default() -> Self {
        SimParams {
            dt: 0.1,
            radius_average: 0.6,
            max_radius_spread: 0.01,
            founder_initial_radius: 0.5,
            placement_extent: 0.0,
            k_g1: 0.01,
            k_g2: 0.01,
            k_g1_threshold: 0.9,
            k_mitosis: 0.7,
            bud_radius_fraction: 0.02,
            force_model: ForceModelKind::Spring,
            k_spring: 1.0,
            k_neighbor: 1.1,
            k_repulsion_cell_cell: 0.9,
            k_adhesion_mother_bud: 1.0,
            k_adhesion_cell_cell: 0.1,
            k_r: 1.0,
            k_a: 0.2,
            linear_spring_accumulate: false,
            k_exp_decay: 1.0,
        }
    }
}
