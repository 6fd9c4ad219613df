//! Pairwise mechanical forces between cells.
//!
//! A run picks one [`ForceModel`] and evaluates it for every cell against the
//! whole population (all pairs, no spatial cutoff beyond each model's own).

use crate::cell::Cell;
use colony_common::{ForceModelKind, SimParams, Vec2};

/// Role of a neighbor with respect to the cell whose force is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Stranger,
    /// The neighbor is this cell's mother.
    Mother,
    /// The neighbor is this cell's bud.
    Daughter,
}

/// The force law used for one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceModel {
    /// Relation-aware spring with extra adhesion inside the neighbor cutoff.
    Spring {
        k_spring: f64,
        k_neighbor: f64,
        k_repulsion_cell_cell: f64,
        k_adhesion_mother_bud: f64,
        k_adhesion_cell_cell: f64,
    },
    /// Symmetric overlap spring. Without `accumulate` only the last overlapping
    /// neighbor in population order contributes.
    LinearSpring { k_r: f64, k_a: f64, accumulate: bool },
    /// Scale-free exponential potential, cut off at twice the mean radius.
    Exponential { decay: f64 },
}

impl ForceModel {
    pub fn from_params(params: &SimParams) -> Self {
        match params.force_model {
            ForceModelKind::Spring => ForceModel::Spring {
                k_spring: params.k_spring,
                k_neighbor: params.k_neighbor,
                k_repulsion_cell_cell: params.k_repulsion_cell_cell,
                k_adhesion_mother_bud: params.k_adhesion_mother_bud,
                k_adhesion_cell_cell: params.k_adhesion_cell_cell,
            },
            ForceModelKind::LinearSpring => ForceModel::LinearSpring {
                k_r: params.k_r,
                k_a: params.k_a,
                accumulate: params.linear_spring_accumulate,
            },
            ForceModelKind::Exponential => ForceModel::Exponential {
                decay: params.k_exp_decay,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ForceModel::Spring { .. } => "spring",
            ForceModel::LinearSpring { .. } => "linear_spring",
            ForceModel::Exponential { .. } => "exponential",
        }
    }

    /// Net force on `cell` from every other member of `population`.
    /// Pure function of its inputs; `cell` itself may appear in `population`.
    pub fn net_force(&self, cell: &Cell, population: &[Cell]) -> Vec2 {
        match *self {
            ForceModel::Spring {
                k_spring,
                k_neighbor,
                k_repulsion_cell_cell,
                k_adhesion_mother_bud,
                k_adhesion_cell_cell,
            } => {
                let mut rep_force = Vec2::zero();
                let mut adh_force = Vec2::zero();
                for (other, dir, d) in pairs(cell, population) {
                    let r_i = cell.radius();
                    let r_j = other.radius();
                    let sum = r_i + r_j;
                    // Mother and bud share the pair target r_mother from both sides.
                    let (target, k_adhesion) = match cell.relation_to(other.id()) {
                        Relation::Daughter => (r_i / sum * sum, k_adhesion_mother_bud),
                        Relation::Mother => (r_j / sum * sum, k_adhesion_mother_bud),
                        Relation::Stranger => (k_repulsion_cell_cell * sum, k_adhesion_cell_cell),
                    };
                    let stretch = (d - target) * k_spring;
                    rep_force += dir * stretch;
                    if d < k_neighbor * sum {
                        adh_force += dir * (stretch * k_adhesion);
                    }
                }
                rep_force + adh_force
            }
            ForceModel::LinearSpring { k_r, k_a, accumulate } => {
                let mut rep_force = Vec2::zero();
                let mut adh_force = Vec2::zero();
                for (other, dir, d) in pairs(cell, population) {
                    let sum = cell.radius() + other.radius();
                    if d >= sum {
                        continue;
                    }
                    let delta = sum - d;
                    let rep = dir * (-k_r * delta);
                    let adh = dir * (k_a * delta);
                    if accumulate {
                        rep_force += rep;
                        adh_force += adh;
                    } else {
                        rep_force = rep;
                        adh_force = adh;
                    }
                }
                rep_force + adh_force
            }
            ForceModel::Exponential { decay } => {
                let mut force = Vec2::zero();
                for (other, dir, d) in pairs(cell, population) {
                    let dd = d / (0.5 * (cell.radius() + other.radius()));
                    if dd < 2.0 {
                        force += -dir * ((-dd * decay).exp() * dd / decay);
                    }
                }
                force
            }
        }
    }
}

/// Other cells of `population` with the unit vector from `cell` towards them and
/// their distance. Self and coincident centres (d == 0) are skipped.
fn pairs<'a>(cell: &'a Cell, population: &'a [Cell]) -> impl Iterator<Item = (&'a Cell, Vec2, f64)> + 'a {
    population
        .iter()
        .filter(move |other| other.id() != cell.id())
        .filter_map(move |other| {
            let diff = other.position() - cell.position();
            let d = diff.length();
            (d > 0.0).then(|| (other, diff / d, d))
        })
}

/// Largest positive `r_i + r_j - d` between `cell` and any other member of
/// `population`, or 0.0 when nothing overlaps.
pub fn max_overlap(cell: &Cell, population: &[Cell]) -> f64 {
    population
        .iter()
        .filter(|other| other.id() != cell.id())
        .map(|other| cell.radius() + other.radius() - cell.position().distance(other.position()))
        .fold(0.0, f64::max)
}
