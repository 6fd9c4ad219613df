//! Mechanics and cell-cycle simulation of a budding cell colony.
//!
//! Each [`cell::Cell`] grows through G1, buds in S, waits in G2 while its bud
//! grows, and separates from it in M. The [`colony::Colony`] owns every cell;
//! [`simulation::ColonySimulation`] advances them in fixed order, computing all
//! pairwise forces with one [`force::ForceModel`] before moving any cell.

pub mod cell;
pub mod colony;
pub mod force;
pub mod output;
pub mod simulation;

pub use cell::{Cell, CellId, CycleSignal, Phase};
pub use colony::{Colony, TransitionCounts};
pub use force::{ForceModel, Relation};
pub use simulation::ColonySimulation;
