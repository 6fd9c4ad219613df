use serde::{Serialize, Deserialize};

/// One cell's state inside a recorded snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub id: u32,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// A snapshot of the colony state and metrics at a specific time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The simulation step at which the snapshot was taken.
    pub step: u32,
    /// Simulation time (step * dt).
    pub time: f64,
    /// The total number of cells in the colony.
    pub total_cell_count: u32,
    /// Cells still attached to their mother.
    pub bud_count: u32,
    /// Number of cells in each phase, ordered G1, S, G2, M.
    pub phase_counts: [u32; 4],
    pub mean_radius: f64,
    /// Largest pairwise overlap `r_i + r_j - d` in the colony (0 when none overlap).
    pub max_overlap: f64,
    #[serde(skip_serializing_if = "Option::is_none")] // Don't write "cells": null
    pub cells: Option<Vec<CellRecord>>,
}
