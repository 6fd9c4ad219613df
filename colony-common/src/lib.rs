pub mod config;
pub mod sim_params;
pub mod snapshot;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{SimulationConfig, TimingConfig, InitialConditions, GrowthConfig, CycleConfig, MechanicsConfig, OutputConfig, ForceModelKind};
pub use sim_params::SimParams;
pub use snapshot::{CellRecord, Snapshot};
pub use vecmath::{Vec2, angle_to_vec};
