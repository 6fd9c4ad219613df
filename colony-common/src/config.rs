use serde::{Deserialize, Serialize};
use anyhow::Result;
use crate::sim_params::SimParams;
use std::path::Path;

// Configuration for timing
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct TimingConfig {
    pub dt: f64,
    pub total_steps: u32,
    pub record_interval_steps: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            dt: 0.1,
            total_steps: 5000,
            record_interval_steps: 50,
        }
    }
}

// Founder cells and RNG seed
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct InitialConditions {
    pub num_founders: u32,
    pub radius_average: f64,
    /// Founders draw max radius from `radius_average * [1 - spread, 1 + spread)`.
    pub max_radius_spread: f64,
    pub founder_initial_radius: f64,
    /// Side of the square (centred on the origin) founders are scattered in.
    pub placement_extent: f64,
    pub seed: u64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        InitialConditions {
            num_founders: 1,
            radius_average: 0.6,
            max_radius_spread: 0.01,
            founder_initial_radius: 0.5,
            placement_extent: 0.0,
            seed: 42,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct GrowthConfig {
    pub k_g1: f64,
    pub k_g2: f64,
}

impl Default for GrowthConfig {
    fn default() -> Self {
        GrowthConfig { k_g1: 0.01, k_g2: 0.01 }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct CycleConfig {
    /// Budding-readiness fraction of max radius (k_G1).
    pub k_g1_threshold: f64,
    /// Division-readiness fraction of max radius for buds.
    pub k_mitosis: f64,
    pub bud_radius_fraction: f64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        CycleConfig {
            k_g1_threshold: 0.9,
            k_mitosis: 0.7,
            bud_radius_fraction: 0.02,
        }
    }
}

/// Which pairwise force law a run uses.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForceModelKind {
    Spring,
    LinearSpring,
    Exponential,
}

// Parameters of the three force models
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct MechanicsConfig {
    #[serde(default = "default_force_model")]
    pub model: ForceModelKind,
    pub k_spring: f64,
    pub k_neighbor: f64,
    pub k_repulsion_cell_cell: f64,
    pub k_adhesion_mother_bud: f64,
    pub k_adhesion_cell_cell: f64,
    pub k_r: f64,
    pub k_a: f64,
    pub k_exp_decay: f64,
    pub linear_spring_accumulate: bool,
}

// Default function for model
fn default_force_model() -> ForceModelKind {
    ForceModelKind::Spring
}

impl Default for MechanicsConfig {
    fn default() -> Self {
        MechanicsConfig {
            model: default_force_model(),
            k_spring: 1.0,
            k_neighbor: 1.1,
            k_repulsion_cell_cell: 0.9,
            k_adhesion_mother_bud: 1.0,
            k_adhesion_cell_cell: 0.1,
            k_r: 1.0,
            k_a: 0.2,
            k_exp_decay: 1.0,
            linear_spring_accumulate: false,
        }
    }
}

// Configuration for output settings
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    /// Write `id x y radius` and `x y 0` frames at every record step.
    pub save_trajectory: bool,
    pub save_positions_in_snapshot: bool,
    pub format: Option<String>, // Output format: "json", "bincode", "messagepack"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            base_filename: "colony".to_string(),
            save_positions: true,
            save_stats: true,
            save_trajectory: true,
            save_positions_in_snapshot: false,
            format: Some("json".to_string()),
        }
    }
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct SimulationConfig {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    #[serde(default)]
    pub growth: GrowthConfig,
    #[serde(default)]
    pub cycle: CycleConfig,
    #[serde(default)]
    pub mechanics: MechanicsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects parameter combinations the model cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.timing.dt > 0.0) {
            anyhow::bail!("dt must be positive.");
        }
        if self.timing.record_interval_steps == 0 {
            anyhow::bail!("record_interval_steps must be greater than 0.");
        }
        let ic = &self.initial_conditions;
        if ic.num_founders == 0 {
            anyhow::bail!("num_founders must be greater than 0.");
        }
        if !(ic.radius_average > 0.0) || !(ic.founder_initial_radius > 0.0) {
            anyhow::bail!("radius_average and founder_initial_radius must be positive.");
        }
        if !(0.0..1.0).contains(&ic.max_radius_spread) {
            anyhow::bail!("max_radius_spread must lie in [0, 1).");
        }
        if ic.placement_extent < 0.0 {
            anyhow::bail!("placement_extent must not be negative.");
        }
        if ic.num_founders > 1 && ic.placement_extent <= 0.0 {
            // Coincident founders exert no force on each other and would never separate.
            anyhow::bail!("placement_extent must be positive when num_founders > 1.");
        }
        for (name, value) in [
            ("k_g1_threshold", self.cycle.k_g1_threshold),
            ("k_mitosis", self.cycle.k_mitosis),
            ("bud_radius_fraction", self.cycle.bud_radius_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                anyhow::bail!("{} must lie in (0, 1], got {}.", name, value);
            }
        }
        if self.growth.k_g1 * ic.radius_average + self.growth.k_g2 <= 0.0 {
            anyhow::bail!("growth rate at max radius (k_g1 * radius_average + k_g2) must be positive.");
        }
        if !(self.mechanics.k_exp_decay > 0.0) {
            anyhow::bail!("k_exp_decay must be positive.");
        }
        Ok(())
    }

    /// Converts the configuration into simulation parameters used at runtime.
    pub fn get_sim_params(&self) -> SimParams {
        let ic = &self.initial_conditions;
        let mech = &self.mechanics;
        SimParams {
            dt: self.timing.dt,
            radius_average: ic.radius_average,
            max_radius_spread: ic.max_radius_spread,
            founder_initial_radius: ic.founder_initial_radius,
            placement_extent: ic.placement_extent,
            k_g1: self.growth.k_g1,
            k_g2: self.growth.k_g2,
            k_g1_threshold: self.cycle.k_g1_threshold,
            k_mitosis: self.cycle.k_mitosis,
            bud_radius_fraction: self.cycle.bud_radius_fraction,
            force_model: mech.model,
            k_spring: mech.k_spring,
            k_neighbor: mech.k_neighbor,
            k_repulsion_cell_cell: mech.k_repulsion_cell_cell,
            k_adhesion_mother_bud: mech.k_adhesion_mother_bud,
            k_adhesion_cell_cell: mech.k_adhesion_cell_cell,
            k_r: mech.k_r,
            k_a: mech.k_a,
            linear_spring_accumulate: mech.linear_spring_accumulate,
            k_exp_decay: mech.k_exp_decay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::from_toml_str("").unwrap();
        let params = config.get_sim_params();
        assert_eq!(params.dt, 0.1);
        assert_eq!(params.k_g1_threshold, 0.9);
        assert_eq!(params.k_mitosis, 0.7);
        assert_eq!(params.force_model, ForceModelKind::Spring);
        assert!(!params.linear_spring_accumulate);
        assert_eq!(config.output.format.as_deref(), Some("json"));
    }

    #[test]
    fn sections_override_defaults() {
        let text = r#"
            [timing]
            dt = 0.05
            total_steps = 10

            [mechanics]
            model = "linear_spring"
            k_r = 2.0
            linear_spring_accumulate = true
        "#;
        let config = SimulationConfig::from_toml_str(text).unwrap();
        assert_eq!(config.timing.dt, 0.05);
        assert_eq!(config.timing.total_steps, 10);
        assert_eq!(config.timing.record_interval_steps, 50);
        assert_eq!(config.mechanics.model, ForceModelKind::LinearSpring);
        let params = config.get_sim_params();
        assert_eq!(params.k_r, 2.0);
        assert_eq!(params.k_a, 0.2);
        assert!(params.linear_spring_accumulate);
    }

    #[test]
    fn exponential_model_name_parses() {
        let config = SimulationConfig::from_toml_str("[mechanics]\nmodel = \"exponential\"\n").unwrap();
        assert_eq!(config.mechanics.model, ForceModelKind::Exponential);
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(SimulationConfig::from_toml_str("[mechanics]\nmodel = \"lennard_jones\"\n").is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        assert!(SimulationConfig::from_toml_str("[timing]\ndt = 0.0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[initial_conditions]\nnum_founders = 0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[cycle]\nk_mitosis = 1.5\n").is_err());
        assert!(SimulationConfig::from_toml_str("[mechanics]\nk_exp_decay = 0.0\n").is_err());
        assert!(SimulationConfig::from_toml_str("[initial_conditions]\nnum_founders = 4\n").is_err());
        assert!(SimulationConfig::from_toml_str(
            "[initial_conditions]\nnum_founders = 4\nplacement_extent = 2.0\n"
        )
        .is_ok());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = SimulationConfig::load("/nonexistent/colony.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
