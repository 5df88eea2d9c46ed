//! CLI configuration
//!
//! Layered, later sources win:
//! 1. built-in defaults
//! 2. optional TOML file
//! 3. `FLOODPLAN__`-prefixed environment variables (`.env` is read first)
//! 4. command-line flags, applied by the caller

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use floodplan_planner::{
    BranchAndBoundSolver, EngineConfig, IlpKnapsackSolver, PlanningEngine, SearchConfig,
};
use serde::{Deserialize, Serialize};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "FLOODPLAN";

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_FILE: &str = "floodplan.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloodplanConfig {
    /// Planning engine settings
    pub engine: EngineConfig,
    /// Cofinance search settings
    pub search: SearchConfig,
    /// Input selection
    pub inputs: InputSettings,
    /// Budget and generated prices
    pub pricing: PricingSettings,
    /// Knapsack backend
    pub solver: SolverKind,
}

/// Which flood days to load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSettings {
    pub start_day: u32,
    pub end_day: u32,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            start_day: 20,
            end_day: 39,
        }
    }
}

/// Budget and uniform price used when no price file is given
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    pub budget: f64,
    pub price: f64,
    /// Share of each price that may be cofinanced
    pub max_contribution_ratio: f64,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self {
            budget: 1.0,
            price: 1.0,
            max_contribution_ratio: 0.5,
        }
    }
}

/// Knapsack backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Integer program through good_lp / microlp
    #[default]
    Ilp,
    /// Exact branch and bound
    BranchAndBound,
}

impl SolverKind {
    /// Install the selected solver on an engine
    pub fn install(self, engine: PlanningEngine) -> PlanningEngine {
        match self {
            SolverKind::Ilp => engine.with_solver(IlpKnapsackSolver::new()),
            SolverKind::BranchAndBound => engine.with_solver(BranchAndBoundSolver::new()),
        }
    }
}

impl FloodplanConfig {
    /// Load defaults, the config file and environment overrides
    ///
    /// An explicitly given file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let cfg: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")?;

        cfg.engine
            .validate()
            .context("Invalid engine configuration")?;
        cfg.search
            .validate()
            .context("Invalid search configuration")?;
        Ok(cfg)
    }
}
