//! Planner error types

use floodplan_common::{ChannelId, FloodplanError, GridError, TopologyError};
use thiserror::Error;

/// 0/1 solver failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    #[error("Solver did not reach an optimal solution: {0}")]
    NotOptimal(String),

    #[error("Invalid solver input: {0}")]
    InvalidInput(String),
}

/// Planning failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("No price for donor channel {0}")]
    MissingPrice(ChannelId),

    #[error("Selected donors cost {total} which exceeds budget {budget}")]
    BudgetExceeded { total: f64, budget: f64 },

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Cofinance search failures
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("Invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("Channel {channel}: max contribution {max} outside [0, {price}]")]
    InvalidContribution {
        channel: ChannelId,
        max: f64,
        price: f64,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl From<PlanError> for FloodplanError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Grid(e) => FloodplanError::Grid(e),
            PlanError::Topology(e) => FloodplanError::Topology(e),
            other => FloodplanError::Internal(other.to_string()),
        }
    }
}

impl From<SearchError> for FloodplanError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Plan(e) => e.into(),
            other => FloodplanError::Internal(other.to_string()),
        }
    }
}
