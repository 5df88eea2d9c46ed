//! Budget optimizer
//!
//! Picks the donor subset with the largest total effect whose total price fits
//! the budget: a 0/1 knapsack. Solvers sit behind [`KnapsackSolver`] so the
//! ILP backend and the exact branch-and-bound can be swapped or cross-checked.

pub mod branch_bound;
pub mod ilp;

pub use branch_bound::BranchAndBoundSolver;
pub use ilp::IlpKnapsackSolver;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cofinance::CofinanceInfo;
use crate::donor::Donor;
use crate::error::{PlanError, SolverError};

/// Tolerance for the post-solve budget check
pub const BUDGET_TOLERANCE: f64 = 1e-9;

/// One 0/1 decision: its value and its weight (price)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnapsackItem {
    pub value: f64,
    pub weight: f64,
}

impl KnapsackItem {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }
}

/// 0/1 knapsack solver
///
/// Implementations must return the indices of an optimal subset of `items`
/// whose total weight does not exceed `budget`.
pub trait KnapsackSolver: Send + Sync {
    /// Solver name for logs
    fn name(&self) -> &'static str;

    /// Solve, returning selected item indices in ascending order
    fn solve(&self, items: &[KnapsackItem], budget: f64) -> Result<Vec<usize>, SolverError>;
}

/// Reject budgets and items no solver should see
pub fn validate_input(items: &[KnapsackItem], budget: f64) -> Result<(), SolverError> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(SolverError::InvalidInput(format!(
            "budget must be finite and non-negative, got {budget}"
        )));
    }
    for (i, item) in items.iter().enumerate() {
        if !item.weight.is_finite() || item.weight < 0.0 {
            return Err(SolverError::InvalidInput(format!(
                "item {i} has invalid price {}",
                item.weight
            )));
        }
        if !item.value.is_finite() {
            return Err(SolverError::InvalidInput(format!(
                "item {i} has invalid effect {}",
                item.value
            )));
        }
    }
    Ok(())
}

/// Optimal donor subset under the prices and budget of `info`
pub fn optimal_subset(
    solver: &dyn KnapsackSolver,
    donors: &[Donor],
    info: &CofinanceInfo,
) -> Result<Vec<Donor>, PlanError> {
    let items = donors
        .iter()
        .map(|donor| {
            info.price_of(donor.channel)
                .map(|price| KnapsackItem::new(donor.effect, price))
                .ok_or(PlanError::MissingPrice(donor.channel))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut selected = solver.solve(&items, info.budget)?;
    selected.sort_unstable();
    selected.dedup();
    if let Some(&bad) = selected.iter().find(|&&i| i >= items.len()) {
        return Err(SolverError::NotOptimal(format!(
            "{} returned index {bad} for {} items",
            solver.name(),
            items.len()
        ))
        .into());
    }

    let total: f64 = selected.iter().map(|&i| items[i].weight).sum();
    if total > info.budget + BUDGET_TOLERANCE {
        return Err(PlanError::BudgetExceeded {
            total,
            budget: info.budget,
        });
    }

    debug!(
        solver = solver.name(),
        candidates = donors.len(),
        selected = selected.len(),
        total_price = total,
        "Solved donor subset"
    );
    Ok(selected.into_iter().map(|i| donors[i]).collect())
}
