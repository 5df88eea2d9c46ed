//! 0/1 integer program via good_lp
//!
//! ```text
//! maximise   sum(value_i * x_i)
//! subject to sum(weight_i * x_i) <= budget,  x_i in {0, 1}
//! ```
//!
//! A fresh model is built per call; nothing is shared between solves.
//!
//! The backend accepts small constraint violations. A selection heavier than
//! `budget + BUDGET_TOLERANCE` is discarded and the instance is re-solved
//! exactly with [`BranchAndBoundSolver`], so callers never see an infeasible set.

use good_lp::{default_solver, variable, variables, Expression, Solution, SolverModel, Variable};
use tracing::debug;

use super::{
    validate_input, BranchAndBoundSolver, KnapsackItem, KnapsackSolver, BUDGET_TOLERANCE,
};
use crate::error::SolverError;

/// Knapsack solver backed by the pure-Rust microlp backend
#[derive(Debug, Clone, Copy, Default)]
pub struct IlpKnapsackSolver;

impl IlpKnapsackSolver {
    pub fn new() -> Self {
        Self
    }
}

impl KnapsackSolver for IlpKnapsackSolver {
    fn name(&self) -> &'static str {
        "ilp"
    }

    fn solve(&self, items: &[KnapsackItem], budget: f64) -> Result<Vec<usize>, SolverError> {
        validate_input(items, budget)?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut vars = variables!();
        let picks: Vec<Variable> = items.iter().map(|_| vars.add(variable().binary())).collect();

        let mut objective = Expression::default();
        let mut cost = Expression::default();
        for (item, &pick) in items.iter().zip(&picks) {
            objective.add_mul(item.value, pick);
            cost.add_mul(item.weight, pick);
        }

        let solution = vars
            .maximise(objective)
            .using(default_solver)
            .with(cost.leq(budget))
            .solve()
            .map_err(|e| SolverError::NotOptimal(e.to_string()))?;

        // binaries come back as floats; round to the nearest decision
        let selected: Vec<usize> = picks
            .iter()
            .enumerate()
            .filter(|&(_, &pick)| solution.value(pick) > 0.5)
            .map(|(i, _)| i)
            .collect();

        let weight: f64 = selected.iter().map(|&i| items[i].weight).sum();
        if weight > budget + BUDGET_TOLERANCE {
            debug!(weight, budget, "ILP selection over budget, re-solving exactly");
            return BranchAndBoundSolver::new().solve(items, budget);
        }
        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cofinance::CofinanceInfo;
    use crate::donor::Donor;
    use crate::optimizer::optimal_subset;
    use floodplan_common::ChannelId;

    #[test]
    fn test_classic_instance() {
        let items = [
            KnapsackItem::new(60.0, 10.0),
            KnapsackItem::new(100.0, 20.0),
            KnapsackItem::new(120.0, 30.0),
        ];
        let selected = IlpKnapsackSolver::new().solve(&items, 50.0).unwrap();
        assert_eq!(selected, vec![1, 2]);
    }

    #[test]
    fn test_item_just_over_budget_is_not_selected() {
        let items = [KnapsackItem::new(1.0, 1.000_000_05)];
        assert!(IlpKnapsackSolver::new().solve(&items, 1.0).unwrap().is_empty());

        let donors = [Donor::new(ChannelId(3), 1.0)];
        let info = CofinanceInfo::new(1.0, [(ChannelId(3), 1.000_000_05)].into());
        let chosen = optimal_subset(&IlpKnapsackSolver::new(), &donors, &info).unwrap();
        assert!(chosen.is_empty());
    }

    #[test]
    fn test_exact_fit_is_selected() {
        let items = [KnapsackItem::new(2.0, 1.0), KnapsackItem::new(1.0, 0.5)];
        assert_eq!(IlpKnapsackSolver::new().solve(&items, 1.5).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_zero_budget_selects_only_free_items() {
        let items = [KnapsackItem::new(5.0, 1.0), KnapsackItem::new(2.0, 0.0)];
        let selected = IlpKnapsackSolver::new().solve(&items, 0.0).unwrap();
        assert_eq!(selected, vec![1]);
    }

    #[test]
    fn test_empty_and_invalid() {
        assert!(IlpKnapsackSolver::new().solve(&[], 3.0).unwrap().is_empty());
        assert!(matches!(
            IlpKnapsackSolver::new().solve(&[], -3.0),
            Err(SolverError::InvalidInput(_))
        ));
    }
}
