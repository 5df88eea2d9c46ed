//! Exact branch-and-bound knapsack
//!
//! Items are explored in decreasing value density. A branch is pruned when the
//! greedy fractional relaxation of the remaining items cannot beat the best
//! selection found so far.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use super::{validate_input, KnapsackItem, KnapsackSolver, BUDGET_TOLERANCE};
use crate::error::SolverError;

/// Minimum improvement that replaces the incumbent
const VALUE_EPS: f64 = 1e-12;

/// Dependency-free exact solver
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    pub fn new() -> Self {
        Self
    }
}

impl KnapsackSolver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, items: &[KnapsackItem], budget: f64) -> Result<Vec<usize>, SolverError> {
        validate_input(items, budget)?;

        // Items without positive value never improve the objective.
        let mut order: Vec<usize> = (0..items.len()).filter(|&i| items[i].value > 0.0).collect();
        order.sort_by_key(|&i| Reverse(OrderedFloat(density(&items[i]))));

        let mut search = Search {
            items,
            order: &order,
            budget: budget + BUDGET_TOLERANCE,
            best_value: 0.0,
            best: Vec::new(),
            current: Vec::with_capacity(order.len()),
        };
        search.branch(0, 0.0, 0.0);

        let mut best = search.best;
        best.sort_unstable();
        Ok(best)
    }
}

fn density(item: &KnapsackItem) -> f64 {
    if item.weight > 0.0 {
        item.value / item.weight
    } else {
        f64::INFINITY
    }
}

struct Search<'a> {
    items: &'a [KnapsackItem],
    order: &'a [usize],
    budget: f64,
    best_value: f64,
    best: Vec<usize>,
    current: Vec<usize>,
}

impl Search<'_> {
    /// Fractional relaxation over `order[depth..]`
    fn bound(&self, depth: usize, mut value: f64, mut weight: f64) -> f64 {
        for &i in &self.order[depth..] {
            let item = &self.items[i];
            if weight + item.weight <= self.budget {
                weight += item.weight;
                value += item.value;
            } else {
                let room = (self.budget - weight).max(0.0);
                return value + item.value * room / item.weight;
            }
        }
        value
    }

    fn branch(&mut self, depth: usize, value: f64, weight: f64) {
        if value > self.best_value + VALUE_EPS {
            self.best_value = value;
            self.best.clone_from(&self.current);
        }
        if depth == self.order.len() || self.bound(depth, value, weight) <= self.best_value + VALUE_EPS
        {
            return;
        }

        let i = self.order[depth];
        let item = self.items[i];
        if weight + item.weight <= self.budget {
            self.current.push(i);
            self.branch(depth + 1, value + item.value, weight + item.weight);
            self.current.pop();
        }
        self.branch(depth + 1, value, weight);
    }
}
