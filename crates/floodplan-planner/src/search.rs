//! Cofinance price search
//!
//! Each channel ("agent") may receive a cofinancing contribution in
//! `[0, max_contribution]` that lowers its effective price:
//!
//! ```text
//! effective_price = project_price - contribution
//! ```
//!
//! Every outer iteration scans agents in ranking order. An agent that is not
//! selected as a donor in any estimation of the current plan gets its maximum
//! contribution tried first; if that selects it, the contribution is bisected down
//! to the smallest selecting level and committed. The search converges when the
//! L2 norm between successive price vectors drops below `eps`.
//!
//! Contributions only grow, so the search always terminates. It is a per-agent
//! local search and gives no global optimality guarantee.

use std::collections::{BTreeMap, BTreeSet};

use floodplan_common::ChannelId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::cofinance::CofinanceInfo;
use crate::config::SearchConfig;
use crate::engine::PlanningEngine;
use crate::error::SearchError;
use crate::plan::ProjectPlan;

/// Search state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    /// Waiting for the next agent or iteration
    Idle,
    /// Looking for an improvable agent
    PerAgentScan,
    /// Narrowing the contribution of one agent
    Bisect,
    /// Writing back a selecting contribution
    Commit,
    /// Price vector stopped moving
    Converged,
    /// Iteration cap reached
    Exhausted,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SearchState::Converged | SearchState::Exhausted)
    }

    fn can_move_to(self, next: SearchState) -> bool {
        use SearchState::*;
        matches!(
            (self, next),
            (Idle, PerAgentScan)
                | (Idle, Converged)
                | (Idle, Exhausted)
                | (PerAgentScan, PerAgentScan)
                | (PerAgentScan, Bisect)
                | (PerAgentScan, Idle)
                | (Bisect, Commit)
                | (Bisect, PerAgentScan)
                | (Commit, Idle)
        )
    }
}

/// One outer iteration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchIteration {
    pub iteration: usize,
    /// L2 distance to the previous price vector
    pub norm: f64,
    /// Union of optimal donors after the iteration
    pub selected: Vec<ChannelId>,
    /// Effective prices after the iteration
    pub prices: BTreeMap<ChannelId, f64>,
}

/// Final result of a search
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// `Converged` or `Exhausted`
    pub state: SearchState,
    pub iterations: Vec<SearchIteration>,
    /// Committed contribution per agent
    pub contributions: BTreeMap<ChannelId, f64>,
    /// Effective prices at the end
    pub prices: BTreeMap<ChannelId, f64>,
    /// Plan under the final prices
    pub plan: ProjectPlan,
}

impl SearchOutcome {
    pub fn converged(&self) -> bool {
        self.state == SearchState::Converged
    }
}

/// Fixed-point search over per-agent contributions
pub struct CofinancePriceSearch<'a> {
    engine: &'a PlanningEngine,
    config: SearchConfig,
    project: CofinanceInfo,
    max_contributions: BTreeMap<ChannelId, f64>,
    contributions: BTreeMap<ChannelId, f64>,
    state: SearchState,
}

impl<'a> CofinancePriceSearch<'a> {
    /// Create a search starting from zero contributions
    ///
    /// Agents without an entry in `max_contributions` are never cofinanced.
    pub fn new(
        engine: &'a PlanningEngine,
        project: CofinanceInfo,
        max_contributions: BTreeMap<ChannelId, f64>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        for (&channel, &max) in &max_contributions {
            let price = project.price_of(channel).unwrap_or(0.0);
            if !max.is_finite() || max < 0.0 || max > price {
                return Err(SearchError::InvalidContribution {
                    channel,
                    max,
                    price,
                });
            }
        }
        let contributions = max_contributions.keys().map(|&id| (id, 0.0)).collect();
        Ok(Self {
            engine,
            config,
            project,
            max_contributions,
            contributions,
            state: SearchState::Idle,
        })
    }

    /// Allow every priced channel a contribution of `ratio` of its price
    pub fn proportional_limits(project: &CofinanceInfo, ratio: f64) -> BTreeMap<ChannelId, f64> {
        let ratio = ratio.clamp(0.0, 1.0);
        project
            .prices
            .iter()
            .map(|(&id, &price)| (id, price * ratio))
            .collect()
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    fn transition(&mut self, next: SearchState) {
        debug_assert!(
            self.state.can_move_to(next),
            "invalid search transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// Effective prices for a contribution vector
    fn effective_prices(&self, contributions: &BTreeMap<ChannelId, f64>) -> BTreeMap<ChannelId, f64> {
        self.project
            .prices
            .iter()
            .map(|(&id, &price)| {
                let contribution = contributions.get(&id).copied().unwrap_or(0.0);
                (id, (price - contribution).max(0.0))
            })
            .collect()
    }

    fn plan_for(&self, contributions: &BTreeMap<ChannelId, f64>) -> Result<ProjectPlan, SearchError> {
        let info = CofinanceInfo::new(self.project.budget, self.effective_prices(contributions));
        Ok(self.engine.run(&info)?)
    }

    /// Plan with one agent's contribution replaced
    fn try_contribution(&self, agent: ChannelId, contribution: f64) -> Result<ProjectPlan, SearchError> {
        let mut trial = self.contributions.clone();
        trial.insert(agent, contribution);
        self.plan_for(&trial)
    }

    /// Run until convergence or the iteration cap
    #[instrument(skip(self), fields(agents = self.max_contributions.len(), eps = self.config.eps))]
    pub fn run(mut self) -> Result<SearchOutcome, SearchError> {
        let mut plan = self.plan_for(&self.contributions)?;
        let mut selected = plan.selected_donors();
        let mut prices = self.effective_prices(&self.contributions);
        let mut iterations = Vec::new();
        let ranking: Vec<ChannelId> = self.engine.ranking().to_vec();

        for iteration in 1..=self.config.max_iterations {
            self.transition(SearchState::PerAgentScan);
            for &agent in &ranking {
                if selected.contains(&agent) {
                    continue;
                }
                let Some(&max) = self.max_contributions.get(&agent) else {
                    continue;
                };
                let current = self.contributions.get(&agent).copied().unwrap_or(0.0);
                if current >= max {
                    continue;
                }

                self.transition(SearchState::Bisect);
                let max_plan = self.try_contribution(agent, max)?;
                if !max_plan.selected_donors().contains(&agent) {
                    debug!(iteration, agent = %agent, max, "Max contribution does not select agent");
                    self.transition(SearchState::PerAgentScan);
                    continue;
                }

                let (contribution, agent_plan, steps) = self.bisect(agent, current, max, max_plan)?;

                self.transition(SearchState::Commit);
                debug!(iteration, agent = %agent, contribution, steps, "Committed contribution");
                self.contributions.insert(agent, contribution);
                selected = agent_plan.selected_donors();
                plan = agent_plan;
                self.transition(SearchState::Idle);
                self.transition(SearchState::PerAgentScan);
            }
            self.transition(SearchState::Idle);

            let next_prices = self.effective_prices(&self.contributions);
            let norm = l2_distance(&prices, &next_prices);
            prices = next_prices;
            iterations.push(SearchIteration {
                iteration,
                norm,
                selected: selected.iter().copied().collect(),
                prices: prices.clone(),
            });
            debug!(iteration, norm, selected = selected.len(), "Search iteration");

            if norm < self.config.eps {
                self.transition(SearchState::Converged);
                break;
            }
        }

        if !self.state.is_terminal() {
            self.transition(SearchState::Exhausted);
            warn!(
                iterations = iterations.len(),
                "Cofinance search hit the iteration cap without converging"
            );
        } else {
            info!(iterations = iterations.len(), "Cofinance search converged");
        }

        Ok(SearchOutcome {
            state: self.state,
            iterations,
            contributions: self.contributions,
            prices,
            plan,
        })
    }

    /// Smallest tried contribution in `(low, high]` that selects `agent`
    ///
    /// `high` is known to select; `low` is known not to.
    fn bisect(
        &self,
        agent: ChannelId,
        mut low: f64,
        mut high: f64,
        mut high_plan: ProjectPlan,
    ) -> Result<(f64, ProjectPlan, usize), SearchError> {
        let mut steps = 0;
        while high - low >= self.config.eps && steps < self.config.max_bisection_steps {
            let mid = 0.5 * (low + high);
            let mid_plan = self.try_contribution(agent, mid)?;
            if mid_plan.selected_donors().contains(&agent) {
                high = mid;
                high_plan = mid_plan;
            } else {
                low = mid;
            }
            steps += 1;
        }
        Ok((high, high_plan, steps))
    }
}

/// L2 distance over the union of keys (missing entries count as 0)
pub fn l2_distance(a: &BTreeMap<ChannelId, f64>, b: &BTreeMap<ChannelId, f64>) -> f64 {
    let keys: BTreeSet<ChannelId> = a.keys().chain(b.keys()).copied().collect();
    keys.iter()
        .map(|k| {
            let d = a.get(k).copied().unwrap_or(0.0) - b.get(k).copied().unwrap_or(0.0);
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_distance() {
        let a: BTreeMap<ChannelId, f64> = [(ChannelId(1), 1.0), (ChannelId(2), 2.0)].into();
        let b: BTreeMap<ChannelId, f64> = [(ChannelId(1), 4.0), (ChannelId(3), 4.0)].into();
        // (1-4)^2 + 2^2 + 4^2 = 29
        assert!((l2_distance(&a, &b) - 29f64.sqrt()).abs() < 1e-12);
        assert_eq!(l2_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_state_transitions() {
        assert!(SearchState::Idle.can_move_to(SearchState::PerAgentScan));
        assert!(SearchState::PerAgentScan.can_move_to(SearchState::Bisect));
        assert!(SearchState::Bisect.can_move_to(SearchState::Commit));
        assert!(SearchState::Commit.can_move_to(SearchState::Idle));
        assert!(!SearchState::Converged.can_move_to(SearchState::Idle));
        assert!(!SearchState::Idle.can_move_to(SearchState::Commit));
        assert!(SearchState::Exhausted.is_terminal());
    }

    #[test]
    fn test_proportional_limits() {
        let info = CofinanceInfo::new(1.0, [(ChannelId(1), 2.0), (ChannelId(2), 4.0)].into());
        let limits = CofinancePriceSearch::proportional_limits(&info, 0.5);
        assert_eq!(limits[&ChannelId(1)], 1.0);
        assert_eq!(limits[&ChannelId(2)], 2.0);
    }
}
