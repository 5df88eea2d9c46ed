//! Planning engine and ranking-threshold sweep
//!
//! Construction computes everything that depends only on topology and physics
//! (zones, ratings, effects). [`PlanningEngine::run`] then sweeps the ranking
//! threshold against one [`CofinanceInfo`]:
//!
//! ```text
//! for s in 1..=min(max_s, ranking_len - 1):
//!     acceptors = top s ranked channels
//!     closure   = root-ward paths of the acceptors
//!     donors    = eligible children of the closure outside it
//!     optimal   = 0/1 knapsack over donors under the budget
//! ```
//!
//! Total effect is not monotonic in `s`: promoting a channel to acceptor can
//! remove it from the donor pool.

use std::collections::HashSet;
use std::sync::Arc;

use floodplan_common::{Cell, ChannelId, ChannelTree, FloodMask, FloodSeries, GridMap};
use tracing::{debug, info, instrument};

use crate::closure::closure_of;
use crate::cofinance::CofinanceInfo;
use crate::config::EngineConfig;
use crate::donor::select_candidates;
use crate::effect::EffectTable;
use crate::error::PlanError;
use crate::optimizer::{optimal_subset, IlpKnapsackSolver, KnapsackSolver};
use crate::plan::{Estimation, ProjectPlan};
use crate::rating::{RatingTable, TargetSampler};
use crate::zone::ZoneIndex;

/// Donor-acceptor planning engine
pub struct PlanningEngine {
    config: EngineConfig,
    tree: Arc<ChannelTree>,
    zones: Arc<ZoneIndex>,
    ratings: RatingTable,
    effects: EffectTable,
    solver: Arc<dyn KnapsackSolver>,
}

impl std::fmt::Debug for PlanningEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanningEngine")
            .field("config", &self.config)
            .field("channels", &self.tree.len())
            .field("solver", &self.solver.name())
            .finish()
    }
}

impl PlanningEngine {
    /// Build zones, ratings and effects for `tree`
    ///
    /// The target map defines the grid; the flood series must match it.
    #[instrument(skip_all, fields(channels = tree.len(), days = flood.len()))]
    pub fn new(
        tree: ChannelTree,
        target: &GridMap,
        flood: &FloodSeries,
        config: EngineConfig,
    ) -> Result<Self, PlanError> {
        config.validate()?;
        let (width, height) = (target.width(), target.height());
        let mask = FloodMask::from_series(flood, width, height)?;
        let zones = ZoneIndex::build(&tree, config.zone_radius, width, height)?;
        let sampler = TargetSampler::new(target, &mask, config.target_value);
        let ratings = RatingTable::build(&tree, &zones, &sampler, config.rating_strategy);
        let effects = EffectTable::build(&tree, flood, &config)?;

        info!(
            width,
            height,
            flooded_cells = mask.flooded_count(),
            strategy = ?config.rating_strategy,
            "Planning engine ready"
        );

        Ok(Self {
            config,
            tree: Arc::new(tree),
            zones: Arc::new(zones),
            ratings,
            effects,
            solver: Arc::new(IlpKnapsackSolver::new()),
        })
    }

    /// Replace the knapsack solver
    pub fn with_solver(mut self, solver: impl KnapsackSolver + 'static) -> Self {
        self.solver = Arc::new(solver);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn tree(&self) -> &ChannelTree {
        &self.tree
    }

    pub fn zones(&self) -> &Arc<ZoneIndex> {
        &self.zones
    }

    pub fn ratings(&self) -> &RatingTable {
        &self.ratings
    }

    pub fn effects(&self) -> &EffectTable {
        &self.effects
    }

    pub fn solver(&self) -> &dyn KnapsackSolver {
        self.solver.as_ref()
    }

    /// Channels ordered by the configured rating strategy
    pub fn ranking(&self) -> &[ChannelId] {
        self.ratings.ranking()
    }

    /// Largest threshold the sweep visits
    pub fn max_threshold(&self) -> usize {
        self.config
            .max_s
            .min(self.ranking().len().saturating_sub(1))
    }

    /// Sweep `s` and collect one estimation per threshold
    #[instrument(skip(self, info), fields(budget = info.budget, solver = self.solver.name()))]
    pub fn run(&self, info: &CofinanceInfo) -> Result<ProjectPlan, PlanError> {
        let max_s = self.max_threshold();
        let mut estimations = Vec::with_capacity(max_s);
        for s in 1..=max_s {
            let estimation = self.estimate(s, info)?;
            debug!(
                s,
                candidates = estimation.potential_donors_count,
                optimal = estimation.optimal_donors_count,
                total_effect = estimation.total_effect,
                total_price = estimation.total_price,
                target_value = estimation.acceptors_target_value,
                "Sweep step"
            );
            estimations.push(estimation);
        }
        info!(estimations = estimations.len(), "Plan sweep complete");
        Ok(ProjectPlan::new(info.budget, estimations, Arc::clone(&self.zones)))
    }

    /// Evaluate a single ranking threshold
    pub fn estimate(&self, s: usize, info: &CofinanceInfo) -> Result<Estimation, PlanError> {
        let acceptors = self.ratings.top(s).to_vec();
        let closure = closure_of(&self.tree, &acceptors);
        let candidates = select_candidates(
            &self.tree,
            &closure,
            &self.ratings,
            &self.effects,
            self.config.eligibility_factor,
        );
        let donors = optimal_subset(self.solver.as_ref(), &candidates, info)?;

        let total_effect = donors.iter().map(|d| d.effect).sum();
        let total_price = donors
            .iter()
            .filter_map(|d| info.price_of(d.channel))
            .sum();

        Ok(Estimation {
            s,
            potential_donors_count: candidates.len(),
            optimal_donors_count: donors.len(),
            total_effect,
            total_price,
            acceptors_target_value: self.acceptors_target_value(&acceptors),
            acceptors,
            candidates,
            donors,
        })
    }

    /// Distinct still-needed target cells across the acceptors' zones
    fn acceptors_target_value(&self, acceptors: &[ChannelId]) -> usize {
        let cells: HashSet<Cell> = acceptors
            .iter()
            .flat_map(|&id| self.ratings.needed_cells(id).iter().copied())
            .collect();
        cells.len()
    }
}
