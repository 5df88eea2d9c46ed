//! Target rating and acceptor ranking
//!
//! A target cell "needs intervention" when the target map marks it with the
//! configured value and the flood series never wetted it. A target cell that
//! was flooded is "served". Both counts are sampled once per channel zone.

use std::cmp::Reverse;
use std::collections::HashMap;

use floodplan_common::{Cell, ChannelId, ChannelTree, FloodMask, GridMap};
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::config::RatingStrategy;
use crate::zone::ZoneIndex;

/// Classifies target cells against a flood mask
#[derive(Debug, Clone, Copy)]
pub struct TargetSampler<'a> {
    target: &'a GridMap,
    flooded: &'a FloodMask,
    target_value: f64,
}

impl<'a> TargetSampler<'a> {
    pub fn new(target: &'a GridMap, flooded: &'a FloodMask, target_value: f64) -> Self {
        Self {
            target,
            flooded,
            target_value,
        }
    }

    #[inline]
    fn is_target(&self, cell: Cell) -> bool {
        self.target.at(cell) == Some(self.target_value)
    }

    /// Target cell that was never flooded
    #[inline]
    pub fn needs_intervention(&self, cell: Cell) -> bool {
        self.is_target(cell) && !self.flooded.is_flooded(cell)
    }

    /// Target cell already reached by water
    #[inline]
    pub fn is_served(&self, cell: Cell) -> bool {
        self.is_target(cell) && self.flooded.is_flooded(cell)
    }
}

/// Per-channel ratings plus the ranking they induce
#[derive(Debug, Clone)]
pub struct RatingTable {
    strategy: RatingStrategy,
    counts: HashMap<ChannelId, f64>,
    ratios: HashMap<ChannelId, f64>,
    served: HashMap<ChannelId, usize>,
    needed_cells: HashMap<ChannelId, Vec<Cell>>,
    ranking: Vec<ChannelId>,
}

impl RatingTable {
    /// Rate every channel of `tree`
    ///
    /// Ranking is a stable descending sort over top-down traversal order, so
    /// ties keep tree order.
    pub fn build(
        tree: &ChannelTree,
        zones: &ZoneIndex,
        sampler: &TargetSampler<'_>,
        strategy: RatingStrategy,
    ) -> Self {
        let mut counts = HashMap::with_capacity(tree.len());
        let mut ratios = HashMap::with_capacity(tree.len());
        let mut served = HashMap::with_capacity(tree.len());
        let mut needed_cells = HashMap::with_capacity(tree.len());

        for id in tree.ids() {
            let (needed, served_count, zone_len) = match zones.zone_of(id) {
                Some(zone) => {
                    let needed: Vec<Cell> =
                        zone.iter().filter(|&c| sampler.needs_intervention(c)).collect();
                    let served_count = zone.iter().filter(|&c| sampler.is_served(c)).count();
                    (needed, served_count, zone.len())
                }
                None => (Vec::new(), 0, 0),
            };
            let count = needed.len() as f64;
            let ratio = if zone_len > 0 { count / zone_len as f64 } else { 0.0 };
            counts.insert(id, count);
            ratios.insert(id, ratio);
            served.insert(id, served_count);
            needed_cells.insert(id, needed);
        }

        let table = match strategy {
            RatingStrategy::TargetCount => &counts,
            RatingStrategy::TargetRatio => &ratios,
        };
        let mut ranking: Vec<ChannelId> = tree.ids().collect();
        ranking.sort_by_key(|id| Reverse(OrderedFloat(table.get(id).copied().unwrap_or(0.0))));

        debug!(
            channels = ranking.len(),
            strategy = ?strategy,
            top = ?ranking.first(),
            "Built rating table"
        );

        Self {
            strategy,
            counts,
            ratios,
            served,
            needed_cells,
            ranking,
        }
    }

    /// Strategy that produced the ranking
    pub fn strategy(&self) -> RatingStrategy {
        self.strategy
    }

    /// Rating of a channel under either strategy (0 for unknown channels)
    pub fn rating_of(&self, id: ChannelId, strategy: RatingStrategy) -> f64 {
        let table = match strategy {
            RatingStrategy::TargetCount => &self.counts,
            RatingStrategy::TargetRatio => &self.ratios,
        };
        table.get(&id).copied().unwrap_or(0.0)
    }

    /// Channels ordered by rating, highest first
    pub fn ranking(&self) -> &[ChannelId] {
        &self.ranking
    }

    /// First `s` entries of the ranking
    pub fn top(&self, s: usize) -> &[ChannelId] {
        &self.ranking[..s.min(self.ranking.len())]
    }

    /// Target cells in the zone already reached by water
    pub fn served_count(&self, id: ChannelId) -> usize {
        self.served.get(&id).copied().unwrap_or(0)
    }

    /// Target cells in the zone that still need intervention
    pub fn needed_cells(&self, id: ChannelId) -> &[Cell] {
        self.needed_cells.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }
}
