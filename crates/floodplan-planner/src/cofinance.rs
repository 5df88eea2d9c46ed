//! Cofinance input: budget and per-channel prices

use std::collections::BTreeMap;

use floodplan_common::{ChannelId, ChannelTree};
use serde::{Deserialize, Serialize};

/// Budget and price list for one planning run
///
/// Immutable once handed to the engine; each run takes a fresh value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CofinanceInfo {
    /// Total budget the selected donors must fit in
    pub budget: f64,
    /// Effective price of damming each channel
    pub prices: BTreeMap<ChannelId, f64>,
}

impl CofinanceInfo {
    pub fn new(budget: f64, prices: BTreeMap<ChannelId, f64>) -> Self {
        Self { budget, prices }
    }

    /// Same price for every channel of the tree
    pub fn uniform(tree: &ChannelTree, budget: f64, price: f64) -> Self {
        Self {
            budget,
            prices: tree.ids().map(|id| (id, price)).collect(),
        }
    }

    /// Price of a channel
    pub fn price_of(&self, id: ChannelId) -> Option<f64> {
        self.prices.get(&id).copied()
    }
}
