//! Donor candidate selection
//!
//! A donor candidate is a channel hanging off the acceptor closure: its parent
//! is in the closure and it is not. It must also be eligible, i.e. its zone
//! serves fewer target cells than `eligibility_factor * point_count`.

use std::collections::HashSet;

use floodplan_common::{ChannelId, ChannelTree};
use serde::{Deserialize, Serialize};

use crate::effect::EffectTable;
use crate::rating::RatingTable;

/// Channel proposed to host an intervention, with its estimated effect
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Donor {
    pub channel: ChannelId,
    pub effect: f64,
}

impl Donor {
    pub fn new(channel: ChannelId, effect: f64) -> Self {
        Self { channel, effect }
    }
}

/// Donor candidates for an acceptor closure, in top-down order
pub fn select_candidates(
    tree: &ChannelTree,
    closure: &HashSet<ChannelId>,
    ratings: &RatingTable,
    effects: &EffectTable,
    eligibility_factor: f64,
) -> Vec<Donor> {
    tree.channels()
        .filter(|channel| {
            let Some(parent) = tree.parent(channel.id) else {
                return false;
            };
            closure.contains(&parent)
                && !closure.contains(&channel.id)
                && is_eligible(
                    ratings.served_count(channel.id),
                    channel.points.len(),
                    eligibility_factor,
                )
        })
        .map(|channel| Donor::new(channel.id, effects.effect_of(channel.id)))
        .collect()
}

/// Whether a channel serving `served` target cells may still be dammed
#[inline]
pub fn is_eligible(served: usize, point_count: usize, eligibility_factor: f64) -> bool {
    (served as f64) < eligibility_factor * point_count as f64
}
