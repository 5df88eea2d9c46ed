//! Channel system land-use statistics
//!
//! For every channel zone, cells of a land-use map are split into three class
//! groups (non-cadastral, economic, social) and counted as flooded or not.
//! Self stats come from a top-down pass; aggregated stats (self plus every
//! descendant) from a bottom-up pass.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::ops::AddAssign;

use floodplan_common::{ChannelId, ChannelTree, FloodMask, GridError, GridMap};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::zone::ZoneIndex;

/// Land-use class groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandUseClasses {
    /// Value marking non-cadastral land
    pub non_cadastral: OrderedFloat<f64>,
    /// Values of economic use
    pub economic: HashSet<OrderedFloat<f64>>,
    /// Values of social use
    pub social: HashSet<OrderedFloat<f64>>,
}

impl LandUseClasses {
    pub fn new(
        non_cadastral: f64,
        economic: impl IntoIterator<Item = f64>,
        social: impl IntoIterator<Item = f64>,
    ) -> Self {
        Self {
            non_cadastral: OrderedFloat(non_cadastral),
            economic: economic.into_iter().map(OrderedFloat).collect(),
            social: social.into_iter().map(OrderedFloat).collect(),
        }
    }
}

impl Default for LandUseClasses {
    fn default() -> Self {
        Self::new(
            8888.0,
            [37.0, 38.0, 39.0, 43.0, 44.0, 45.0],
            [58.0, 61.0, 63.0, 66.0, 171.0, 186.0, 195.0, 203.0, 207.0],
        )
    }
}

/// Cell counts for one channel or subtree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Point count
    pub length: usize,
    pub non_cadastral_flooded: usize,
    pub non_cadastral_not_flooded: usize,
    pub economic_flooded: usize,
    pub economic_not_flooded: usize,
    pub social_not_flooded: usize,
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Self) {
        self.length += other.length;
        self.non_cadastral_flooded += other.non_cadastral_flooded;
        self.non_cadastral_not_flooded += other.non_cadastral_not_flooded;
        self.economic_flooded += other.economic_flooded;
        self.economic_not_flooded += other.economic_not_flooded;
        self.social_not_flooded += other.social_not_flooded;
    }
}

/// Self and subtree stats of one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel_id: ChannelId,
    pub self_stats: Stats,
    pub aggregated: Stats,
}

/// Compute stats for every channel, returned in bottom-up order
pub fn channel_system_stats(
    tree: &ChannelTree,
    zones: &ZoneIndex,
    flooded: &FloodMask,
    land_use: &GridMap,
    classes: &LandUseClasses,
) -> Result<Vec<ChannelStats>, GridError> {
    land_use.ensure_shape(zones.width(), zones.height())?;

    let mut self_stats: HashMap<ChannelId, Stats> = HashMap::with_capacity(tree.len());
    tree.visit_top_down(|channel| {
        let mut stats = Stats {
            length: channel.points.len(),
            ..Default::default()
        };
        if let Some(zone) = zones.zone_of(channel.id) {
            for cell in zone.iter() {
                let Some(value) = land_use.at(cell) else {
                    continue;
                };
                let value = OrderedFloat(value);
                let is_flooded = flooded.is_flooded(cell);
                if value == classes.non_cadastral {
                    if is_flooded {
                        stats.non_cadastral_flooded += 1;
                    } else {
                        stats.non_cadastral_not_flooded += 1;
                    }
                } else if classes.economic.contains(&value) {
                    if is_flooded {
                        stats.economic_flooded += 1;
                    } else {
                        stats.economic_not_flooded += 1;
                    }
                } else if classes.social.contains(&value) && !is_flooded {
                    stats.social_not_flooded += 1;
                }
            }
        }
        self_stats.insert(channel.id, stats);
    });

    let mut aggregated: HashMap<ChannelId, Stats> = HashMap::with_capacity(tree.len());
    let mut result = Vec::with_capacity(tree.len());
    tree.visit_bottom_up(|channel| {
        let own = self_stats.get(&channel.id).copied().unwrap_or_default();
        let mut total = own;
        for child in &channel.children {
            if let Some(&child_total) = aggregated.get(child) {
                total += child_total;
            }
        }
        aggregated.insert(channel.id, total);
        result.push(ChannelStats {
            channel_id: channel.id,
            self_stats: own,
            aggregated: total,
        });
    });

    debug!(channels = result.len(), "Computed channel system stats");
    Ok(result)
}

/// CSV header for stats reports
pub const STATS_CSV_HEADER: &str = "channel_id,length,nc_flooded,nc_not_flooded,eco_flooded,eco_not_flooded,soc_not_flooded,\
agg_length,agg_nc_flooded,agg_nc_not_flooded,agg_eco_flooded,agg_eco_not_flooded,agg_soc_not_flooded";

/// Write stats as CSV, one row per channel
pub fn write_stats_csv<W: Write>(stats: &[ChannelStats], mut writer: W) -> std::io::Result<()> {
    writeln!(writer, "{STATS_CSV_HEADER}")?;
    for entry in stats {
        let s = &entry.self_stats;
        let a = &entry.aggregated;
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{}",
            entry.channel_id,
            s.length,
            s.non_cadastral_flooded,
            s.non_cadastral_not_flooded,
            s.economic_flooded,
            s.economic_not_flooded,
            s.social_not_flooded,
            a.length,
            a.non_cadastral_flooded,
            a.non_cadastral_not_flooded,
            a.economic_flooded,
            a.economic_not_flooded,
            a.social_not_flooded
        )?;
    }
    writer.flush()
}
