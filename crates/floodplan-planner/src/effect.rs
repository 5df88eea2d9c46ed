//! Volume effect estimation
//!
//! The effect of damming a channel is the flow volume conveyed past one
//! representative point over the flood series:
//!
//! ```text
//! effect = sum over days of sqrt(vx^2 + vy^2) * h * seconds_per_day / 1e6
//! ```
//!
//! The representative is the point at `representative_point` (default 2,
//! clear of junction noise). Channels with at most `min_points_for_effect`
//! points have zero effect.

use std::collections::HashMap;

use floodplan_common::{Channel, ChannelId, ChannelTree, FloodSeries, GridError};
use tracing::debug;

use crate::config::{EffectPolicy, EngineConfig};

/// Volume scale (cubic meters to millions)
const VOLUME_SCALE: f64 = 1e6;

/// Memoized effect per channel
#[derive(Debug, Clone, Default)]
pub struct EffectTable {
    effects: HashMap<ChannelId, f64>,
}

impl EffectTable {
    /// Estimate effects for every channel of `tree`
    pub fn build(
        tree: &ChannelTree,
        series: &FloodSeries,
        config: &EngineConfig,
    ) -> Result<Self, GridError> {
        let mut effects = HashMap::with_capacity(tree.len());
        for channel in tree.channels() {
            effects.insert(channel.id, estimate_effect(channel, series, config)?);
        }
        debug!(
            channels = effects.len(),
            days = series.len(),
            "Estimated channel effects"
        );
        Ok(Self { effects })
    }

    /// Effect of a channel (0 for unknown channels)
    pub fn effect_of(&self, id: ChannelId) -> f64 {
        self.effects.get(&id).copied().unwrap_or(0.0)
    }
}

/// Estimate the effect of one channel
pub fn estimate_effect(
    channel: &Channel,
    series: &FloodSeries,
    config: &EngineConfig,
) -> Result<f64, GridError> {
    if channel.points.len() <= config.min_points_for_effect {
        return Ok(0.0);
    }
    let Some(&point) = channel.points.get(config.representative_point) else {
        return Ok(0.0);
    };

    let mut gross = 0.0;
    for day in series.days() {
        let cell = day.h.cell_of(point)?;
        // no-data in any component contributes nothing for the day
        if let (Some(h), Some(speed)) = (day.height_at(cell), day.speed_at(cell)) {
            gross += speed * h * config.seconds_per_day / VOLUME_SCALE;
        }
    }

    Ok(match config.effect_policy {
        EffectPolicy::Gross => gross,
        EffectPolicy::NetOfBaseline {
            volume_per_point,
            floor_at_zero,
        } => {
            let net = gross - volume_per_point * channel.points.len() as f64;
            if floor_at_zero {
                net.max(0.0)
            } else {
                net
            }
        }
    })
}
