//! Engine and search configuration

use floodplan_common::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, SearchError};

/// How channels are scored for acceptor ranking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingStrategy {
    /// Number of still-needed target cells in the zone
    #[default]
    TargetCount,
    /// Still-needed target cells divided by zone size
    TargetRatio,
}

/// Effect formula variant
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectPolicy {
    /// Time-integrated volume at the representative point, as is
    #[default]
    Gross,
    /// Gross volume minus `volume_per_point * point_count`
    NetOfBaseline {
        volume_per_point: f64,
        floor_at_zero: bool,
    },
}

/// Planning engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chebyshev radius of a channel zone, in cells
    pub zone_radius: usize,
    /// Target-map value marking ecologically significant cells
    pub target_value: f64,
    /// Strategy used to rank acceptors
    pub rating_strategy: RatingStrategy,
    /// Donor is eligible while served target cells < factor * point count
    pub eligibility_factor: f64,
    /// Upper bound for the ranking threshold sweep
    pub max_s: usize,
    /// Effect formula variant
    pub effect_policy: EffectPolicy,
    /// Index of the point sampled for effect estimation
    pub representative_point: usize,
    /// Channels with at most this many points have zero effect
    pub min_points_for_effect: usize,
    /// Seconds represented by one flood day
    pub seconds_per_day: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            zone_radius: 10,
            target_value: 3.0,
            rating_strategy: RatingStrategy::TargetCount,
            eligibility_factor: 2.0,
            max_s: 150,
            effect_policy: EffectPolicy::Gross,
            representative_point: 2,
            min_points_for_effect: 3,
            seconds_per_day: SECONDS_PER_DAY,
        }
    }
}

impl EngineConfig {
    /// Reject configurations the engine cannot evaluate
    pub fn validate(&self) -> Result<(), PlanError> {
        if !self.eligibility_factor.is_finite() || self.eligibility_factor < 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "eligibility_factor must be finite and non-negative, got {}",
                self.eligibility_factor
            )));
        }
        if !self.seconds_per_day.is_finite() || self.seconds_per_day <= 0.0 {
            return Err(PlanError::InvalidConfig(format!(
                "seconds_per_day must be positive, got {}",
                self.seconds_per_day
            )));
        }
        // Effect needs more than `min_points_for_effect` points, so this keeps
        // the representative index in range.
        if self.representative_point > self.min_points_for_effect {
            return Err(PlanError::InvalidConfig(format!(
                "representative_point {} is not covered by min_points_for_effect {}",
                self.representative_point, self.min_points_for_effect
            )));
        }
        if let EffectPolicy::NetOfBaseline { volume_per_point, .. } = self.effect_policy {
            if !volume_per_point.is_finite() {
                return Err(PlanError::InvalidConfig(
                    "volume_per_point must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Cofinance price search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Convergence threshold for the price-vector L2 norm and bisection width
    pub eps: f64,
    /// Outer iteration cap
    pub max_iterations: usize,
    /// Bisection step budget per agent
    pub max_bisection_steps: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            eps: 1e-3,
            max_iterations: 50,
            max_bisection_steps: 32,
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<(), SearchError> {
        if !self.eps.is_finite() || self.eps <= 0.0 {
            return Err(SearchError::InvalidConfig(format!(
                "eps must be positive, got {}",
                self.eps
            )));
        }
        if self.max_iterations == 0 {
            return Err(SearchError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
