//! # Floodplan Planner
//!
//! Donor-acceptor planning engine for hydraulic interventions.
//!
//! ## Pipeline
//!
//! ```text
//! ChannelTree + TargetMap + FloodSeries
//!     -> zones -> ratings -> (per s) acceptors -> closure
//!     -> donor candidates -> budget optimizer -> Estimation -> ProjectPlan
//! ```
//!
//! Zones, ratings and effects are computed once in [`PlanningEngine::new`];
//! every [`PlanningEngine::run`] call is a pure function of those caches and the
//! supplied [`CofinanceInfo`].
//!
//! [`CofinancePriceSearch`] wraps the sweep in a fixed-point loop over
//! per-channel cofinancing contributions. It is a heuristic local search, not
//! an exact optimizer.

pub mod closure;
pub mod cofinance;
pub mod config;
pub mod donor;
pub mod effect;
pub mod engine;
pub mod error;
pub mod optimizer;
pub mod plan;
pub mod rating;
pub mod search;
pub mod stats;
pub mod zone;

pub use cofinance::CofinanceInfo;
pub use config::{EffectPolicy, EngineConfig, RatingStrategy, SearchConfig};
pub use donor::Donor;
pub use engine::PlanningEngine;
pub use error::{PlanError, SearchError, SolverError};
pub use optimizer::{BranchAndBoundSolver, IlpKnapsackSolver, KnapsackItem, KnapsackSolver};
pub use plan::{Estimation, ProjectPlan};
pub use search::{CofinancePriceSearch, SearchIteration, SearchOutcome, SearchState};
pub use stats::{ChannelStats, LandUseClasses, Stats};
pub use zone::{Zone, ZoneIndex};
