//! Floodplan CLI
//!
//! Donor-acceptor planning for hydraulic interventions

mod config;
mod inputs;
mod report;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use floodplan_common::{FloodMask, VERSION};
use floodplan_planner::stats::channel_system_stats;
use floodplan_planner::{
    CofinancePriceSearch, LandUseClasses, PlanningEngine, RatingStrategy, ZoneIndex,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{FloodplanConfig, SolverKind};

#[derive(Debug, Parser)]
#[command(name = "floodplan", version, about = "Donor-acceptor planning for hydraulic interventions")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sweep the ranking threshold and write the project plan
    Plan {
        #[command(flatten)]
        inputs: PlanInputs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Plan CSV output
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Plan JSON report output
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Search per-channel cofinancing contributions
    Cofinance {
        #[command(flatten)]
        inputs: PlanInputs,
        #[command(flatten)]
        engine: EngineArgs,
        /// Share of each price that may be cofinanced
        #[arg(long)]
        max_ratio: Option<f64>,
        /// Convergence threshold on the contribution change
        #[arg(long)]
        eps: Option<f64>,
        /// Outcome JSON output, stdout when absent
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Per-channel flooding statistics by land use
    Stats {
        /// Channel tree (.cg or .json)
        #[arg(long)]
        tree: PathBuf,
        /// Land-use GRD
        #[arg(long)]
        land_use: PathBuf,
        /// Flood map GRD, non-zero cells are flooded
        #[arg(long, conflicts_with = "flood_dir")]
        flood_map: Option<PathBuf>,
        /// Flood series directory or .zip archive, used when no flood map is given
        #[arg(long, alias = "flood")]
        flood_dir: Option<PathBuf>,
        #[arg(long)]
        start_day: Option<u32>,
        #[arg(long)]
        end_day: Option<u32>,
        /// Zone radius in cells
        #[arg(long)]
        radius: Option<usize>,
        /// CSV output, stdout when absent
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Args)]
struct PlanInputs {
    /// Channel tree (.cg or .json)
    #[arg(long)]
    tree: PathBuf,
    /// Target map GRD
    #[arg(long)]
    target: PathBuf,
    /// Directory or .zip archive holding H/vx/vy GRD files per day
    #[arg(long, alias = "flood")]
    flood_dir: PathBuf,
    #[arg(long)]
    start_day: Option<u32>,
    #[arg(long)]
    end_day: Option<u32>,
    /// Prices JSON `{"budget": .., "prices": {"<id>": ..}}`
    #[arg(long)]
    prices: Option<PathBuf>,
    /// Budget, replaces the one in the prices file
    #[arg(long)]
    budget: Option<f64>,
    /// Uniform channel price
    #[arg(long, conflicts_with = "prices")]
    price: Option<f64>,
}

#[derive(Debug, Args)]
struct EngineArgs {
    #[arg(long)]
    radius: Option<usize>,
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,
    #[arg(long)]
    max_s: Option<usize>,
    #[arg(long, value_enum)]
    solver: Option<SolverKind>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Count,
    Ratio,
}

impl From<StrategyArg> for RatingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Count => RatingStrategy::TargetCount,
            StrategyArg::Ratio => RatingStrategy::TargetRatio,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr, reports may use stdout
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    info!("Starting Floodplan v{}", VERSION);

    let mut config = FloodplanConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Plan {
            inputs,
            engine,
            csv,
            json,
        } => {
            engine.apply(&mut config);
            let (engine, info) = prepare(&inputs, &mut config)?;
            let plan = engine.run(&info).context("Planning run failed")?;
            info!(
                estimations = plan.len(),
                donors = plan.selected_donors().len(),
                "Plan complete"
            );

            if let Some(path) = json.as_deref() {
                let run_id = report::write_json("plan", &plan, Some(path))?;
                info!(%run_id, path = %path.display(), "Wrote plan report");
            }
            if csv.is_some() || json.is_none() {
                report::write_plan_csv(&plan, csv.as_deref())?;
            }
        }
        Command::Cofinance {
            inputs,
            engine,
            max_ratio,
            eps,
            out,
        } => {
            engine.apply(&mut config);
            if let Some(ratio) = max_ratio {
                config.pricing.max_contribution_ratio = ratio;
            }
            if let Some(eps) = eps {
                config.search.eps = eps;
            }
            let (engine, info) = prepare(&inputs, &mut config)?;
            let limits =
                CofinancePriceSearch::proportional_limits(&info, config.pricing.max_contribution_ratio);
            let outcome = CofinancePriceSearch::new(&engine, info, limits, config.search.clone())
                .context("Invalid cofinance search")?
                .run()
                .context("Cofinance search failed")?;
            info!(
                state = ?outcome.state,
                iterations = outcome.iterations.len(),
                "Cofinance search finished"
            );
            report::write_json("cofinance", &outcome, out.as_deref())?;
        }
        Command::Stats {
            tree,
            land_use,
            flood_map,
            flood_dir,
            start_day,
            end_day,
            radius,
            out,
        } => {
            let tree = inputs::load_tree(&tree)?;
            let land_use = inputs::load_grid(&land_use)?;
            let (width, height) = (land_use.width(), land_use.height());
            let mask = match (flood_map, flood_dir) {
                (Some(path), _) => FloodMask::from_map(&inputs::load_grid(&path)?),
                (None, Some(dir)) => {
                    let series = inputs::load_flood(
                        &dir,
                        start_day.unwrap_or(config.inputs.start_day),
                        end_day.unwrap_or(config.inputs.end_day),
                    )?;
                    FloodMask::from_series(&series, width, height)?
                }
                (None, None) => bail!("stats needs --flood-map or --flood-dir"),
            };

            let radius = radius.unwrap_or(config.engine.zone_radius);
            let zones = ZoneIndex::build(&tree, radius, width, height)?;
            let stats =
                channel_system_stats(&tree, &zones, &mask, &land_use, &LandUseClasses::default())?;
            info!(channels = stats.len(), radius, "Computed channel statistics");
            report::write_stats(&stats, out.as_deref())?;
        }
    }

    Ok(())
}

impl EngineArgs {
    fn apply(&self, config: &mut FloodplanConfig) {
        if let Some(radius) = self.radius {
            config.engine.zone_radius = radius;
        }
        if let Some(strategy) = self.strategy {
            config.engine.rating_strategy = strategy.into();
        }
        if let Some(max_s) = self.max_s {
            config.engine.max_s = max_s;
        }
        if let Some(solver) = self.solver {
            config.solver = solver;
        }
    }
}

/// Load inputs shared by `plan` and `cofinance` and build the engine
fn prepare(
    inputs: &PlanInputs,
    config: &mut FloodplanConfig,
) -> Result<(PlanningEngine, floodplan_planner::CofinanceInfo)> {
    if let Some(day) = inputs.start_day {
        config.inputs.start_day = day;
    }
    if let Some(day) = inputs.end_day {
        config.inputs.end_day = day;
    }
    if let Some(price) = inputs.price {
        config.pricing.price = price;
    }
    config.engine.validate().context("Invalid engine configuration")?;

    let tree = inputs::load_tree(&inputs.tree)?;
    let target = inputs::load_grid(&inputs.target)?;
    let flood = inputs::load_flood(
        &inputs.flood_dir,
        config.inputs.start_day,
        config.inputs.end_day,
    )?;
    let info = inputs::load_cofinance(
        &tree,
        inputs.prices.as_deref(),
        inputs.budget,
        &config.pricing,
    )?;

    let engine = PlanningEngine::new(tree, &target, &flood, config.engine.clone())
        .context("Failed to build planning engine")?;
    let engine = config.solver.install(engine);
    info!(
        solver = engine.solver().name(),
        budget = info.budget,
        max_s = engine.max_threshold(),
        "Engine ready"
    );
    Ok((engine, info))
}
