//! Input loading

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use floodplan_common::formats::{cg, flood_dir, flood_zip, grd};
use floodplan_common::{ChannelTree, FloodSeries, GridMap};
use floodplan_planner::CofinanceInfo;
use tracing::info;

use crate::config::PricingSettings;

/// Load a channel tree from a `.json` record or a CG file
pub fn load_tree(path: &Path) -> Result<ChannelTree> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let tree = if is_json {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse tree {}", path.display()))?
    } else {
        cg::read_cg_file(path).with_context(|| format!("Failed to read CG {}", path.display()))?
    };
    info!(path = %path.display(), channels = tree.len(), root = ?tree.root(), "Loaded channel tree");
    Ok(tree)
}

pub fn load_grid(path: &Path) -> Result<GridMap> {
    grd::read_grd_file(path).with_context(|| format!("Failed to read grid {}", path.display()))
}

/// Load a flood series from a directory or a `.zip` archive of GRD files
pub fn load_flood(source: &Path, start: u32, end: u32) -> Result<FloodSeries> {
    let is_zip = source.is_file()
        && source
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    let series = if is_zip {
        flood_zip::read_flood_zip(source, start, end)
    } else {
        flood_dir::read_flood_dir(source, start, end)
    };
    series.with_context(|| {
        format!("Failed to read flood days {start}..={end} from {}", source.display())
    })
}

/// Load prices from JSON, or price every channel uniformly
///
/// An explicit `budget` replaces the one stored in the prices file.
pub fn load_cofinance(
    tree: &ChannelTree,
    prices: Option<&Path>,
    budget: Option<f64>,
    pricing: &PricingSettings,
) -> Result<CofinanceInfo> {
    match prices {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
            let mut info: CofinanceInfo = serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("Failed to parse prices {}", path.display()))?;
            if let Some(budget) = budget {
                info.budget = budget;
            }
            info!(
                path = %path.display(),
                priced = info.prices.len(),
                budget = info.budget,
                "Loaded prices"
            );
            Ok(info)
        }
        None => Ok(CofinanceInfo::uniform(
            tree,
            budget.unwrap_or(pricing.budget),
            pricing.price,
        )),
    }
}
