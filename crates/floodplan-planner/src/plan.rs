//! Project plans and reports

use std::collections::BTreeSet;
use std::io::Write;
use std::sync::Arc;

use floodplan_common::{ChannelId, GridMap};
use serde::{Deserialize, Serialize};

use crate::donor::Donor;
use crate::zone::ZoneIndex;

/// CSV header for plan reports
pub const CSV_HEADER: &str = "s,pdc,odc,effect,target_val,price";

/// Result for one ranking threshold `s`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimation {
    /// Ranking threshold
    pub s: usize,
    /// Number of donor candidates
    pub potential_donors_count: usize,
    /// Number of donors in the optimal subset
    pub optimal_donors_count: usize,
    /// Sum of optimal donor effects
    pub total_effect: f64,
    /// Sum of optimal donor prices
    pub total_price: f64,
    /// Distinct still-needed target cells across acceptor zones
    pub acceptors_target_value: usize,
    /// Top-`s` ranked channels
    pub acceptors: Vec<ChannelId>,
    /// All donor candidates, top-down
    pub candidates: Vec<Donor>,
    /// Optimal donor subset
    pub donors: Vec<Donor>,
}

/// Ordered estimations over the `s` sweep
#[derive(Debug, Clone, Serialize)]
pub struct ProjectPlan {
    /// Budget the plan was solved under
    pub budget: f64,
    /// Grid width of the zone index
    pub width: usize,
    /// Grid height of the zone index
    pub height: usize,
    pub estimations: Vec<Estimation>,
    #[serde(skip)]
    zones: Arc<ZoneIndex>,
}

impl ProjectPlan {
    pub fn new(budget: f64, estimations: Vec<Estimation>, zones: Arc<ZoneIndex>) -> Self {
        Self {
            budget,
            width: zones.width(),
            height: zones.height(),
            estimations,
            zones,
        }
    }

    /// Shared zone index
    pub fn zones(&self) -> &Arc<ZoneIndex> {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.estimations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimations.is_empty()
    }

    /// Estimation for threshold `s`
    pub fn estimation(&self, s: usize) -> Option<&Estimation> {
        self.estimations.iter().find(|e| e.s == s)
    }

    /// Union of optimal donors across every estimation
    pub fn selected_donors(&self) -> BTreeSet<ChannelId> {
        self.estimations
            .iter()
            .flat_map(|e| e.donors.iter().map(|d| d.channel))
            .collect()
    }

    /// Write one CSV row per estimation
    pub fn write_csv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        writeln!(writer, "{CSV_HEADER}")?;
        for e in &self.estimations {
            writeln!(
                writer,
                "{},{},{},{},{},{}",
                e.s,
                e.potential_donors_count,
                e.optimal_donors_count,
                e.total_effect,
                e.acceptors_target_value,
                e.total_price
            )?;
        }
        writer.flush()
    }

    /// 1.0 on acceptor zone cells, 0.0 elsewhere
    pub fn acceptor_zone_mask(&self, estimation: &Estimation) -> GridMap {
        self.zone_mask(estimation.acceptors.iter().copied())
    }

    /// 1.0 on optimal donor zone cells, 0.0 elsewhere
    pub fn donor_zone_mask(&self, estimation: &Estimation) -> GridMap {
        self.zone_mask(estimation.donors.iter().map(|d| d.channel))
    }

    fn zone_mask(&self, channels: impl Iterator<Item = ChannelId>) -> GridMap {
        let mut mask = GridMap::filled(self.width, self.height, 0.0);
        for id in channels {
            if let Some(zone) = self.zones.zone_of(id) {
                for cell in zone.iter() {
                    // zone cells are clipped to the grid
                    let _ = mask.set(cell.x, cell.y, 1.0);
                }
            }
        }
        mask
    }
}
