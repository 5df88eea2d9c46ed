//! Shared fixtures for planner integration tests
#![allow(dead_code)]

use floodplan_common::{Channel, ChannelId, ChannelTree, FloodDay, FloodSeries, GridMap};
use floodplan_planner::{EngineConfig, KnapsackItem};
use proptest::prelude::*;

/// Effect of one day at unit height and unit speed
pub const UNIT_EFFECT: f64 = 86_400.0 / 1e6;

/// Horizontal channel of `len` points starting at (x, y)
pub fn straight(id: i64, x: i32, y: i32, len: i32) -> Channel {
    Channel::new(id).with_points((0..len).map(|i| (x + i, y)))
}

/// Grid with 3.0 on the given cells and 0.0 elsewhere
pub fn target_map(width: usize, height: usize, targets: &[(usize, usize)]) -> GridMap {
    let mut map = GridMap::filled(width, height, 0.0);
    for &(x, y) in targets {
        map.set(x, y, 3.0).unwrap();
    }
    map
}

/// One flood day: height 1.0 everywhere except `dry` cells, flow along x only
/// at the listed cells
pub fn flood_series(
    width: usize,
    height: usize,
    dry: &[(usize, usize)],
    speeds: &[((usize, usize), f64)],
) -> FloodSeries {
    let mut h = GridMap::filled(width, height, 1.0);
    for &(x, y) in dry {
        h.set(x, y, 0.0).unwrap();
    }
    let mut vx = GridMap::filled(width, height, 0.0);
    for &((x, y), speed) in speeds {
        vx.set(x, y, speed).unwrap();
    }
    let vy = GridMap::filled(width, height, 0.0);
    FloodSeries::new(vec![FloodDay::new(1, h, vx, vy).unwrap()]).unwrap()
}

/// Config used by the hand-built scenarios
pub fn scenario_config() -> EngineConfig {
    EngineConfig {
        zone_radius: 1,
        ..Default::default()
    }
}

/// Five-channel network on a 30x30 grid
///
/// ```text
/// R(1) -> A(2), B(3)
/// A(2) -> C(4), D(5)
/// ```
///
/// A and B each carry four dry target cells. Representative speeds give
/// effects R=5u, A=1u, B=2u, C=3u, D=4u.
pub struct FiveReach {
    pub tree: ChannelTree,
    pub target: GridMap,
    pub flood: FloodSeries,
}

pub fn five_reach() -> FiveReach {
    let tree = ChannelTree::new(vec![
        straight(1, 12, 2, 4).with_child(2).with_child(3),
        straight(2, 4, 10, 4).with_child(4).with_child(5),
        straight(3, 20, 10, 4),
        straight(4, 2, 20, 4),
        straight(5, 10, 20, 4),
    ])
    .unwrap();
    let targets: Vec<(usize, usize)> = (4..8)
        .map(|x| (x, 9))
        .chain((20..24).map(|x| (x, 9)))
        .collect();
    let target = target_map(30, 30, &targets);
    let flood = flood_series(
        30,
        30,
        &targets,
        &[
            ((14, 2), 5.0),
            ((6, 10), 1.0),
            ((22, 10), 2.0),
            ((4, 20), 3.0),
            ((12, 20), 4.0),
        ],
    );
    FiveReach {
        tree,
        target,
        flood,
    }
}

pub fn ids(raw: &[i64]) -> Vec<ChannelId> {
    raw.iter().map(|&i| ChannelId(i)).collect()
}

/// Total value of a knapsack selection
pub fn selection_value(items: &[KnapsackItem], selected: &[usize]) -> f64 {
    selected.iter().map(|&i| items[i].value).sum()
}

/// Random tree on a 16x16 grid: channel `i` hangs off `seed % i`
pub fn arb_tree() -> impl Strategy<Value = ChannelTree> {
    prop::collection::vec(
        (
            any::<usize>(),
            prop::collection::vec((0i32..16, 0i32..16), 0..6),
        ),
        1..12,
    )
    .prop_map(|nodes| {
        let mut channels: Vec<Channel> = nodes
            .iter()
            .enumerate()
            .map(|(i, (_, points))| Channel::new(i as i64 + 1).with_points(points.iter().copied()))
            .collect();
        for (i, (seed, _)) in nodes.iter().enumerate().skip(1) {
            let parent = seed % i;
            channels[parent].children.push(ChannelId(i as i64 + 1));
        }
        ChannelTree::new(channels).unwrap()
    })
}

/// Random 16x16 map with values drawn from `values`
pub fn arb_map(values: Vec<f64>) -> impl Strategy<Value = GridMap> {
    prop::collection::vec(prop::sample::select(values), 256).prop_map(|cells| {
        GridMap::from_values(16, 16, floodplan_common::GridBounds::unit(16, 16), cells).unwrap()
    })
}

/// Random single-day flood series on a 16x16 grid
pub fn arb_flood() -> impl Strategy<Value = FloodSeries> {
    (
        arb_map(vec![0.0, 0.0, 0.5, 1.0]),
        arb_map(vec![0.0, 1.0, 2.0]),
        arb_map(vec![0.0, -1.0, 1.5]),
    )
        .prop_map(|(h, vx, vy)| FloodSeries::new(vec![FloodDay::new(1, h, vx, vy).unwrap()]).unwrap())
}
