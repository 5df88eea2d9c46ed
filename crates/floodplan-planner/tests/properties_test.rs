//! Property tests over random trees, maps and knapsack instances

mod common;

use std::collections::BTreeSet;

use common::*;
use floodplan_common::formats::cg::{read_cg, write_cg};
use floodplan_common::{ChannelTree, FloodMask, FloodSeries, GridMap};
use floodplan_planner::closure::{ancestors_of, closure_of};
use floodplan_planner::rating::{RatingTable, TargetSampler};
use floodplan_planner::{
    BranchAndBoundSolver, CofinanceInfo, EngineConfig, IlpKnapsackSolver, KnapsackItem,
    KnapsackSolver, PlanningEngine, RatingStrategy, ZoneIndex,
};
use proptest::prelude::*;

fn random_engine(tree: ChannelTree, target: &GridMap, flood: &FloodSeries) -> PlanningEngine {
    let config = EngineConfig {
        zone_radius: 2,
        ..Default::default()
    };
    PlanningEngine::new(tree, target, flood, config)
        .unwrap()
        .with_solver(BranchAndBoundSolver::new())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_rating_bounds(
        tree in arb_tree(),
        target in arb_map(vec![0.0, 3.0]),
        flood in arb_flood(),
    ) {
        let mask = FloodMask::from_series(&flood, 16, 16).unwrap();
        let zones = ZoneIndex::build(&tree, 2, 16, 16).unwrap();
        let sampler = TargetSampler::new(&target, &mask, 3.0);
        let table = RatingTable::build(&tree, &zones, &sampler, RatingStrategy::TargetRatio);
        for id in tree.ids() {
            let zone_len = zones.zone_of(id).unwrap().len() as f64;
            let ratio = table.rating_of(id, RatingStrategy::TargetRatio);
            let count = table.rating_of(id, RatingStrategy::TargetCount);
            prop_assert!((0.0..=1.0).contains(&ratio));
            prop_assert!(count >= 0.0 && count <= zone_len);
        }

        let again = RatingTable::build(&tree, &zones, &sampler, RatingStrategy::TargetRatio);
        prop_assert_eq!(table.ranking(), again.ranking());
    }

    #[test]
    fn prop_zone_index_is_deterministic(tree in arb_tree(), radius in 0usize..4) {
        let a = ZoneIndex::build(&tree, radius, 16, 16).unwrap();
        let b = ZoneIndex::build(&tree, radius, 16, 16).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_plan_invariants(
        tree in arb_tree(),
        target in arb_map(vec![0.0, 3.0]),
        flood in arb_flood(),
        budget in 0.0f64..4.0,
        price in 0.1f64..2.0,
    ) {
        let engine = random_engine(tree, &target, &flood);
        let info = CofinanceInfo::uniform(engine.tree(), budget, price);
        let plan = engine.run(&info).unwrap();
        prop_assert_eq!(plan.len(), engine.max_threshold());

        let mut previous: BTreeSet<_> = BTreeSet::new();
        for estimation in &plan.estimations {
            prop_assert!(estimation.total_price <= budget + 1e-9);
            prop_assert!(estimation.optimal_donors_count <= estimation.potential_donors_count);

            let closure = closure_of(engine.tree(), &estimation.acceptors);
            for donor in &estimation.candidates {
                let parent = engine.tree().parent(donor.channel).unwrap();
                prop_assert!(closure.contains(&parent));
                prop_assert!(!closure.contains(&donor.channel));
                prop_assert!(!estimation.acceptors.contains(&donor.channel));
                // a donor never sits on the root-ward path of an acceptor
                for &acceptor in &estimation.acceptors {
                    prop_assert!(!ancestors_of(engine.tree(), acceptor).contains(&donor.channel));
                }
            }

            let acceptors: BTreeSet<_> = estimation.acceptors.iter().copied().collect();
            prop_assert!(previous.is_subset(&acceptors));
            previous = acceptors;
        }
    }

    #[test]
    fn prop_tree_round_trips(tree in arb_tree()) {
        let mut cg = Vec::new();
        write_cg(&tree, &mut cg).unwrap();
        let from_cg = read_cg(cg.as_slice()).unwrap();
        prop_assert_eq!(&from_cg, &tree);

        let json = serde_json::to_string(&tree).unwrap();
        let from_json: ChannelTree = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(&from_json, &tree);
        for channel in tree.channels() {
            prop_assert_eq!(from_json.parent(channel.id), tree.parent(channel.id));
            prop_assert_eq!(&from_json.get(channel.id).unwrap().points, &channel.points);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_solvers_agree(
        items in prop::collection::vec((0.0f64..100.0, 0.0f64..50.0), 0..10),
        budget in 0.0f64..150.0,
    ) {
        let items: Vec<KnapsackItem> =
            items.into_iter().map(|(v, w)| KnapsackItem::new(v, w)).collect();

        let ilp = IlpKnapsackSolver::new().solve(&items, budget).unwrap();
        let bnb = BranchAndBoundSolver::new().solve(&items, budget).unwrap();

        let weight = |sel: &[usize]| sel.iter().map(|&i| items[i].weight).sum::<f64>();
        prop_assert!(weight(&ilp) <= budget + 1e-6);
        prop_assert!(weight(&bnb) <= budget + 1e-9);

        let (a, b) = (selection_value(&items, &ilp), selection_value(&items, &bnb));
        prop_assert!((a - b).abs() <= 1e-6 * (1.0 + a.abs()), "ilp={} bnb={}", a, b);
    }
}
