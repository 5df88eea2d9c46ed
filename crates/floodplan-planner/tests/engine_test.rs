//! End-to-end planning scenarios

mod common;

use common::*;
use floodplan_common::{ChannelId, ChannelTree, FloodSeries};
use floodplan_planner::{
    BranchAndBoundSolver, CofinanceInfo, EngineConfig, Estimation, PlanError, PlanningEngine,
    RatingStrategy,
};

fn engine(fixture: FiveReach) -> PlanningEngine {
    PlanningEngine::new(fixture.tree, &fixture.target, &fixture.flood, scenario_config()).unwrap()
}

fn effect_ids(estimation: &Estimation) -> Vec<i64> {
    estimation.donors.iter().map(|d| d.channel.0).collect()
}

#[test]
fn test_five_reach_ranking() {
    let engine = engine(five_reach());
    assert_eq!(engine.ranking(), ids(&[2, 3, 1, 4, 5]).as_slice());
    assert_eq!(engine.max_threshold(), 4);
    assert_eq!(
        engine.ratings().rating_of(ChannelId(2), RatingStrategy::TargetCount),
        4.0
    );
}

#[test]
fn test_five_reach_single_price_budget() {
    let engine = engine(five_reach());
    let info = CofinanceInfo::uniform(engine.tree(), 1.0, 1.0);
    let plan = engine.run(&info).unwrap();
    assert_eq!(plan.len(), 4);

    let first = plan.estimation(1).unwrap();
    assert_eq!(first.acceptors, ids(&[2]));
    // closure {A, R}: non-closure children are C, D and B
    assert_eq!(first.potential_donors_count, 3);
    assert_eq!(
        first.candidates.iter().map(|d| d.channel.0).collect::<Vec<_>>(),
        vec![4, 5, 3]
    );
    assert_eq!(first.optimal_donors_count, 1);
    assert_eq!(effect_ids(first), vec![5]);
    assert!((first.total_effect - 4.0 * UNIT_EFFECT).abs() < 1e-9);
    assert_eq!(first.total_effect, first.donors[0].effect);
    assert_eq!(first.acceptors_target_value, 4);

    for estimation in &plan.estimations {
        assert!(estimation.optimal_donors_count <= 1);
        assert!(estimation.total_price <= info.budget + 1e-9);
    }

    let last = plan.estimation(4).unwrap();
    assert_eq!(last.acceptors, ids(&[2, 3, 1, 4]));
    assert_eq!(effect_ids(last), vec![5]);
    assert_eq!(plan.estimation(2).unwrap().acceptors_target_value, 8);
}

#[test]
fn test_larger_budget_takes_two_donors() {
    let engine = engine(five_reach());
    let plan = engine.run(&CofinanceInfo::uniform(engine.tree(), 2.0, 1.0)).unwrap();
    let first = plan.estimation(1).unwrap();
    assert_eq!(effect_ids(first), vec![4, 5]);
    assert!((first.total_effect - 7.0 * UNIT_EFFECT).abs() < 1e-9);
    assert_eq!(first.total_price, 2.0);
}

#[test]
fn test_zero_budget_selects_nothing() {
    let engine = engine(five_reach());
    let plan = engine.run(&CofinanceInfo::uniform(engine.tree(), 0.0, 1.0)).unwrap();
    assert!(!plan.is_empty());
    for estimation in &plan.estimations {
        assert_eq!(estimation.optimal_donors_count, 0);
        assert_eq!(estimation.total_effect, 0.0);
        assert_eq!(estimation.total_price, 0.0);
    }
}

#[test]
fn test_solvers_agree_on_scenario() {
    let fixture = five_reach();
    let ilp = engine(five_reach());
    let bnb = PlanningEngine::new(fixture.tree, &fixture.target, &fixture.flood, scenario_config())
        .unwrap()
        .with_solver(BranchAndBoundSolver::new());
    for budget in [0.0, 1.0, 2.0, 3.5] {
        let info = CofinanceInfo::uniform(ilp.tree(), budget, 1.0);
        let a = ilp.run(&info).unwrap();
        let b = bnb.run(&info).unwrap();
        for (x, y) in a.estimations.iter().zip(&b.estimations) {
            assert!((x.total_effect - y.total_effect).abs() < 1e-9);
        }
    }
}

#[test]
fn test_total_effect_is_not_monotonic() {
    // R -> A, B; A outranks B. At s=1, B is the only donor; at s=2 it is an
    // acceptor and the donor pool is empty.
    let tree = ChannelTree::new(vec![
        straight(1, 2, 2, 4).with_child(2).with_child(3),
        straight(2, 2, 10, 4),
        straight(3, 12, 10, 4),
    ])
    .unwrap();
    let targets = [(2, 9), (3, 9), (12, 9)];
    let target = target_map(20, 20, &targets);
    let flood = flood_series(20, 20, &targets, &[((14, 10), 3.0)]);
    let engine = PlanningEngine::new(tree, &target, &flood, scenario_config()).unwrap();
    assert_eq!(engine.ranking(), ids(&[2, 3, 1]).as_slice());

    let plan = engine.run(&CofinanceInfo::uniform(engine.tree(), 5.0, 1.0)).unwrap();
    let s1 = plan.estimation(1).unwrap();
    let s2 = plan.estimation(2).unwrap();
    assert_eq!(effect_ids(s1), vec![3]);
    assert!(s1.total_effect > 0.0);
    assert_eq!(s2.potential_donors_count, 0);
    assert!(s2.total_effect < s1.total_effect);
}

#[test]
fn test_ratio_strategy_changes_ranking() {
    // A has more target cells, B a smaller zone and a higher ratio
    let tree = ChannelTree::new(vec![
        straight(1, 0, 0, 1).with_child(2).with_child(3),
        straight(2, 2, 10, 6),
        straight(3, 15, 10, 1),
    ])
    .unwrap();
    let targets = [(2, 9), (3, 9), (4, 9), (15, 9), (16, 9)];
    let target = target_map(20, 20, &targets);
    let flood = flood_series(20, 20, &targets, &[]);

    let count = PlanningEngine::new(
        tree.clone(),
        &target,
        &flood,
        scenario_config(),
    )
    .unwrap();
    assert_eq!(count.ranking()[0], ChannelId(2));

    let ratio = PlanningEngine::new(
        tree,
        &target,
        &flood,
        EngineConfig {
            rating_strategy: RatingStrategy::TargetRatio,
            ..scenario_config()
        },
    )
    .unwrap();
    assert_eq!(ratio.ranking()[0], ChannelId(3));
}

#[test]
fn test_missing_price_is_an_error() {
    let engine = engine(five_reach());
    let mut info = CofinanceInfo::uniform(engine.tree(), 1.0, 1.0);
    info.prices.remove(&ChannelId(4));
    let err = engine.run(&info).unwrap_err();
    assert_eq!(err, PlanError::MissingPrice(ChannelId(4)));
}

#[test]
fn test_runs_are_repeatable() {
    let engine = engine(five_reach());
    let info = CofinanceInfo::uniform(engine.tree(), 2.0, 1.0);
    let a = engine.run(&info).unwrap();
    let b = engine.run(&info).unwrap();
    assert_eq!(a.estimations, b.estimations);
}

#[test]
fn test_parallel_runs_share_engine() {
    let engine = engine(five_reach());
    std::thread::scope(|scope| {
        let handles: Vec<_> = [1.0, 2.0, 3.0]
            .into_iter()
            .map(|budget| {
                let engine = &engine;
                scope.spawn(move || {
                    engine
                        .run(&CofinanceInfo::uniform(engine.tree(), budget, 1.0))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().len(), 4);
        }
    });
}

#[test]
fn test_flood_shape_must_match_target() {
    let fixture = five_reach();
    let flood = flood_series(10, 10, &[], &[]);
    let err = PlanningEngine::new(fixture.tree, &fixture.target, &flood, scenario_config())
        .unwrap_err();
    assert!(matches!(err, PlanError::Grid(_)));

    let fixture = five_reach();
    assert!(PlanningEngine::new(
        fixture.tree,
        &fixture.target,
        &FloodSeries::empty(),
        scenario_config()
    )
    .is_ok());
}
