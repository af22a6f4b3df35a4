//! Behavior tests of the MCTS/UCT planner.

use std::sync::Arc;

use chronoroute::{
    Action, Environment, EnvironmentConfig, LocationSpec, MctsConfig, MctsPolicy, Policy,
    Recommendation, RewardShaping, State, TreePolicy,
};

/// Two-action bandit: one edge to a rewarding goal, one to a worthless dead
/// end, both at a constant duration.
fn bandit_env() -> Arc<Environment> {
    let config = EnvironmentConfig {
        reward_scaling_max: 25.0,
        goal_reward: 1.0,
        dead_end_reward: 0.0,
        reward_shaping: RewardShaping::Sparse,
        goal_location: "G".to_string(),
    };
    Arc::new(
        Environment::new(
            &config,
            vec![0.0, 10.0],
            vec![
                LocationSpec::new("S", false)
                    .with_edge("G", vec![1.0, 1.0])
                    .with_edge("D", vec![1.0, 1.0]),
                LocationSpec::new("G", true),
                LocationSpec::new("D", false),
            ],
        )
        .unwrap(),
    )
}

fn search_config() -> MctsConfig {
    MctsConfig {
        tree_budget: 60,
        rollout_horizon: 5,
        ..MctsConfig::default()
    }
}

#[test]
fn uct_recommends_the_dominant_action() {
    let env = bandit_env();
    let start = State::new(0.0, env.find_location("S").unwrap());
    for seed in 0..10 {
        let mut policy =
            MctsPolicy::new(Arc::clone(&env), search_config(), Some(seed)).unwrap();
        let action = policy.apply(&start).unwrap();
        assert_eq!(action, Action::new("G"), "seed {seed}");
    }
}

#[test]
fn vanilla_tree_policy_also_finds_the_goal() {
    let env = bandit_env();
    let start = State::new(0.0, env.find_location("S").unwrap());
    let config = MctsConfig {
        tree_policy: TreePolicy::Vanilla,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(3)).unwrap();
    assert_eq!(policy.apply(&start).unwrap(), Action::new("G"));
}

#[test]
fn most_visited_recommendation_matches_on_the_bandit() {
    let env = bandit_env();
    let start = State::new(0.0, env.find_location("S").unwrap());
    let config = MctsConfig {
        recommendation: Recommendation::MostVisited,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(9)).unwrap();
    assert_eq!(policy.apply(&start).unwrap(), Action::new("G"));
}

#[test]
fn root_visits_account_for_every_iteration() {
    let env = bandit_env();
    let start = State::new(0.0, env.find_location("S").unwrap());
    let budget = 37;
    let config = MctsConfig {
        tree_budget: budget,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(1)).unwrap();
    let plan = policy.plan(&start).unwrap();
    let tree = &plan.tree;
    let visits: usize = tree
        .decision(tree.root())
        .children()
        .iter()
        .map(|&child| tree.chance(child).visits())
        .sum();
    // The root is never terminal here, so every iteration lands one sample
    // on exactly one root child.
    assert_eq!(visits, budget as usize);
}

#[test]
fn planning_at_a_dead_end_reports_no_actions() {
    let env = bandit_env();
    let dead_end = State::new(0.0, env.find_location("D").unwrap());
    let mut policy = MctsPolicy::new(Arc::clone(&env), search_config(), Some(1)).unwrap();
    assert!(matches!(
        policy.apply(&dead_end),
        Err(chronoroute::Error::NoActionsAvailable { .. })
    ));
}

/// Chain where the second leg's duration collapses from 100 to 0 over the
/// day, making the frozen and dynamic models reach the goal at very
/// different times.
fn shifting_chain_env() -> Arc<Environment> {
    let config = EnvironmentConfig {
        goal_location: "G".to_string(),
        ..EnvironmentConfig::default()
    };
    Arc::new(
        Environment::new(
            &config,
            vec![0.0, 10.0],
            vec![
                LocationSpec::new("A", false).with_edge("M", vec![10.0, 10.0]),
                LocationSpec::new("M", false).with_edge("G", vec![100.0, 0.0]),
                LocationSpec::new("G", true),
            ],
        )
        .unwrap(),
    )
}

fn goal_arrival_times(policy: &mut MctsPolicy, start: &State) -> Vec<f64> {
    let plan = policy.plan(start).unwrap();
    let tree = &plan.tree;
    let mut times = Vec::new();
    for &chance in tree.decision(tree.root()).children() {
        for &decision in tree.chance(chance).children() {
            for &leaf_chance in tree.decision(decision).children() {
                for &leaf in tree.chance(leaf_chance).children() {
                    times.push(tree.decision(leaf).state().time);
                }
            }
        }
    }
    times
}

#[test]
fn dynamic_model_walks_the_clock_forward() {
    let env = shifting_chain_env();
    let start = State::new(0.0, env.find_location("A").unwrap());
    let config = MctsConfig {
        tree_budget: 8,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(2)).unwrap();
    let times = goal_arrival_times(&mut policy, &start);
    // Arriving at M at t=10, the M -> G table reads 0 there.
    assert!(!times.is_empty());
    assert!(times.iter().all(|&t| t == 10.0));
}

#[test]
fn frozen_model_keeps_the_root_time() {
    let env = shifting_chain_env();
    let start = State::new(0.0, env.find_location("A").unwrap());
    let config = MctsConfig {
        tree_budget: 8,
        is_model_dynamic: false,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(2)).unwrap();
    let times = goal_arrival_times(&mut policy, &start);
    // Every in-tree transition is evaluated at the root's time 0, where the
    // M -> G table reads 100.
    assert!(!times.is_empty());
    assert!(times.iter().all(|&t| t == 110.0));
}

#[test]
fn tree_reuse_skips_rebuilding_on_a_matching_subtree() {
    let env = shifting_chain_env();
    let start = State::new(0.0, env.find_location("A").unwrap());
    let config = MctsConfig {
        tree_budget: 200,
        tree_reuse: true,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(4)).unwrap();

    let first = policy.apply(&start).unwrap();
    assert_eq!(first, Action::new("M"));
    let (_, reached) = env.transition(start, start.time, &first).unwrap();

    let calls_before = policy.model_calls();
    let second = policy.apply(&reached).unwrap();
    assert_eq!(second, Action::new("G"));
    // The retained subtree matched, so no fresh tree was built and the
    // generative model was never queried.
    assert_eq!(policy.model_calls(), calls_before);
}

#[test]
fn tree_reuse_falls_back_to_a_fresh_build_on_a_mismatch() {
    let env = bandit_env();
    let start = State::new(0.0, env.find_location("S").unwrap());
    let config = MctsConfig {
        tree_budget: 30,
        tree_reuse: true,
        ..search_config()
    };
    let mut policy = MctsPolicy::new(Arc::clone(&env), config, Some(4)).unwrap();
    let _ = policy.apply(&start).unwrap();

    // A state the previous tree never sampled.
    let elsewhere = State::new(123.0, env.find_location("S").unwrap());
    let calls_before = policy.model_calls();
    let action = policy.apply(&elsewhere).unwrap();
    assert_eq!(action, Action::new("G"));
    assert!(policy.model_calls() > calls_before);
}
