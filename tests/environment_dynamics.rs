//! Black-box tests of the environment's transition and reward contracts.

use chronoroute::{
    Action, Environment, EnvironmentConfig, LocationSpec, RewardShaping, State,
};

fn scenario_env() -> Environment {
    // A -> B whose duration grows from 10 to 20 over the day, B -> goal at a
    // constant 5.
    let config = EnvironmentConfig {
        reward_scaling_max: 25.0,
        goal_reward: 1.0,
        dead_end_reward: -1.0,
        reward_shaping: RewardShaping::DurationDecay,
        goal_location: "Goal".to_string(),
    };
    Environment::new(
        &config,
        vec![0.0, 10.0],
        vec![
            LocationSpec::new("A", false).with_edge("B", vec![10.0, 20.0]),
            LocationSpec::new("B", false).with_edge("Goal", vec![5.0, 5.0]),
            LocationSpec::new("Goal", true),
        ],
    )
    .expect("valid scenario environment")
}

#[test]
fn end_to_end_scenario() {
    let env = scenario_env();
    let start = State::new(0.0, env.find_location("A").unwrap());

    let (reward, at_b) = env.transition(start, 0.0, &Action::new("B")).unwrap();
    assert_eq!(at_b.time, 10.0);
    assert_eq!(env.location_name(at_b.location), "B");
    assert!((reward - env.reward_from_duration(10.0)).abs() < 1e-12);

    let (reward, at_goal) = env.transition(at_b, 10.0, &Action::new("Goal")).unwrap();
    assert_eq!(at_goal.time, 15.0);
    assert_eq!(env.location_name(at_goal.location), "Goal");
    assert_eq!(reward, 1.0);

    assert!(env.is_state_terminal(&at_goal));
}

#[test]
fn transition_interpolates_between_breakpoints() {
    let env = scenario_env();
    let start = State::new(5.0, env.find_location("A").unwrap());
    // Midway through the table the A -> B duration is 15.
    let (_, next) = env.transition(start, 5.0, &Action::new("B")).unwrap();
    assert!((next.time - 20.0).abs() < 1e-12);
}

#[test]
fn transition_at_breakpoints_is_exact() {
    let env = scenario_env();
    let a = env.find_location("A").unwrap();
    let (_, next) = env.transition(State::new(0.0, a), 0.0, &Action::new("B")).unwrap();
    assert_eq!(next.time, 10.0);
    let (_, next) = env.transition(State::new(10.0, a), 10.0, &Action::new("B")).unwrap();
    assert_eq!(next.time, 30.0);
}

#[test]
fn terminal_checks_are_idempotent() {
    let env = scenario_env();
    let goal = State::new(15.0, env.find_location("Goal").unwrap());
    for _ in 0..3 {
        assert!(env.is_state_terminal(&goal));
        assert_eq!(env.get_terminal_reward(&goal), 1.0);
    }
}

#[test]
fn illegal_action_aborts_the_transition() {
    let env = scenario_env();
    let start = State::new(0.0, env.find_location("A").unwrap());
    let result = env.transition(start, 0.0, &Action::new("Goal"));
    assert!(matches!(
        result,
        Err(chronoroute::Error::IllegalAction { .. })
    ));
}

#[test]
fn reward_shaping_respects_its_boundaries() {
    let env = scenario_env();
    assert_eq!(env.reward_from_duration(0.0), 1.0);
    assert!(env.reward_from_duration(25.0).abs() < 1e-12);
    assert_eq!(env.reward_from_duration(30.0), 0.0);
    let mut previous = f64::INFINITY;
    for i in 0..=100 {
        let value = env.reward_from_duration(i as f64 * 0.25);
        assert!(value <= previous + 1e-12, "not monotone at {i}");
        previous = value;
    }
}
