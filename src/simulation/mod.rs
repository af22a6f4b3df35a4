//! Episode run loop: an agent stepping a policy through the environment.

pub mod backup;

use serde::{Deserialize, Serialize};

use crate::{
    environment::Environment,
    error::Result,
    policy::Policy,
    state::State,
};

/// The traversing agent: a current state plus the policy deciding its moves.
pub struct Agent {
    pub state: State,
    policy: Box<dyn Policy>,
}

impl Agent {
    pub fn new(state: State, policy: Box<dyn Policy>) -> Self {
        Self { state, policy }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }
}

/// One executed transition of an episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    /// Time at which the decision was made.
    pub time: f64,
    pub location: String,
    pub action: String,
    pub reward: f64,
}

/// Outcome of one episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub steps: Vec<StepRecord>,
    pub total_return: f64,
    /// Simulated clock at the end of the episode.
    pub elapsed_time: f64,
    pub reached_goal: bool,
}

impl EpisodeSummary {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// Drive one episode to a terminal state or the step limit.
///
/// Each step asks the policy for an action, executes it through the real
/// environment at the agent's own clock, accumulates the reward, and hands
/// the transition back to the policy's `process_reward` hook.
///
/// # Errors
///
/// Propagates the planner/environment error taxonomy (illegal action, no
/// actions available, and configuration faults) without retrying; callers
/// are expected to terminate the episode, not the process.
pub fn run_episode(
    env: &Environment,
    agent: &mut Agent,
    max_steps: usize,
) -> Result<EpisodeSummary> {
    let mut steps = Vec::new();
    let mut total_return = 0.0;
    for step in 0..max_steps {
        if env.is_state_terminal(&agent.state) {
            break;
        }
        let action = agent.policy.apply(&agent.state)?;
        let (reward, next_state) = env.transition(agent.state, agent.state.time, &action)?;
        total_return += reward;
        agent
            .policy
            .process_reward(&agent.state, &action, reward, &next_state)?;
        steps.push(StepRecord {
            step,
            time: agent.state.time,
            location: env.location_name(agent.state.location).to_string(),
            action: action.direction().to_string(),
            reward,
        });
        agent.state = next_state;
        if env.is_state_terminal(&agent.state) {
            break;
        }
    }
    Ok(EpisodeSummary {
        steps,
        total_return,
        elapsed_time: agent.state.time,
        reached_goal: env.location(agent.state.location).is_goal(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::environment::{EnvironmentConfig, LocationSpec};
    use crate::policy::RandomPolicy;

    fn corridor_env() -> Arc<Environment> {
        let config = EnvironmentConfig {
            goal_location: "C".to_string(),
            ..EnvironmentConfig::default()
        };
        Arc::new(
            Environment::new(
                &config,
                vec![0.0, 10.0],
                vec![
                    LocationSpec::new("A", false).with_edge("B", vec![2.0, 2.0]),
                    LocationSpec::new("B", false).with_edge("C", vec![3.0, 3.0]),
                    LocationSpec::new("C", true),
                ],
            )
            .unwrap(),
        )
    }

    #[test]
    fn episode_walks_the_corridor_to_the_goal() {
        let env = corridor_env();
        let policy = Box::new(RandomPolicy::new(Arc::clone(&env), Some(5)));
        let start = State::new(0.0, env.find_location("A").unwrap());
        let mut agent = Agent::new(start, policy);
        let summary = run_episode(&env, &mut agent, 20).unwrap();
        assert_eq!(summary.step_count(), 2);
        assert!(summary.reached_goal);
        assert_eq!(summary.elapsed_time, 5.0);
        assert_eq!(summary.total_return, 1.0);
        assert_eq!(summary.steps[0].location, "A");
        assert_eq!(summary.steps[1].action, "C");
    }

    #[test]
    fn step_limit_caps_the_episode() {
        let config = EnvironmentConfig {
            goal_location: "never".to_string(),
            ..EnvironmentConfig::default()
        };
        let env = Arc::new(
            Environment::new(
                &config,
                vec![0.0, 1.0],
                vec![
                    LocationSpec::new("A", false).with_edge("B", vec![1.0, 1.0]),
                    LocationSpec::new("B", false).with_edge("A", vec![1.0, 1.0]),
                ],
            )
            .unwrap(),
        );
        let policy = Box::new(RandomPolicy::new(Arc::clone(&env), Some(5)));
        let start = State::new(0.0, env.find_location("A").unwrap());
        let mut agent = Agent::new(start, policy);
        let summary = run_episode(&env, &mut agent, 4).unwrap();
        assert_eq!(summary.step_count(), 4);
        assert!(!summary.reached_goal);
    }
}
