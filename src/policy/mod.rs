//! Policies: the uniform contract between the run loop and the planners,
//! plus the provided implementations.

pub mod mcts;
pub mod random;
pub mod temporal;
pub mod tree;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    config::PolicyConfig,
    environment::Environment,
    error::Result,
    state::{Action, State},
};

pub use mcts::{
    MctsConfig, MctsPolicy, MeanEstimator, Plan, Recommendation, TreePolicy, UctPolicy,
    ValueEstimator,
};
pub use random::RandomPolicy;
pub use temporal::{
    Estimate, EstimateHistory, RegressionConfig, TemporalEstimator, TemporalMctsPolicy,
};
pub use tree::{ChanceId, ChanceNode, DecisionId, DecisionNode, SearchTree};

/// Uniform policy contract consumed by the run loop.
///
/// `apply` never mutates the environment but may mutate internal tree or
/// history state; `process_reward` is a hook for value-learning variants and
/// defaults to a no-op.
pub trait Policy: Send {
    /// Pick the next action at a state.
    fn apply(&mut self, state: &State) -> Result<Action>;

    /// Observe the outcome of an executed transition.
    fn process_reward(
        &mut self,
        _state: &State,
        _action: &Action,
        _reward: f64,
        _next_state: &State,
    ) -> Result<()> {
        Ok(())
    }

    /// Identification for reporting.
    fn name(&self) -> &str;
}

/// The closed set of provided policy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Random,
    #[default]
    Mcts,
    TemporalMcts,
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PolicyKind::Random => "random",
            PolicyKind::Mcts => "mcts",
            PolicyKind::TemporalMcts => "temporal_mcts",
        };
        write!(f, "{name}")
    }
}

/// Build the configured policy variant over a shared environment.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidConfiguration`] when the configuration
/// fails validation (out-of-range parameters or incompatible switches).
pub fn build_policy(env: Arc<Environment>, config: &PolicyConfig) -> Result<Box<dyn Policy>> {
    config.validate()?;
    match config.kind {
        PolicyKind::Random => Ok(Box::new(RandomPolicy::new(env, config.seed))),
        PolicyKind::Mcts => Ok(Box::new(MctsPolicy::new(
            env,
            config.search.clone(),
            config.seed,
        )?)),
        PolicyKind::TemporalMcts => {
            let estimator = TemporalEstimator::new(config.regression.clone())?;
            Ok(Box::new(MctsPolicy::with_estimator(
                env,
                config.search.clone(),
                estimator,
                config.seed,
            )?))
        }
    }
}
