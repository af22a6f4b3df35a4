//! Uniform-random baseline policy.
//!
//! Also the MCTS rollout ("default") policy: both go through
//! [`sample_action`].

use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    environment::Environment,
    error::Result,
    policy::Policy,
    state::{Action, State},
};

/// Seed-or-entropy random source, one per policy instance.
pub(crate) fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Pick one of the state's legal actions uniformly at random.
///
/// # Errors
///
/// Propagates [`crate::Error::NoActionsAvailable`] from the action-space
/// query on edgeless locations.
pub(crate) fn sample_action(
    env: &Environment,
    state: &State,
    rng: &mut StdRng,
) -> Result<Action> {
    let mut actions = env.action_space(state)?;
    let index = rng.random_range(0..actions.len());
    Ok(actions.swap_remove(index))
}

/// Baseline policy: uniform random edge choice, no learning.
pub struct RandomPolicy {
    env: Arc<Environment>,
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new(env: Arc<Environment>, seed: Option<u64>) -> Self {
        Self {
            env,
            rng: build_rng(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn apply(&mut self, state: &State) -> Result<Action> {
        sample_action(&self.env, state, &mut self.rng)
    }

    fn name(&self) -> &str {
        "random"
    }
}
