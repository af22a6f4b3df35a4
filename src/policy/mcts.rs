//! Monte-Carlo Tree Search planner with UCT selection.
//!
//! Each call to [`MctsPolicy::apply`] grows a fresh tree for a fixed budget
//! of iterations, expanding one chance node per iteration, estimating leaves
//! with a uniform-random rollout, and backing sampled returns up the visited
//! path. The policy is generic over a [`ValueEstimator`] so the
//! temporal-extrapolation variant can decorate chance-node value retrieval
//! without touching the search itself.

use std::sync::Arc;

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    environment::Environment,
    error::{Error, Result},
    policy::random::{build_rng, sample_action},
    policy::tree::{ChanceId, ChanceNode, DecisionId, SearchTree},
    policy::Policy,
    state::{Action, State},
};

/// Selection rule among the already-expanded children of a decision node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreePolicy {
    /// Uniform random child selection ("vanilla" MCTS).
    Vanilla,
    /// Upper Confidence bound applied to Trees.
    #[default]
    Uct,
}

/// How the final action is picked among the root's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Child with the highest estimated value.
    #[default]
    HighestValue,
    /// Child with the most recorded visits.
    MostVisited,
}

/// Search parameters, fixed per policy instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// Re-evaluate durations at each simulated state's own time (`true`) or
    /// always at the time the root decision was made (`false`).
    pub is_model_dynamic: bool,
    pub discount_factor: f64,
    pub uct_parameter: f64,
    /// Number of tree-growth iterations per decision.
    pub tree_budget: u32,
    /// Maximum rollout length per expansion.
    pub rollout_horizon: u32,
    pub tree_policy: TreePolicy,
    pub recommendation: Recommendation,
    /// Retain the recommended subtree across decisions instead of discarding
    /// the tree.
    pub tree_reuse: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            is_model_dynamic: true,
            discount_factor: 0.9,
            uct_parameter: 0.7,
            tree_budget: 100,
            rollout_horizon: 10,
            tree_policy: TreePolicy::default(),
            recommendation: Recommendation::default(),
            tree_reuse: false,
        }
    }
}

impl MctsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.discount_factor) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "discount_factor must lie in [0, 1], got {}",
                    self.discount_factor
                ),
            });
        }
        if self.uct_parameter < 0.0 || !self.uct_parameter.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "uct_parameter must be non-negative, got {}",
                    self.uct_parameter
                ),
            });
        }
        if self.tree_budget == 0 {
            return Err(Error::InvalidConfiguration {
                message: "tree_budget must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Seam for chance-node value retrieval during selection and
/// recommendation.
pub trait ValueEstimator: Send {
    /// Estimated value of a chance node as of `reference_time`.
    fn value(&self, node: &ChanceNode, reference_time: f64) -> f64;

    /// Hook invoked once per planning call with the finished tree.
    fn after_search(&mut self, _tree: &SearchTree, _reference_time: f64) {}

    /// Policy-name override for decorating estimators.
    fn label(&self) -> Option<&'static str> {
        None
    }
}

/// Plain Monte-Carlo estimate: the mean of the node's sampled returns.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanEstimator;

impl ValueEstimator for MeanEstimator {
    fn value(&self, node: &ChanceNode, _reference_time: f64) -> f64 {
        node.mean_return()
    }
}

/// Outcome of one planning call: the recommended action and the tree that
/// produced it.
#[derive(Debug)]
pub struct Plan {
    pub recommended: Action,
    pub tree: SearchTree,
}

struct RetainedTree {
    tree: SearchTree,
    action: Action,
}

/// MCTS/UCT planning policy over a shared read-only environment.
pub struct MctsPolicy<E: ValueEstimator = MeanEstimator> {
    env: Arc<Environment>,
    config: MctsConfig,
    estimator: E,
    rng: StdRng,
    /// Root time of the planning call in flight.
    reference_time: f64,
    /// Chance nodes expanded during the call in flight; the UCT visit-count
    /// normalizer. Reset at the start of every `apply`.
    nb_chance_nodes: u32,
    nb_model_calls: u64,
    retained: Option<RetainedTree>,
}

/// The plain MCTS/UCT policy.
pub type UctPolicy = MctsPolicy<MeanEstimator>;

impl MctsPolicy<MeanEstimator> {
    pub fn new(env: Arc<Environment>, config: MctsConfig, seed: Option<u64>) -> Result<Self> {
        Self::with_estimator(env, config, MeanEstimator, seed)
    }
}

impl<E: ValueEstimator> MctsPolicy<E> {
    pub fn with_estimator(
        env: Arc<Environment>,
        config: MctsConfig,
        estimator: E,
        seed: Option<u64>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            env,
            config,
            estimator,
            rng: build_rng(seed),
            reference_time: 0.0,
            nb_chance_nodes: 0,
            nb_model_calls: 0,
            retained: None,
        })
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Number of generative-model queries made so far.
    pub fn model_calls(&self) -> u64 {
        self.nb_model_calls
    }

    /// Query the generative model: dynamic models transition at the state's
    /// own time, frozen models at the root's reference time.
    fn generative_model(&mut self, s: State, a: &Action) -> Result<(f64, State)> {
        self.nb_model_calls += 1;
        let t_request = if self.config.is_model_dynamic {
            s.time
        } else {
            self.reference_time
        };
        self.env.transition(s, t_request, a)
    }

    /// Sample a discounted return from a chance node with the default
    /// (uniform random) policy, up to the rollout horizon.
    fn sample_return(&mut self, state: State, action: Action) -> Result<f64> {
        if self.env.is_state_terminal(&state) {
            return Ok(self.env.get_terminal_reward(&state));
        }
        let mut total_return = 0.0;
        let mut s = state;
        let mut a = action;
        for t in 0..self.config.rollout_horizon {
            let (r, s_p) = self.generative_model(s, &a)?;
            total_return += self.config.discount_factor.powi(t as i32) * r;
            if self.env.is_state_terminal(&s_p) {
                break;
            }
            s = s_p;
            a = sample_action(&self.env, &s, &mut self.rng)?;
        }
        Ok(total_return)
    }

    /// Untried actions for a fresh decision node: empty at terminal states,
    /// which the search never expands.
    fn untried_actions(&self, state: &State) -> Result<Vec<Action>> {
        if self.env.is_state_terminal(state) {
            Ok(Vec::new())
        } else {
            self.env.action_space(state)
        }
    }

    /// Expand one new chance node under `id` and estimate it with a rollout.
    fn evaluate(&mut self, tree: &mut SearchTree, id: DecisionId) -> Result<f64> {
        self.nb_chance_nodes += 1;
        let child = tree.expand(id, &mut self.rng);
        let (state, action) = {
            let node = tree.chance(child);
            (*node.state(), node.action().clone())
        };
        let q = self.sample_return(state, action)?;
        tree.chance_mut(child).push_return(q);
        Ok(q)
    }

    fn select_child(&mut self, tree: &SearchTree, id: DecisionId) -> ChanceId {
        let children = tree.decision(id).children();
        debug_assert!(!children.is_empty(), "selection on a childless node");
        match self.config.tree_policy {
            TreePolicy::Vanilla => children[self.rng.random_range(0..children.len())],
            TreePolicy::Uct => {
                let total = f64::from(self.nb_chance_nodes);
                children
                    .iter()
                    .copied()
                    .map(|child| {
                        let node = tree.chance(child);
                        let exploration =
                            (total.ln() / node.visits() as f64).sqrt();
                        let score = self.estimator.value(node, self.reference_time)
                            + 2.0 * self.config.uct_parameter * exploration;
                        (child, score)
                    })
                    .max_by(|(_, a), (_, b)| a.total_cmp(b))
                    .map(|(child, _)| child)
                    .expect("non-empty children")
            }
        }
    }

    /// One search iteration from `id`: terminal nodes return their reward,
    /// unexpanded nodes expand and roll out, fully expanded nodes recurse
    /// through the tree policy and back the discounted return up.
    fn search_tree(&mut self, tree: &mut SearchTree, id: DecisionId) -> Result<f64> {
        let state = *tree.decision(id).state();
        if self.env.is_state_terminal(&state) {
            return Ok(self.env.get_terminal_reward(&state));
        }
        if !tree.decision(id).is_fully_expanded() {
            return self.evaluate(tree, id);
        }
        let selected = self.select_child(tree, id);
        let action = tree.chance(selected).action().clone();
        let (r, s_p) = self.generative_model(state, &action)?;
        let recursive = match tree.find_decision_child(selected, &s_p) {
            Some(existing) => self.search_tree(tree, existing)?,
            None => {
                let untried = self.untried_actions(&s_p)?;
                let created = tree.add_decision_child(selected, s_p, untried);
                self.search_tree(tree, created)?
            }
        };
        let q = r + self.config.discount_factor * recursive;
        tree.chance_mut(selected).push_return(q);
        Ok(q)
    }

    fn recommend(&self, tree: &SearchTree) -> Result<Action> {
        let root = tree.root();
        let children = tree.decision(root).children();
        if children.is_empty() {
            return Err(Error::NoActionsAvailable {
                location: self
                    .env
                    .location_name(tree.decision(root).state().location)
                    .to_string(),
            });
        }
        let best = match self.config.recommendation {
            Recommendation::HighestValue => children
                .iter()
                .copied()
                .max_by(|&a, &b| {
                    let va = self.estimator.value(tree.chance(a), self.reference_time);
                    let vb = self.estimator.value(tree.chance(b), self.reference_time);
                    va.total_cmp(&vb)
                })
                .expect("non-empty children"),
            Recommendation::MostVisited => children
                .iter()
                .copied()
                .max_by_key(|&child| tree.chance(child).visits())
                .expect("non-empty children"),
        };
        Ok(tree.chance(best).action().clone())
    }

    /// Grow a fresh tree for the full budget and recommend the best first
    /// action. Exposed for introspection; [`Policy::apply`] wraps it.
    pub fn plan(&mut self, state: &State) -> Result<Plan> {
        self.reference_time = state.time;
        self.nb_chance_nodes = 0;
        let mut tree = SearchTree::new(*state, self.untried_actions(state)?);
        let root = tree.root();
        for _ in 0..self.config.tree_budget {
            self.search_tree(&mut tree, root)?;
        }
        self.estimator.after_search(&tree, self.reference_time);
        let recommended = self.recommend(&tree)?;
        Ok(Plan { recommended, tree })
    }

    /// Re-root the retained tree at the decision node matching the action
    /// previously taken and the state actually reached, when one exists.
    fn take_matching_subtree(&mut self, state: &State) -> Option<SearchTree> {
        let retained = self.retained.take()?;
        let tree = &retained.tree;
        let root_children = tree.decision(tree.root()).children();
        let taken = root_children
            .iter()
            .copied()
            .find(|&child| tree.chance(child).action() == &retained.action)?;
        let matching = tree.find_decision_child(taken, state)?;
        let subtree = tree.extract_subtree(matching);
        if subtree.decision(subtree.root()).children().is_empty() {
            return None;
        }
        Some(subtree)
    }
}

impl<E: ValueEstimator> Policy for MctsPolicy<E> {
    fn apply(&mut self, state: &State) -> Result<Action> {
        if self.config.tree_reuse {
            self.reference_time = state.time;
            if let Some(tree) = self.take_matching_subtree(state) {
                let recommended = self.recommend(&tree)?;
                self.retained = Some(RetainedTree {
                    tree,
                    action: recommended.clone(),
                });
                return Ok(recommended);
            }
        }
        let plan = self.plan(state)?;
        if self.config.tree_reuse {
            self.retained = Some(RetainedTree {
                tree: plan.tree,
                action: plan.recommended.clone(),
            });
        }
        Ok(plan.recommended)
    }

    fn name(&self) -> &str {
        self.estimator.label().unwrap_or(match self.config.tree_policy {
            TreePolicy::Vanilla => "mcts",
            TreePolicy::Uct => "uct",
        })
    }
}
