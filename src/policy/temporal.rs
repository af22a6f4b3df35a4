//! Temporal-extrapolation extension of the MCTS planner.
//!
//! The true value of a (location, action) pair drifts as the reference time
//! advances across successive planning calls, so a single within-call
//! Monte-Carlo mean is a noisy point sample of a moving target. This module
//! keeps a per-pair history of value estimates across calls and, when a
//! chance node's value is retrieved, fits a regularized polynomial over
//! `(node time - reference time)` versus value (augmented with the node's
//! own current mean) and predicts the value at offset zero instead of
//! returning the raw mean.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    environment::LocationId,
    error::{Error, Result},
    policy::mcts::{MctsPolicy, ValueEstimator},
    policy::tree::{ChanceNode, SearchTree},
    regression::{polynomial_regression, predict},
    state::Action,
};

/// One value estimate observed during a past planning call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Root time of the planning call that produced the estimate.
    pub reference_time: f64,
    /// Time of the chance node's labelling state.
    pub node_time: f64,
    /// Mean sampled return of the chance node at the end of the call.
    pub value: f64,
}

/// Append-only history of estimates for one (location, action) pair.
#[derive(Debug, Clone, Default)]
pub struct EstimateHistory {
    estimates: Vec<Estimate>,
}

impl EstimateHistory {
    pub fn estimates(&self) -> &[Estimate] {
        &self.estimates
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    fn push(&mut self, estimate: Estimate) {
        self.estimates.push(estimate);
    }
}

/// Polynomial fit parameters for the temporal estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegressionConfig {
    /// Tikhonov/L2 weight stabilizing ill-conditioned fits.
    pub regularization: f64,
    pub degree: usize,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            regularization: 0.1,
            degree: 2,
        }
    }
}

impl RegressionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.regularization < 0.0 || !self.regularization.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "regression_regularization must be non-negative, got {}",
                    self.regularization
                ),
            });
        }
        Ok(())
    }
}

/// Cross-invocation value estimator backed by per-pair estimate histories.
pub struct TemporalEstimator {
    config: RegressionConfig,
    histories: HashMap<(LocationId, Action), EstimateHistory>,
}

impl TemporalEstimator {
    pub fn new(config: RegressionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            histories: HashMap::new(),
        })
    }

    /// The recorded history for a pair, if any estimate was ever pushed.
    pub fn history(&self, location: LocationId, action: &Action) -> Option<&EstimateHistory> {
        self.histories.get(&(location, action.clone()))
    }

    pub fn pair_count(&self) -> usize {
        self.histories.len()
    }
}

impl ValueEstimator for TemporalEstimator {
    fn value(&self, node: &ChanceNode, reference_time: f64) -> f64 {
        let mean = node.mean_return();
        let key = (node.state().location, node.action().clone());
        let Some(history) = self.histories.get(&key) else {
            return mean;
        };
        let mut offsets: Vec<f64> = history
            .estimates()
            .iter()
            .map(|e| e.node_time - e.reference_time)
            .collect();
        let mut values: Vec<f64> = history.estimates().iter().map(|e| e.value).collect();
        offsets.push(node.state().time - reference_time);
        values.push(mean);
        match polynomial_regression(
            &offsets,
            &values,
            self.config.degree,
            self.config.regularization,
        ) {
            // Predict the value "as of right now".
            Ok(coefficients) => predict(&coefficients, 0.0),
            // Degenerate unregularized fit: the raw mean is the only
            // defensible estimate left.
            Err(_) => mean,
        }
    }

    fn label(&self) -> Option<&'static str> {
        Some("temporal_mcts")
    }

    fn after_search(&mut self, tree: &SearchTree, reference_time: f64) {
        for node in tree.chance_nodes() {
            if node.visits() == 0 {
                continue;
            }
            let key = (node.state().location, node.action().clone());
            self.histories.entry(key).or_default().push(Estimate {
                reference_time,
                node_time: node.state().time,
                value: node.mean_return(),
            });
        }
    }
}

/// MCTS planner with temporally extrapolated chance-node values.
pub type TemporalMctsPolicy = MctsPolicy<TemporalEstimator>;
