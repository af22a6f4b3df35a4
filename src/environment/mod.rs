//! Environment: the graph substrate and the generative transition/reward
//! oracle queried by the planners.
//!
//! The environment owns every location and edge for its lifetime and is
//! immutable after construction; states refer into it by [`LocationId`].
//! Edge traversal durations depend on time of day through a piecewise-linear
//! duration table sampled at the environment's time-scale breakpoints.

pub mod generator;
pub mod matrix;

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    state::{Action, State},
};

/// Index of a location in the environment's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationId(usize);

impl LocationId {
    pub fn new(index: usize) -> Self {
        LocationId(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// A directed connection to another location.
///
/// `durations` holds one traversal duration per time-scale breakpoint; its
/// length always equals the environment's time-scale length.
#[derive(Debug, Clone)]
pub struct Edge {
    target: LocationId,
    durations: Vec<f64>,
}

impl Edge {
    pub fn target(&self) -> LocationId {
        self.target
    }

    pub fn durations(&self) -> &[f64] {
        &self.durations
    }
}

/// A graph vertex.
#[derive(Debug, Clone)]
pub struct Location {
    name: String,
    is_goal: bool,
    edges: Vec<Edge>,
}

impl Location {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_goal(&self) -> bool {
        self.is_goal
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }
}

/// Validated input shape for one location, as consumed by
/// [`Environment::new`].
#[derive(Debug, Clone)]
pub struct LocationSpec {
    pub name: String,
    pub is_goal: bool,
    /// `(target location name, duration table)` pairs.
    pub edges: Vec<(String, Vec<f64>)>,
}

impl LocationSpec {
    pub fn new<S: Into<String>>(name: S, is_goal: bool) -> Self {
        Self {
            name: name.into(),
            is_goal,
            edges: Vec::new(),
        }
    }

    pub fn with_edge<S: Into<String>>(mut self, target: S, durations: Vec<f64>) -> Self {
        self.edges.push((target.into(), durations));
        self
    }
}

/// How non-terminal arrivals are rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardShaping {
    /// Non-terminal arrivals pay nothing.
    #[default]
    Sparse,
    /// Non-terminal arrivals pay a smooth cosine decay of the travel
    /// duration, reaching zero at `reward_scaling_max`.
    DurationDecay,
}

/// Reward constants and shaping mode, plus the name of the goal location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub reward_scaling_max: f64,
    pub goal_reward: f64,
    pub dead_end_reward: f64,
    pub reward_shaping: RewardShaping,
    pub goal_location: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            reward_scaling_max: 25.0,
            goal_reward: 1.0,
            dead_end_reward: -1.0,
            reward_shaping: RewardShaping::default(),
            goal_location: "goal".to_string(),
        }
    }
}

impl EnvironmentConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.reward_scaling_max > 0.0) || !self.reward_scaling_max.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "reward_scaling_max must be a positive finite value, got {}",
                    self.reward_scaling_max
                ),
            });
        }
        if !self.goal_reward.is_finite() || !self.dead_end_reward.is_finite() {
            return Err(Error::InvalidConfiguration {
                message: "goal_reward and dead_end_reward must be finite".to_string(),
            });
        }
        Ok(())
    }
}

/// The dynamics and reward oracle. Immutable after construction.
#[derive(Debug, Clone)]
pub struct Environment {
    reward_scaling_max: f64,
    goal_reward: f64,
    dead_end_reward: f64,
    reward_shaping: RewardShaping,
    time_scale: Vec<f64>,
    locations: Vec<Location>,
}

impl Environment {
    /// Build an environment from a validated time scale and location set.
    ///
    /// # Errors
    ///
    /// * [`Error::NonIncreasingTimeScale`] if the time scale is empty or not
    ///   strictly increasing.
    /// * [`Error::DuplicateLocation`] on repeated location names.
    /// * [`Error::NonexistentLocation`] if an edge targets an unknown name.
    /// * [`Error::DurationTableMismatch`] if any duration table length
    ///   differs from the time-scale length. This is checked once here and
    ///   can therefore never surface mid-search.
    pub fn new(
        config: &EnvironmentConfig,
        time_scale: Vec<f64>,
        specs: Vec<LocationSpec>,
    ) -> Result<Self> {
        config.validate()?;
        validate_time_scale(&time_scale)?;

        let mut locations: Vec<Location> = Vec::with_capacity(specs.len());
        for spec in &specs {
            if locations.iter().any(|l| l.name == spec.name) {
                return Err(Error::DuplicateLocation {
                    name: spec.name.clone(),
                });
            }
            locations.push(Location {
                name: spec.name.clone(),
                is_goal: spec.is_goal,
                edges: Vec::new(),
            });
        }

        let find = |name: &str, locations: &[Location]| -> Result<LocationId> {
            locations
                .iter()
                .position(|l| l.name == name)
                .map(LocationId)
                .ok_or_else(|| Error::NonexistentLocation {
                    name: name.to_string(),
                })
        };

        for (index, spec) in specs.iter().enumerate() {
            for (target_name, durations) in &spec.edges {
                let target = find(target_name, &locations)?;
                if durations.len() != time_scale.len() {
                    return Err(Error::DurationTableMismatch {
                        origin: spec.name.clone(),
                        target: target_name.clone(),
                        expected: time_scale.len(),
                        got: durations.len(),
                    });
                }
                locations[index].edges.push(Edge {
                    target,
                    durations: durations.clone(),
                });
            }
        }

        Ok(Self {
            reward_scaling_max: config.reward_scaling_max,
            goal_reward: config.goal_reward,
            dead_end_reward: config.dead_end_reward,
            reward_shaping: config.reward_shaping,
            time_scale,
            locations,
        })
    }

    pub fn time_scale(&self) -> &[f64] {
        &self.time_scale
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn location(&self, id: LocationId) -> &Location {
        &self.locations[id.0]
    }

    pub fn location_name(&self, id: LocationId) -> &str {
        &self.locations[id.0].name
    }

    /// Resolve a location by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonexistentLocation`] if no location carries the name.
    pub fn find_location(&self, name: &str) -> Result<LocationId> {
        self.locations
            .iter()
            .position(|l| l.name == name)
            .map(LocationId)
            .ok_or_else(|| Error::NonexistentLocation {
                name: name.to_string(),
            })
    }

    /// The actions available at a state, one per outgoing edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActionsAvailable`] if the state's location has no
    /// outgoing edges. Callers treating dead ends as terminal must not query
    /// the action space there.
    pub fn action_space(&self, state: &State) -> Result<Vec<Action>> {
        let location = self.location(state.location);
        if location.edges.is_empty() {
            return Err(Error::NoActionsAvailable {
                location: location.name.clone(),
            });
        }
        Ok(location
            .edges
            .iter()
            .map(|e| Action::new(self.location_name(e.target)))
            .collect())
    }

    /// Whether the state's location is a dead end (no outgoing edges and not
    /// the goal).
    pub fn is_dead_end(&self, state: &State) -> bool {
        let location = self.location(state.location);
        location.edges.is_empty() && !location.is_goal
    }

    /// Whether the state is terminal: its location is the goal or a dead end.
    pub fn is_state_terminal(&self, state: &State) -> bool {
        self.location(state.location).is_goal || self.is_dead_end(state)
    }

    /// Reward for reaching a terminal state.
    ///
    /// # Panics
    ///
    /// Panics if the state is not terminal; callers must guard with
    /// [`Environment::is_state_terminal`].
    pub fn get_terminal_reward(&self, state: &State) -> f64 {
        assert!(
            self.is_state_terminal(state),
            "get_terminal_reward called on non-terminal state at '{}'",
            self.location_name(state.location)
        );
        if self.is_dead_end(state) {
            self.dead_end_reward
        } else {
            self.goal_reward
        }
    }

    /// Smooth cosine decay of a travel duration into `[0, 1]`.
    ///
    /// Duration zero pays 1, `reward_scaling_max` and beyond pay 0, with a
    /// cosine decay in between.
    ///
    /// # Panics
    ///
    /// Panics on negative durations.
    pub fn reward_from_duration(&self, duration: f64) -> f64 {
        assert!(duration >= 0.0, "negative travel duration {duration}");
        if duration > self.reward_scaling_max {
            0.0
        } else {
            0.5 * ((PI * duration / self.reward_scaling_max).cos() + 1.0)
        }
    }

    fn reward(&self, resulting: &State, duration: f64) -> f64 {
        if self.is_state_terminal(resulting) {
            self.get_terminal_reward(resulting)
        } else {
            match self.reward_shaping {
                RewardShaping::Sparse => 0.0,
                RewardShaping::DurationDecay => self.reward_from_duration(duration),
            }
        }
    }

    /// Evaluate an edge's duration table at an arbitrary query time.
    ///
    /// Piecewise-linear interpolation between the bracketing breakpoints;
    /// query times outside the table reuse the first/last segment's slope.
    /// The result is floored at zero to reject negative extrapolations.
    fn interpolate_duration(&self, durations: &[f64], t_request: f64) -> f64 {
        let ts = &self.time_scale;
        let n = ts.len();
        if n == 1 {
            return durations[0].max(0.0);
        }
        // First breakpoint strictly greater than the query time.
        let upper = ts.partition_point(|&t| t <= t_request);
        if upper > 0 && ts[upper - 1] == t_request {
            // Exactly at a knot: no interpolation error allowed.
            return durations[upper - 1].max(0.0);
        }
        let (i, j) = if upper == 0 {
            (0, 1)
        } else if upper > n - 1 {
            (n - 2, n - 1)
        } else {
            (upper - 1, upper)
        };
        let slope = (durations[j] - durations[i]) / (ts[j] - ts[i]);
        let duration = durations[i] + slope * (t_request - ts[i]);
        duration.max(0.0)
    }

    /// Transition function: take action `a` from state `s`, evaluating the
    /// traversal duration at `t_request`.
    ///
    /// Returns `(reward, resulting state)`. The reward is attributed to the
    /// resulting state per the environment's shaping mode; terminal arrivals
    /// pay exactly the goal or dead-end constant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IllegalAction`] if `a` names no outgoing edge of the
    /// state's location. The error is fatal to this transition and is never
    /// retried internally.
    pub fn transition(&self, s: State, t_request: f64, a: &Action) -> Result<(f64, State)> {
        let location = self.location(s.location);
        let edge = location
            .edges
            .iter()
            .find(|e| self.location_name(e.target) == a.direction())
            .ok_or_else(|| Error::IllegalAction {
                location: location.name.clone(),
                direction: a.direction().to_string(),
            })?;
        let duration = self.interpolate_duration(&edge.durations, t_request);
        let resulting = State::new(s.time + duration, edge.target);
        let reward = self.reward(&resulting, duration);
        Ok((reward, resulting))
    }
}

fn validate_time_scale(time_scale: &[f64]) -> Result<()> {
    if time_scale.is_empty() {
        return Err(Error::NonIncreasingTimeScale { index: 0 });
    }
    for (index, window) in time_scale.windows(2).enumerate() {
        if !(window[1] > window[0]) {
            return Err(Error::NonIncreasingTimeScale { index: index + 1 });
        }
    }
    Ok(())
}
