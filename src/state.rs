//! State and action value types shared by the environment and the planners.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::environment::LocationId;

/// An instant of simulated time at a location.
///
/// Equality is exact on both components: two states compare equal only when
/// their times are bit-for-bit identical floats and they reference the same
/// location. The search tree relies on this comparison to deduplicate
/// decision nodes, so it must stay exact rather than tolerance-based.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    /// Continuous simulation time.
    pub time: f64,
    /// Current location in the environment's graph.
    pub location: LocationId,
}

impl State {
    /// Create a state at the given time and location.
    pub fn new(time: f64, location: LocationId) -> Self {
        Self { time, location }
    }
}

/// A chosen outgoing edge, named by its target location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action(String);

impl Action {
    /// Create an action heading towards the named location.
    pub fn new<S: Into<String>>(direction: S) -> Self {
        Action(direction.into())
    }

    /// Name of the target location.
    pub fn direction(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Action {
    fn from(direction: &str) -> Self {
        Action::new(direction)
    }
}
