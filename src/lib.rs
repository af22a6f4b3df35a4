//! Online planning for a single agent on directed graphs whose edge
//! durations vary continuously with time of day.
//!
//! This crate provides:
//! - A generative environment model with time-interpolated edge durations
//! - Monte-Carlo Tree Search planning with UCT selection
//! - A temporal-extrapolation extension reusing value estimates across
//!   planning calls through polynomial regression
//! - A run loop, duration-matrix I/O, and random matrix generation

pub mod cli;
pub mod config;
pub mod environment;
pub mod error;
pub mod policy;
pub mod regression;
pub mod simulation;
pub mod state;

pub use config::{Config, PolicyConfig, SimulationConfig};
pub use environment::{
    Environment, EnvironmentConfig, Location, LocationId, LocationSpec, RewardShaping,
};
pub use error::{Error, Result};
pub use policy::{
    MctsConfig, MctsPolicy, Plan, Policy, PolicyKind, RandomPolicy, Recommendation,
    RegressionConfig, SearchTree, TemporalMctsPolicy, TreePolicy, UctPolicy, build_policy,
};
pub use simulation::{Agent, EpisodeSummary, StepRecord, run_episode};
pub use state::{Action, State};
