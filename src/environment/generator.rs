//! Random duration-matrix generation.
//!
//! Produces connected directed graphs whose edge durations evolve as a
//! clamped random walk over the time scale, suitable for exercising the
//! planners without hand-authoring a matrix.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    environment::matrix::{DurationMatrix, EdgeRow},
    error::{Error, Result},
};

/// Parameters for random matrix generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of time steps after the initial breakpoint (the scale has
    /// `nb_time_steps + 1` breakpoints).
    pub nb_time_steps: usize,
    /// Spacing between consecutive breakpoints.
    pub time_step_width: f64,
    pub nb_locations: usize,
    /// Minimum out-degree of every location.
    pub min_edges_per_location: usize,
    pub initial_duration_min: f64,
    pub initial_duration_max: f64,
    /// Maximum absolute per-breakpoint duration variation.
    pub duration_variation_max: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            nb_time_steps: 10,
            time_step_width: 10.0,
            nb_locations: 10,
            min_edges_per_location: 2,
            initial_duration_min: 1.0,
            initial_duration_max: 10.0,
            duration_variation_max: 2.0,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nb_locations < 2 {
            return Err(Error::InvalidConfiguration {
                message: "matrix generation needs at least 2 locations".to_string(),
            });
        }
        if self.min_edges_per_location == 0 {
            return Err(Error::InvalidConfiguration {
                message: "min_edges_per_location must be at least 1".to_string(),
            });
        }
        if !(self.time_step_width > 0.0) {
            return Err(Error::InvalidConfiguration {
                message: "time_step_width must be positive".to_string(),
            });
        }
        if self.initial_duration_min < 0.0 || self.initial_duration_max < self.initial_duration_min
        {
            return Err(Error::InvalidConfiguration {
                message: "initial duration range must be non-negative and ordered".to_string(),
            });
        }
        if self.duration_variation_max < 0.0 {
            return Err(Error::InvalidConfiguration {
                message: "duration_variation_max must be non-negative".to_string(),
            });
        }
        Ok(())
    }
}

/// Random duration-matrix generator with its own seedable random source.
pub struct MatrixGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl MatrixGenerator {
    pub fn new(config: GeneratorConfig, seed: Option<u64>) -> Result<Self> {
        config.validate()?;
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Ok(Self { config, rng })
    }

    /// One duration column: an initial draw followed by a random walk,
    /// floored at zero.
    fn random_durations(&mut self) -> Vec<f64> {
        let config = &self.config;
        let mut duration = self
            .rng
            .random_range(config.initial_duration_min..=config.initial_duration_max);
        let mut durations = Vec::with_capacity(config.nb_time_steps + 1);
        for _ in 0..=config.nb_time_steps {
            durations.push(duration);
            let variation = self
                .rng
                .random_range(-config.duration_variation_max..=config.duration_variation_max);
            duration = (duration + variation).max(0.0);
        }
        durations
    }

    fn random_edge(&mut self, origin: usize, target: usize, names: &[String]) -> EdgeRow {
        EdgeRow {
            origin: names[origin].clone(),
            target: names[target].clone(),
            durations: self.random_durations(),
        }
    }

    /// Build a random connected directed duration matrix.
    ///
    /// Every location gets at least `min_edges_per_location` outgoing edges
    /// (self-loops excluded); a repair pass then adds an incoming edge to
    /// any location nothing reaches.
    pub fn generate(&mut self) -> Result<DurationMatrix> {
        let config = self.config.clone();
        let time_scale: Vec<f64> = (0..=config.nb_time_steps)
            .map(|i| i as f64 * config.time_step_width)
            .collect();
        let names: Vec<String> = (0..config.nb_locations).map(|i| format!("n{i}")).collect();

        let mut rows: Vec<EdgeRow> = Vec::new();
        for origin in 0..names.len() {
            for _ in 0..config.min_edges_per_location {
                let mut target = origin;
                while target == origin {
                    target = self.rng.random_range(0..names.len());
                }
                rows.push(self.random_edge(origin, target, &names));
            }
        }
        for target in 0..names.len() {
            let is_reachable = rows.iter().any(|row| row.target == names[target]);
            if !is_reachable {
                let mut origin = target;
                while origin == target {
                    origin = self.rng.random_range(0..names.len());
                }
                rows.push(self.random_edge(origin, target, &names));
            }
        }
        DurationMatrix::new(time_scale, rows)
    }
}
