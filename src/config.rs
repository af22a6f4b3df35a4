//! Configuration types for episodes and policies.
//!
//! A [`Config`] aggregates everything a run needs and is loadable from a
//! JSON file; every sub-config validates at load time so no parameter error
//! can surface mid-search.

use std::{fs::File, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};

use crate::{
    environment::EnvironmentConfig,
    error::{Error, Result},
    policy::{MctsConfig, PolicyKind, RegressionConfig},
};

/// Policy selection and parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub kind: PolicyKind,
    /// Random seed for reproducible planning; entropy-seeded when absent.
    pub seed: Option<u64>,
    pub search: MctsConfig,
    /// Used by the temporal variant only.
    pub regression: RegressionConfig,
}

impl PolicyConfig {
    pub fn new(kind: PolicyKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_search(mut self, search: MctsConfig) -> Self {
        self.search = search;
        self
    }

    pub fn with_regression(mut self, regression: RegressionConfig) -> Self {
        self.regression = regression;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.regression.validate()?;
        if self.search.tree_reuse && self.kind == PolicyKind::TemporalMcts {
            return Err(Error::InvalidConfiguration {
                message: "tree_reuse cannot be combined with the temporal_mcts policy".to_string(),
            });
        }
        Ok(())
    }
}

/// Episode-level parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Hard cap on the number of agent steps per episode.
    pub max_steps: usize,
    pub initial_location: String,
    pub duration_matrix: PathBuf,
    /// Single-character CSV separator for matrix and backup files.
    pub csv_separator: char,
    /// Episode outcomes are appended here when set.
    pub backup_path: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            initial_location: "n0".to_string(),
            duration_matrix: PathBuf::from("data/duration_matrix.csv"),
            csv_separator: ';',
            backup_path: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_steps must be positive".to_string(),
            });
        }
        if !self.csv_separator.is_ascii() {
            return Err(Error::InvalidConfiguration {
                message: format!("csv_separator '{}' must be ASCII", self.csv_separator),
            });
        }
        Ok(())
    }

    pub fn separator_byte(&self) -> u8 {
        self.csv_separator as u8
    }
}

/// Full run configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub environment: EnvironmentConfig,
    pub policy: PolicyConfig,
    pub simulation: SimulationConfig,
}

impl Config {
    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be opened,
    /// [`Error::Serialization`] on malformed JSON, and
    /// [`Error::InvalidConfiguration`] when any parameter fails validation.
    pub fn from_json_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref()).map_err(|source| Error::Io {
            operation: format!("open config file {}", path.as_ref().display()),
            source,
        })?;
        let config: Config = serde_json::from_reader(file)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.environment.validate()?;
        self.policy.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Config::default().validate().expect("default config is valid");
    }

    #[test]
    fn out_of_range_discount_is_rejected() {
        let mut config = PolicyConfig::default();
        config.search.discount_factor = 1.5;
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn zero_budget_is_rejected() {
        let mut config = PolicyConfig::default();
        config.search.tree_budget = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn tree_reuse_is_incompatible_with_temporal_policy() {
        let mut config = PolicyConfig::new(PolicyKind::TemporalMcts);
        config.search.tree_reuse = true;
        assert!(config.validate().is_err());
        config.kind = PolicyKind::Mcts;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.policy = PolicyConfig::new(PolicyKind::TemporalMcts).with_seed(42);
        config.simulation.initial_location = "A".to_string();
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let loaded = Config::from_json_path(&path).unwrap();
        assert_eq!(loaded.policy.kind, PolicyKind::TemporalMcts);
        assert_eq!(loaded.policy.seed, Some(42));
        assert_eq!(loaded.simulation.initial_location, "A");
    }

    #[test]
    fn negative_uct_parameter_is_rejected() {
        let mut config = PolicyConfig::default();
        config.search.uct_parameter = -0.1;
        assert!(config.validate().is_err());
    }
}
