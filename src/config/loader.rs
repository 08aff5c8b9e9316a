//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

use super::types::{BidWeights, EngineConfig, SolverConfig, SolverFile, WeightsFile};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/standard/
/// ├── solver.yaml    # Solver backend and limits
/// └── weights.yaml   # Bid weights (unranked and by rank)
/// ```
///
/// # Example
///
/// ```no_run
/// use rota_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/standard").unwrap();
/// println!("Solver time limit: {}ms", loader.solver().time_limit_ms);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - Either file is missing
    /// - Either file contains invalid YAML
    /// - A value is out of range (e.g. a non-positive weight)
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let solver = Self::load_yaml::<SolverFile>(&path.join("solver.yaml"))?.solver;
        let weights = Self::load_yaml::<WeightsFile>(&path.join("weights.yaml"))?.weights;

        let config = EngineConfig::new(solver, weights)?;
        Ok(Self { config })
    }

    /// Wraps an in-memory configuration, checking every value.
    pub fn from_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the solver settings.
    pub fn solver(&self) -> &SolverConfig {
        &self.config.solver
    }

    /// Returns the bid weights.
    pub fn weights(&self) -> &BidWeights {
        &self.config.weights
    }
}
