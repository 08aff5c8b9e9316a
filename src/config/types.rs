//! Configuration types for the allocation engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from YAML configuration files.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Default wall-clock limit for a single solve.
pub const DEFAULT_TIME_LIMIT_MS: u64 = 10_000;

/// Which solver backend runs the constraint model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Exact matching-based algorithm for the rotation structure.
    #[default]
    Matching,
    /// Generic 0-1 branch and bound.
    BranchAndBound,
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// The backend to run.
    #[serde(default)]
    pub backend: SolverBackend,
    /// Wall-clock limit for the solve step in milliseconds.
    #[serde(default = "default_time_limit_ms")]
    pub time_limit_ms: u64,
    /// Maximum number of search nodes (branch and bound only).
    #[serde(default)]
    pub node_limit: Option<u64>,
}

fn default_time_limit_ms() -> u64 {
    DEFAULT_TIME_LIMIT_MS
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: SolverBackend::default(),
            time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            node_limit: None,
        }
    }
}

impl SolverConfig {
    /// Returns the time limit as a [`Duration`].
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }

    fn validate(&self) -> EngineResult<()> {
        if self.time_limit_ms == 0 {
            return Err(EngineError::InvalidConfig {
                message: "solver.time_limit_ms must be greater than zero".to_string(),
            });
        }
        if self.node_limit == Some(0) {
            return Err(EngineError::InvalidConfig {
                message: "solver.node_limit must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

/// Largest weight a bid may carry. Keeps objective sums far from the
/// `Decimal` range.
pub const MAX_BID_WEIGHT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Objective weights for bids.
///
/// An unranked bid earns `unranked` when honoured; a ranked bid of rank `r`
/// earns `ranked[r - 1]`.
///
/// # Example
///
/// ```
/// use rota_engine::config::BidWeights;
/// use rust_decimal::Decimal;
///
/// let weights = BidWeights::default();
/// assert_eq!(weights.weight_for(None), Some(Decimal::ONE));
/// assert_eq!(weights.weight_for(Some(1)), Some(Decimal::new(3, 0)));
/// assert_eq!(weights.weight_for(Some(4)), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidWeights {
    /// Weight of an honoured unranked bid.
    #[serde(default = "default_unranked_weight")]
    pub unranked: Decimal,
    /// Weights of honoured ranked bids, first choice first.
    #[serde(default = "default_ranked_weights")]
    pub ranked: Vec<Decimal>,
}

fn default_unranked_weight() -> Decimal {
    Decimal::ONE
}

fn default_ranked_weights() -> Vec<Decimal> {
    vec![Decimal::new(3, 0), Decimal::new(2, 0), Decimal::ONE]
}

impl Default for BidWeights {
    fn default() -> Self {
        Self {
            unranked: default_unranked_weight(),
            ranked: default_ranked_weights(),
        }
    }
}

impl BidWeights {
    /// Returns the weight for a bid of the given rank, or `None` if the rank
    /// has no configured weight.
    pub fn weight_for(&self, rank: Option<u32>) -> Option<Decimal> {
        match rank {
            None => Some(self.unranked),
            Some(0) => None,
            Some(r) => self.ranked.get(r as usize - 1).copied(),
        }
    }

    fn validate(&self) -> EngineResult<()> {
        let named = std::iter::once(("weights.unranked".to_string(), self.unranked)).chain(
            self.ranked
                .iter()
                .enumerate()
                .map(|(i, w)| (format!("weights.ranked[{}]", i), *w)),
        );
        for (name, weight) in named {
            if weight <= Decimal::ZERO {
                return Err(EngineError::InvalidConfig {
                    message: format!("{} must be positive, got {}", name, weight),
                });
            }
            if weight > MAX_BID_WEIGHT {
                return Err(EngineError::InvalidConfig {
                    message: format!(
                        "{} must be at most {}, got {}",
                        name, MAX_BID_WEIGHT, weight
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Shape of `solver.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct SolverFile {
    /// Solver settings.
    pub solver: SolverConfig,
}

/// Shape of `weights.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeightsFile {
    /// Bid weights.
    pub weights: BidWeights,
}

/// The complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Solver settings.
    #[serde(default)]
    pub solver: SolverConfig,
    /// Bid weights.
    #[serde(default)]
    pub weights: BidWeights,
}

impl EngineConfig {
    /// Creates a configuration from its parts, checking every value.
    pub fn new(solver: SolverConfig, weights: BidWeights) -> EngineResult<Self> {
        let config = Self { solver, weights };
        config.validate()?;
        Ok(config)
    }

    /// Checks that every setting is usable.
    pub fn validate(&self) -> EngineResult<()> {
        self.solver.validate()?;
        self.weights.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_weight_for_rank_zero_is_none() {
        assert_eq!(BidWeights::default().weight_for(Some(0)), None);
    }

    #[test]
    fn test_weight_for_ranks() {
        let weights = BidWeights::default();
        assert_eq!(weights.weight_for(Some(2)), Some(Decimal::new(2, 0)));
        assert_eq!(weights.weight_for(Some(3)), Some(Decimal::ONE));
    }

    #[test]
    fn test_zero_time_limit_rejected() {
        let solver = SolverConfig {
            time_limit_ms: 0,
            ..SolverConfig::default()
        };
        let result = EngineConfig::new(solver, BidWeights::default());
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_zero_node_limit_rejected() {
        let solver = SolverConfig {
            node_limit: Some(0),
            ..SolverConfig::default()
        };
        let result = EngineConfig::new(solver, BidWeights::default());
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let weights = BidWeights {
            unranked: Decimal::ONE,
            ranked: vec![Decimal::new(2, 0), Decimal::ZERO],
        };
        match EngineConfig::new(SolverConfig::default(), weights) {
            Err(EngineError::InvalidConfig { message }) => {
                assert!(message.contains("weights.ranked[1]"));
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_weight_rejected() {
        let weights = BidWeights {
            unranked: Decimal::MAX,
            ranked: vec![Decimal::new(3, 0)],
        };
        match EngineConfig::new(SolverConfig::default(), weights) {
            Err(EngineError::InvalidConfig { message }) => {
                assert!(message.contains("weights.unranked must be at most 1000000"));
            }
            other => panic!("Expected InvalidConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_largest_weight_accepted() {
        let weights = BidWeights {
            unranked: MAX_BID_WEIGHT,
            ranked: vec![MAX_BID_WEIGHT, Decimal::ONE],
        };
        assert!(EngineConfig::new(SolverConfig::default(), weights).is_ok());
    }

    #[test]
    fn test_solver_config_defaults_from_yaml() {
        let config: SolverConfig = serde_yaml::from_str("backend: branch_and_bound").unwrap();
        assert_eq!(config.backend, SolverBackend::BranchAndBound);
        assert_eq!(config.time_limit_ms, DEFAULT_TIME_LIMIT_MS);
        assert_eq!(config.node_limit, None);
    }

    #[test]
    fn test_time_limit_duration() {
        let config = SolverConfig {
            time_limit_ms: 250,
            ..SolverConfig::default()
        };
        assert_eq!(config.time_limit(), Duration::from_millis(250));
    }
}
