//! Request types for the rota allocation API.
//!
//! This module defines the JSON request structure for the `/allocate` endpoint.

use serde::{Deserialize, Serialize};

use crate::config::{EngineConfig, SolverBackend};
use crate::error::EngineResult;
use crate::models::AllocationInput;

/// Request body for the `/allocate` endpoint.
///
/// The allocation input's fields sit at the top level of the JSON body;
/// `options` is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Employees, duties, shifts, weeks and bids.
    #[serde(flatten)]
    pub input: AllocationInput,
    /// Per-request solver overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<SolveOptions>,
}

/// Solver settings a caller may override for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveOptions {
    /// Backend to run instead of the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<SolverBackend>,
    /// Time limit in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
    /// Node limit for the branch and bound backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_limit: Option<u64>,
}

impl SolveOptions {
    /// Applies the overrides on top of `base`, re-checking the result.
    pub fn apply(&self, base: &EngineConfig) -> EngineResult<EngineConfig> {
        let mut config = base.clone();
        if let Some(backend) = self.backend {
            config.solver.backend = backend;
        }
        if let Some(time_limit_ms) = self.time_limit_ms {
            config.solver.time_limit_ms = time_limit_ms;
        }
        if let Some(node_limit) = self.node_limit {
            config.solver.node_limit = Some(node_limit);
        }
        config.validate()?;
        Ok(config)
    }
}

impl AllocationRequest {
    /// Splits the request into its input and the configuration to run with.
    pub fn into_parts(self, base: &EngineConfig) -> EngineResult<(AllocationInput, EngineConfig)> {
        let config = match &self.options {
            Some(options) => options.apply(base)?,
            None => base.clone(),
        };
        Ok((self.input, config))
    }
}
