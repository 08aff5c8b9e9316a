//! Solver backends for the allocation model.
//!
//! A [`Solver`] takes a built [`AllocationModel`] and returns a
//! [`SolveOutcome`]. Two backends are provided:
//!
//! - [`RotationMatchingSolver`]: exact and polynomial for models produced by
//!   the model builder. It solves a maximum-weight assignment per shift
//!   category, then splits the chosen employee/slot pairs into weeks.
//! - [`BranchAndBoundSolver`]: generic depth-first 0-1 search with
//!   propagation, used for arbitrary unit-coefficient models and as a
//!   cross-check of the matching backend.
//!
//! Backends hold no mutable state, so one instance can serve concurrent
//! solves.

mod bipartite;
mod branch_and_bound;
mod hungarian;
mod limits;
mod matching;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::allocation::AllocationModel;
use crate::config::SolverBackend;

pub use bipartite::decompose_regular;
pub use branch_and_bound::{BranchAndBoundSolver, MAX_SEARCH_VARIABLES};
pub use hungarian::max_weight_assignment;
pub use limits::{LimitMonitor, SolveLimits};
pub use matching::RotationMatchingSolver;

/// Counters reported by a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    /// Search nodes, or matching rounds, explored.
    pub nodes: u64,
    /// Wall-clock solve time in microseconds.
    pub duration_us: u64,
}

/// An optimal assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// Value of every decision variable.
    pub assignment: Vec<bool>,
    /// Objective value of the assignment.
    pub objective: Decimal,
    /// Counters.
    pub stats: SolverStats,
}

/// Reasons a backend can fail to decide a model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolverFailure {
    /// The wall-clock budget ran out.
    #[error("time limit of {limit_ms}ms exceeded")]
    TimeLimitExceeded {
        /// The configured limit.
        limit_ms: u64,
    },

    /// The search explored more nodes than allowed.
    #[error("node limit of {limit} exceeded")]
    NodeLimitExceeded {
        /// The configured limit.
        limit: u64,
    },

    /// The backend cannot handle this model's shape.
    #[error("{backend} backend cannot solve this model: {reason}")]
    UnsupportedModel {
        /// Backend name.
        backend: String,
        /// What is unsupported.
        reason: String,
    },

    /// The backend broke one of its own invariants.
    #[error("solver fault: {message}")]
    Internal {
        /// What went wrong.
        message: String,
    },
}

/// Result of a solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveOutcome {
    /// An optimal assignment was found.
    Optimal(Solution),
    /// The backend proved no assignment satisfies every constraint.
    Infeasible {
        /// Counters.
        stats: SolverStats,
    },
    /// The backend gave up.
    Failed {
        /// Why.
        failure: SolverFailure,
        /// Counters at the point of failure.
        stats: SolverStats,
    },
}

impl SolveOutcome {
    /// Counters, whatever the outcome.
    pub fn stats(&self) -> SolverStats {
        match self {
            Self::Optimal(solution) => solution.stats,
            Self::Infeasible { stats } | Self::Failed { stats, .. } => *stats,
        }
    }
}

/// A backend that solves allocation models.
pub trait Solver: Send + Sync {
    /// Short backend name, reported in results and logs.
    fn name(&self) -> &'static str;

    /// Solves the model within the given limits.
    fn solve(&self, model: &AllocationModel, limits: &SolveLimits) -> SolveOutcome;
}

/// Returns the backend selected in configuration.
pub fn solver_for(backend: SolverBackend) -> Box<dyn Solver> {
    match backend {
        SolverBackend::Matching => Box::new(RotationMatchingSolver::new()),
        SolverBackend::BranchAndBound => Box::new(BranchAndBoundSolver::new()),
    }
}
