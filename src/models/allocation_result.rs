//! Allocation result models.
//!
//! This module contains the [`AllocationResult`] type and its associated
//! structures that capture all outputs of an allocation run: the status,
//! allocations, objective value, satisfaction report and an audit trace.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Allocation, AnnotatedAllocation, SatisfactionReport};

/// Outcome of an allocation run.
///
/// # Example
///
/// ```
/// use rota_engine::models::AllocationStatus;
///
/// let status = AllocationStatus::SolverError;
/// assert_eq!(serde_json::to_string(&status).unwrap(), "\"solver_error\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationStatus {
    /// A feasible assignment maximising the objective was found.
    Optimal,
    /// No assignment satisfies every hard constraint.
    Infeasible,
    /// The solver backend failed to produce an outcome.
    SolverError,
}

/// How the solve step went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverSummary {
    /// Name of the backend that ran.
    pub backend: String,
    /// Search nodes (or matching rounds) explored.
    pub nodes: u64,
    /// Wall-clock time spent solving, in microseconds.
    pub duration_us: u64,
}

/// A single step in the audit trace recording a pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// Identifier of the pipeline stage (e.g. "build_model").
    pub stage: String,
    /// The input figures for this stage.
    pub input: serde_json::Value,
    /// The output figures of this stage.
    pub output: serde_json::Value,
    /// Human-readable explanation.
    pub reasoning: String,
}

/// A warning raised during an allocation run.
///
/// Warnings flag conditions that do not prevent a result but deserve
/// attention, such as an infeasible slot structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level (e.g., "low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for an allocation run.
///
/// # Example
///
/// ```
/// use rota_engine::models::AuditTrace;
///
/// let trace = AuditTrace {
///     steps: vec![],
///     warnings: vec![],
///     duration_us: 1234,
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// The sequence of pipeline steps.
    pub steps: Vec<AuditStep>,
    /// Any warnings raised.
    pub warnings: Vec<AuditWarning>,
    /// The total run duration in microseconds.
    pub duration_us: u64,
}

/// The complete result of an allocation run.
///
/// `allocations`, `objective_value` and `satisfaction` are populated only
/// when `status` is [`AllocationStatus::Optimal`]. `failure` explains an
/// `Infeasible` or `SolverError` outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    /// Unique identifier for this run.
    pub run_id: Uuid,
    /// When the run was performed.
    pub timestamp: DateTime<Utc>,
    /// The version of the engine that performed the run.
    pub engine_version: String,
    /// Outcome of the run.
    pub status: AllocationStatus,
    /// Allocations ordered by employee input order then week.
    pub allocations: Vec<Allocation>,
    /// The same allocations, each annotated with the bid it honours.
    pub annotated_allocations: Vec<AnnotatedAllocation>,
    /// Weighted count of honoured bids.
    pub objective_value: Option<Decimal>,
    /// Satisfaction report.
    pub satisfaction: Option<SatisfactionReport>,
    /// Reason for an infeasible or failed run.
    pub failure: Option<String>,
    /// Solver statistics, absent when no solver ran.
    pub solver: Option<SolverSummary>,
    /// Audit trace of the pipeline.
    pub audit_trace: AuditTrace,
}

impl AllocationResult {
    /// Returns true when an optimal allocation was produced.
    pub fn is_optimal(&self) -> bool {
        self.status == AllocationStatus::Optimal
    }
}
