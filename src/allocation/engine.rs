//! The allocation pipeline.
//!
//! validate -> build model -> solve -> extract -> score, with an audit step
//! recorded for every stage that ran.

use std::time::Instant;

use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Allocation, AllocationInput, AllocationResult, AllocationStatus, AnnotatedAllocation,
    AuditStep, AuditTrace, AuditWarning, SatisfactionReport, SolverSummary,
};
use crate::solver::{SolveLimits, SolveOutcome, Solver, SolverStats, solver_for};

use super::extract::extract_allocations;
use super::model::ModelBuilder;
use super::satisfaction::{annotate_allocations, score_satisfaction};
use super::validation::validate_input;

/// Runs allocations with a fixed configuration and solver backend.
///
/// An `Allocator` holds no per-run state; `allocate` takes `&self` and can
/// be called from several threads at once.
///
/// # Example
///
/// ```
/// use rota_engine::allocation::Allocator;
/// use rota_engine::config::EngineConfig;
/// use rota_engine::models::*;
///
/// let input = AllocationInput {
///     employees: vec![Employee::new("emp_001", "Samuel Brown")],
///     duties: vec![Duty::new("sorting", "Mail Sorting")],
///     shifts: vec![Shift::new(ShiftCategory::Early)],
///     weeks: RotationWeek::sequence(1),
///     bids: vec![Bid::new("emp_001", ShiftCategory::Early, "sorting")],
/// };
///
/// let allocator = Allocator::new(EngineConfig::default()).unwrap();
/// let result = allocator.allocate(&input).unwrap();
/// assert_eq!(result.status, AllocationStatus::Optimal);
/// assert_eq!(result.allocations.len(), 1);
/// ```
pub struct Allocator {
    config: EngineConfig,
    solver: Box<dyn Solver>,
}

impl std::fmt::Debug for Allocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Allocator")
            .field("config", &self.config)
            .field("solver", &self.solver.name())
            .finish()
    }
}

impl Allocator {
    /// Creates an allocator using the backend named in `config`.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when a configuration value is out of range.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let solver = solver_for(config.solver.backend);
        Self::with_solver(config, solver)
    }

    /// Creates an allocator with an explicit backend.
    pub fn with_solver(config: EngineConfig, solver: Box<dyn Solver>) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self { config, solver })
    }

    /// The configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name of the solver backend in use.
    pub fn backend(&self) -> &'static str {
        self.solver.name()
    }

    /// Allocates every employee to one duty slot per week.
    ///
    /// Returns `Ok` with status `Optimal`, `Infeasible` or `SolverError`.
    ///
    /// # Errors
    ///
    /// - validation errors for malformed input (see [`validate_input`])
    /// - `InternalConsistency` when the solver's answer fails re-checking
    pub fn allocate(&self, input: &AllocationInput) -> EngineResult<AllocationResult> {
        let mut run = RunRecorder::start();
        info!(
            run_id = %run.run_id,
            backend = self.solver.name(),
            employees = input.employees.len(),
            duties = input.duties.len(),
            shifts = input.shifts.len(),
            weeks = input.weeks.len(),
            bids = input.bids.len(),
            "Starting allocation run"
        );

        let index = validate_input(input, &self.config.weights).inspect_err(|err| {
            warn!(run_id = %run.run_id, error = %err, "Allocation input rejected");
        })?;
        run.step(
            "validate_input",
            json!({
                "employees": input.employees.len(),
                "duties": input.duties.len(),
                "shifts": input.shifts.len(),
                "weeks": input.weeks.len(),
                "bids": input.bids.len()
            }),
            json!({ "valid": true }),
            "Every reference resolves and every employee bids for every active shift category",
        );

        let model = match ModelBuilder::new(&index).build() {
            Ok(model) => model,
            Err(mismatch) => {
                warn!(
                    run_id = %run.run_id,
                    reason = %mismatch,
                    "Rotation structure cannot be filled"
                );
                run.warn("STRUCTURAL_MISMATCH", mismatch.to_string(), "high");
                run.step(
                    "build_model",
                    json!({
                        "employees": index.employee_count(),
                        "duties": index.duty_count(),
                        "shifts": index.shift_count(),
                        "weeks": index.week_count()
                    }),
                    json!({ "built": false }),
                    &mismatch.to_string(),
                );
                return Ok(run.finish(RunOutcome::unsolved(
                    AllocationStatus::Infeasible,
                    mismatch.to_string(),
                    None,
                )));
            }
        };
        debug!(
            run_id = %run.run_id,
            variables = model.variable_count(),
            constraints = model.constraints().len(),
            "Model built"
        );
        run.step(
            "build_model",
            json!({
                "employees": index.employee_count(),
                "duties": index.duty_count(),
                "shifts": index.shift_count(),
                "weeks": index.week_count()
            }),
            json!({
                "variables": model.variable_count(),
                "constraints": model.constraints().len()
            }),
            "One binary variable per employee, duty, shift and week",
        );

        let limits = SolveLimits::from_config(&self.config.solver);
        let outcome = self.solver.solve(&model, &limits);
        let summary = self.summary(outcome.stats());
        debug!(
            run_id = %run.run_id,
            backend = self.solver.name(),
            nodes = summary.nodes,
            duration_us = summary.duration_us,
            "Solve finished"
        );

        let solution = match outcome {
            SolveOutcome::Optimal(solution) => solution,
            SolveOutcome::Infeasible { .. } => {
                let reason = "no assignment satisfies every hard constraint".to_string();
                warn!(run_id = %run.run_id, "Model is infeasible");
                run.warn("INFEASIBLE", reason.clone(), "high");
                run.step(
                    "solve",
                    json!({ "backend": summary.backend }),
                    json!({ "status": "infeasible", "nodes": summary.nodes }),
                    &reason,
                );
                return Ok(run.finish(RunOutcome::unsolved(
                    AllocationStatus::Infeasible,
                    reason,
                    Some(summary),
                )));
            }
            SolveOutcome::Failed { failure, .. } => {
                warn!(run_id = %run.run_id, error = %failure, "Solver failed");
                run.warn("SOLVER_FAILURE", failure.to_string(), "high");
                run.step(
                    "solve",
                    json!({ "backend": summary.backend }),
                    json!({ "status": "solver_error", "nodes": summary.nodes }),
                    &failure.to_string(),
                );
                return Ok(run.finish(RunOutcome::unsolved(
                    AllocationStatus::SolverError,
                    failure.to_string(),
                    Some(summary),
                )));
            }
        };
        run.step(
            "solve",
            json!({ "backend": summary.backend }),
            json!({
                "status": "optimal",
                "objective": solution.objective.to_string(),
                "nodes": summary.nodes
            }),
            "Maximised the total weight of honoured bids",
        );

        let allocations = extract_allocations(&model, &solution, &index).inspect_err(|err| {
            error!(
                run_id = %run.run_id,
                error = %err,
                "Extracted allocations failed re-checking"
            );
        })?;
        run.step(
            "extract",
            json!({ "variables": model.variable_count() }),
            json!({ "allocations": allocations.len() }),
            "Every employee works one slot per week and every shift category once",
        );

        let satisfaction = score_satisfaction(input, &allocations, &self.config.weights);
        if satisfaction.totals.satisfied_weight != solution.objective {
            let err = EngineError::InternalConsistency {
                message: format!(
                    "satisfied weight {} differs from objective {}",
                    satisfaction.totals.satisfied_weight, solution.objective
                ),
            };
            error!(run_id = %run.run_id, error = %err, "Satisfaction does not match objective");
            return Err(err);
        }
        run.step(
            "score_satisfaction",
            json!({ "allocations": allocations.len() }),
            json!({
                "preferences_total": satisfaction.totals.preferences_total,
                "preferences_satisfied": satisfaction.totals.preferences_satisfied,
                "satisfied_weight": satisfaction.totals.satisfied_weight.to_string()
            }),
            "Compared every bid with the duty worked on that shift",
        );

        let annotated = annotate_allocations(&allocations, &input.bids, &self.config.weights);
        Ok(run.finish(RunOutcome::solved(
            allocations,
            annotated,
            solution.objective,
            satisfaction,
            summary,
        )))
    }

    fn summary(&self, stats: SolverStats) -> SolverSummary {
        SolverSummary {
            backend: self.solver.name().to_string(),
            nodes: stats.nodes,
            duration_us: stats.duration_us,
        }
    }
}

/// Runs one allocation with the backend named in `config`.
///
/// # Errors
///
/// As [`Allocator::new`] and [`Allocator::allocate`].
pub fn allocate(input: &AllocationInput, config: &EngineConfig) -> EngineResult<AllocationResult> {
    Allocator::new(config.clone())?.allocate(input)
}

struct RunOutcome {
    status: AllocationStatus,
    allocations: Vec<Allocation>,
    annotated: Vec<AnnotatedAllocation>,
    objective: Option<Decimal>,
    satisfaction: Option<SatisfactionReport>,
    failure: Option<String>,
    solver: Option<SolverSummary>,
}

impl RunOutcome {
    fn unsolved(status: AllocationStatus, failure: String, solver: Option<SolverSummary>) -> Self {
        Self {
            status,
            allocations: Vec::new(),
            annotated: Vec::new(),
            objective: None,
            satisfaction: None,
            failure: Some(failure),
            solver,
        }
    }

    fn solved(
        allocations: Vec<Allocation>,
        annotated: Vec<AnnotatedAllocation>,
        objective: Decimal,
        satisfaction: SatisfactionReport,
        solver: SolverSummary,
    ) -> Self {
        Self {
            status: AllocationStatus::Optimal,
            allocations,
            annotated,
            objective: Some(objective),
            satisfaction: Some(satisfaction),
            failure: None,
            solver: Some(solver),
        }
    }
}

struct RunRecorder {
    run_id: Uuid,
    started: Instant,
    steps: Vec<AuditStep>,
    warnings: Vec<AuditWarning>,
}

impl RunRecorder {
    fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started: Instant::now(),
            steps: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn step(
        &mut self,
        stage: &str,
        input: serde_json::Value,
        output: serde_json::Value,
        reasoning: &str,
    ) {
        self.steps.push(AuditStep {
            step_number: self.steps.len() as u32 + 1,
            stage: stage.to_string(),
            input,
            output,
            reasoning: reasoning.to_string(),
        });
    }

    fn warn(&mut self, code: &str, message: String, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message,
            severity: severity.to_string(),
        });
    }

    fn finish(self, outcome: RunOutcome) -> AllocationResult {
        let duration_us = self.started.elapsed().as_micros() as u64;
        info!(
            run_id = %self.run_id,
            status = ?outcome.status,
            allocations = outcome.allocations.len(),
            objective = ?outcome.objective,
            duration_us,
            "Allocation run finished"
        );

        AllocationResult {
            run_id: self.run_id,
            timestamp: Utc::now(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            status: outcome.status,
            allocations: outcome.allocations,
            annotated_allocations: outcome.annotated,
            objective_value: outcome.objective,
            satisfaction: outcome.satisfaction,
            failure: outcome.failure,
            solver: outcome.solver,
            audit_trace: AuditTrace {
                steps: self.steps,
                warnings: self.warnings,
                duration_us,
            },
        }
    }
}
