//! Exact rotation solver based on assignment and matching.
//!
//! Every employee works each shift category exactly once, and a bid's
//! weight does not depend on the week. The objective therefore only depends
//! on which duty each employee gets for each shift. For a fixed shift, a
//! duty can host at most one employee per week, so at most `W` employees in
//! total. Choosing duties per shift is a maximum-weight assignment of
//! employees to `W` copies of every duty, which bounds the optimum from
//! above.
//!
//! The bound is always reachable: joining each employee to the
//! `(duty, shift)` pairs picked for them gives a `W`-regular bipartite
//! graph, which splits into `W` perfect matchings. Matching `k` is week `k`.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::allocation::{AllocationModel, ConstraintFamily, ConstraintSense, ModelShape};

use super::bipartite::decompose_regular;
use super::hungarian::max_weight_assignment;
use super::limits::{LimitMonitor, SolveLimits};
use super::{SolveOutcome, Solution, Solver, SolverFailure};

/// Exact polynomial backend for models from the model builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct RotationMatchingSolver;

impl RotationMatchingSolver {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }

    /// Duty picked for every `(employee, shift)`, as `duty_of[e][s]`.
    fn assign_duties(
        model: &AllocationModel,
        monitor: &mut LimitMonitor,
    ) -> Result<Vec<Vec<usize>>, SolverFailure> {
        let shape = model.shape();
        let objective = model.objective();
        let mut duty_of = vec![vec![0usize; shape.shifts]; shape.employees];

        for s in 0..shape.shifts {
            monitor.tick()?;
            monitor.check_time()?;

            let profit: Vec<Vec<Decimal>> = (0..shape.employees)
                .map(|e| {
                    (0..shape.duties * shape.weeks)
                        .map(|column| objective[shape.var_index(e, column / shape.weeks, s, 0)])
                        .collect()
                })
                .collect();

            let columns = max_weight_assignment(&profit, monitor)?;
            for (e, column) in columns.into_iter().enumerate() {
                duty_of[e][s] = column / shape.weeks;
            }
        }
        Ok(duty_of)
    }

    /// Spreads each employee's shifts over the weeks.
    fn schedule_weeks(
        shape: ModelShape,
        duty_of: &[Vec<usize>],
        monitor: &mut LimitMonitor,
    ) -> Result<Vec<bool>, SolverFailure> {
        let edges: Vec<(usize, usize)> = (0..shape.employees)
            .flat_map(|e| (0..shape.shifts).map(move |s| (e, s)))
            .map(|(e, s)| (e, duty_of[e][s] * shape.shifts + s))
            .collect();

        let rounds = decompose_regular(shape.employees, &edges, shape.weeks, monitor)?;

        let mut assignment = vec![false; shape.variable_count()];
        for (week, round) in rounds.into_iter().enumerate() {
            monitor.tick()?;
            for edge in round {
                let e = edge / shape.shifts;
                let s = edge % shape.shifts;
                assignment[shape.var_index(e, duty_of[e][s], s, week)] = true;
            }
        }
        Ok(assignment)
    }

    fn run(
        model: &AllocationModel,
        monitor: &mut LimitMonitor,
    ) -> Result<Vec<bool>, SolverFailure> {
        let duty_of = Self::assign_duties(model, monitor)?;
        let assignment = Self::schedule_weeks(model.shape(), &duty_of, monitor)?;

        if let Some(violated) = model.violated_constraints(&assignment).first() {
            return Err(SolverFailure::Internal {
                message: format!("matching broke constraint {}", violated.name),
            });
        }
        Ok(assignment)
    }
}

impl Solver for RotationMatchingSolver {
    fn name(&self) -> &'static str {
        "matching"
    }

    fn solve(&self, model: &AllocationModel, limits: &SolveLimits) -> SolveOutcome {
        let mut monitor = limits.start();

        if let Err(reason) = check_supported(model) {
            return SolveOutcome::Failed {
                failure: SolverFailure::UnsupportedModel {
                    backend: self.name().to_string(),
                    reason,
                },
                stats: monitor.stats(),
            };
        }
        match classify_shape(model) {
            ShapeClass::Square => {}
            ShapeClass::Infeasible => {
                return SolveOutcome::Infeasible {
                    stats: monitor.stats(),
                };
            }
            ShapeClass::Unsupported(reason) => {
                return SolveOutcome::Failed {
                    failure: SolverFailure::UnsupportedModel {
                        backend: self.name().to_string(),
                        reason,
                    },
                    stats: monitor.stats(),
                };
            }
        }

        match Self::run(model, &mut monitor) {
            Ok(assignment) => SolveOutcome::Optimal(Solution {
                objective: model.objective_value(&assignment),
                assignment,
                stats: monitor.stats(),
            }),
            Err(failure) => SolveOutcome::Failed {
                failure,
                stats: monitor.stats(),
            },
        }
    }
}

enum ShapeClass {
    /// Employees exactly fill every slot.
    Square,
    /// No assignment can exist.
    Infeasible,
    /// Feasibility depends on slack slots the matching cannot model.
    Unsupported(String),
}

fn classify_shape(model: &AllocationModel) -> ShapeClass {
    let shape = model.shape();
    let slots = shape.slots_per_week();

    if shape.weeks != shape.shifts || shape.employees > slots {
        return ShapeClass::Infeasible;
    }
    if shape.employees < slots {
        let all_tight = model
            .constraints_of(ConstraintFamily::SlotOccupancy)
            .all(|c| c.sense == ConstraintSense::Equal);
        if all_tight {
            return ShapeClass::Infeasible;
        }
        return ShapeClass::Unsupported(format!(
            "{} employees leave some of the {} weekly slots empty",
            shape.employees, slots
        ));
    }
    ShapeClass::Square
}

/// Confirms the model is exactly the rotation structure: the three
/// constraint families, each partitioning the variables, and week-invariant
/// objective coefficients.
fn check_supported(model: &AllocationModel) -> Result<(), String> {
    let shape = model.shape();
    let count = shape.variable_count();

    if shape.employees == 0 || shape.duties == 0 || shape.shifts == 0 || shape.weeks == 0 {
        return Err("model has an empty dimension".to_string());
    }
    if model.variable_count() != count {
        return Err(format!(
            "objective has {} coefficients for {} variables",
            model.variable_count(),
            count
        ));
    }

    let mut covered: HashMap<ConstraintFamily, Vec<bool>> = HashMap::new();
    for constraint in model.constraints() {
        if constraint.rhs != 1 {
            return Err(format!("constraint {} has rhs {}", constraint.name, constraint.rhs));
        }
        let tight_only = constraint.family != ConstraintFamily::SlotOccupancy;
        if tight_only && constraint.sense != ConstraintSense::Equal {
            return Err(format!("constraint {} must be an equality", constraint.name));
        }

        let seen = covered
            .entry(constraint.family)
            .or_insert_with(|| vec![false; count]);
        let mut key = None;
        for &term in &constraint.terms {
            if term >= count || seen[term] {
                return Err(format!(
                    "constraint {} does not partition the variables",
                    constraint.name
                ));
            }
            seen[term] = true;

            let var = shape.decode(term);
            let term_key = match constraint.family {
                ConstraintFamily::EmployeeWeek => (var.employee, var.week, 0),
                ConstraintFamily::EmployeeShift => (var.employee, var.shift, 0),
                ConstraintFamily::SlotOccupancy => (var.duty, var.shift, var.week),
            };
            if *key.get_or_insert(term_key) != term_key {
                return Err(format!(
                    "constraint {} mixes variables of different groups",
                    constraint.name
                ));
            }
        }
    }

    for family in [
        ConstraintFamily::EmployeeWeek,
        ConstraintFamily::EmployeeShift,
        ConstraintFamily::SlotOccupancy,
    ] {
        let complete = covered
            .get(&family)
            .is_some_and(|seen| seen.iter().all(|s| *s));
        if !complete {
            return Err(format!("{:?} constraints do not cover every variable", family));
        }
    }

    let objective = model.objective();
    for (i, coefficient) in objective.iter().enumerate() {
        let var = shape.decode(i);
        let first_week = objective[shape.var_index(var.employee, var.duty, var.shift, 0)];
        if *coefficient != first_week {
            return Err("objective coefficients vary by week".to_string());
        }
    }
    Ok(())
}
