//! Solution extraction.
//!
//! Converts a solver assignment into [`Allocation`] records and re-checks
//! every hard rule on those records, independently of the model's own
//! constraint rows. Any violation is an internal consistency failure.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};
use crate::models::{Allocation, ShiftCategory};
use crate::solver::Solution;

use super::model::AllocationModel;
use super::validation::RotationIndex;

/// Reads the allocations out of an optimal solution.
///
/// Allocations are ordered by employee input order, then week.
///
/// # Errors
///
/// `InternalConsistency` when the assignment has the wrong length, its
/// objective disagrees with the model, or the allocations break a rule.
pub fn extract_allocations(
    model: &AllocationModel,
    solution: &Solution,
    index: &RotationIndex,
) -> EngineResult<Vec<Allocation>> {
    if solution.assignment.len() != model.variable_count() {
        return Err(inconsistent(format!(
            "assignment has {} values for {} variables",
            solution.assignment.len(),
            model.variable_count()
        )));
    }

    let recomputed = model.objective_value(&solution.assignment);
    if recomputed != solution.objective {
        return Err(inconsistent(format!(
            "solver reported objective {} but the assignment is worth {}",
            solution.objective, recomputed
        )));
    }

    let shape = model.shape();
    let mut allocations = Vec::with_capacity(shape.employees * shape.weeks);
    for e in 0..shape.employees {
        for w in 0..shape.weeks {
            for d in 0..shape.duties {
                for s in 0..shape.shifts {
                    if solution.assignment[shape.var_index(e, d, s, w)] {
                        allocations.push(Allocation {
                            employee_id: index.employee_id(e).to_string(),
                            duty_id: index.duty_id(d).to_string(),
                            shift: index.shift(s),
                            week: index.week(w),
                        });
                    }
                }
            }
        }
    }

    verify_allocations(&allocations, index)?;
    Ok(allocations)
}

/// Checks the three hard rules on a set of allocations.
///
/// - every employee works exactly one slot in every week
/// - every employee works every shift category exactly once
/// - no duty/shift/week slot holds more than one employee
///
/// # Errors
///
/// `InternalConsistency` naming the first broken rule.
pub fn verify_allocations(allocations: &[Allocation], index: &RotationIndex) -> EngineResult<()> {
    let mut per_week: HashMap<(&str, u32), u32> = HashMap::new();
    let mut per_shift: HashMap<(&str, ShiftCategory), u32> = HashMap::new();
    let mut per_slot: HashMap<(&str, ShiftCategory, u32), &str> = HashMap::new();

    for allocation in allocations {
        let known = index.employee_index(&allocation.employee_id).is_some()
            && index.duty_index(&allocation.duty_id).is_some()
            && index.shift_index(allocation.shift).is_some()
            && index.week_index(allocation.week).is_some();
        if !known {
            return Err(inconsistent(format!(
                "allocation {:?} references an unknown record",
                allocation
            )));
        }

        *per_week
            .entry((allocation.employee_id.as_str(), allocation.week))
            .or_default() += 1;
        *per_shift
            .entry((allocation.employee_id.as_str(), allocation.shift))
            .or_default() += 1;

        let slot = (allocation.duty_id.as_str(), allocation.shift, allocation.week);
        if let Some(other) = per_slot.insert(slot, allocation.employee_id.as_str()) {
            return Err(inconsistent(format!(
                "duty '{}' on the {} shift in week {} holds both '{}' and '{}'",
                allocation.duty_id, allocation.shift, allocation.week, other, allocation.employee_id
            )));
        }
    }

    for e in 0..index.employee_count() {
        let employee = index.employee_id(e);
        for w in 0..index.week_count() {
            let week = index.week(w);
            let n = per_week.get(&(employee, week)).copied().unwrap_or(0);
            if n != 1 {
                return Err(inconsistent(format!(
                    "employee '{}' has {} allocations in week {}",
                    employee, n, week
                )));
            }
        }
        for s in 0..index.shift_count() {
            let shift = index.shift(s);
            let n = per_shift.get(&(employee, shift)).copied().unwrap_or(0);
            if n != 1 {
                return Err(inconsistent(format!(
                    "employee '{}' works the {} shift {} times",
                    employee, shift, n
                )));
            }
        }
    }
    Ok(())
}

/// Sum of bid weights honoured by the allocations.
pub fn allocation_weight(allocations: &[Allocation], index: &RotationIndex) -> Decimal {
    allocations
        .iter()
        .filter_map(|a| {
            let e = index.employee_index(&a.employee_id)?;
            let d = index.duty_index(&a.duty_id)?;
            let s = index.shift_index(a.shift)?;
            index.bid_weight(e, d, s)
        })
        .sum()
}

fn inconsistent(message: String) -> EngineError {
    EngineError::InternalConsistency { message }
}
