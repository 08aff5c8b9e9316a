//! Satisfaction report types.
//!
//! The report states, for every employee and every active shift category,
//! whether the final allocation honours one of the employee's bids.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ShiftCategory;

/// Whether a single bid was honoured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidOutcome {
    /// The duty the bid asked for.
    pub duty_id: String,
    /// The bid's rank, if ranked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
    /// True when an allocation matches this bid.
    pub allocated: bool,
}

/// Satisfaction of one employee for one shift category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSatisfaction {
    /// The shift category.
    pub shift: ShiftCategory,
    /// True when one of the employee's bids for this shift was honoured.
    pub satisfied: bool,
    /// Rank of the honoured bid, when it was ranked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub honoured_rank: Option<u32>,
    /// Week in which the employee works this shift, if allocated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<u32>,
    /// The allocated duty when it differs from every bid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocated_duty_id: Option<String>,
    /// Weight earned (zero when not satisfied).
    pub weight: Decimal,
    /// Per-bid outcomes, in rank order.
    pub bids: Vec<BidOutcome>,
}

/// Satisfaction of one employee across all shift categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeSatisfaction {
    /// The employee.
    pub employee_id: String,
    /// One entry per active shift category, ordered by category.
    pub shifts: Vec<ShiftSatisfaction>,
}

impl EmployeeSatisfaction {
    /// Number of shift categories with an honoured bid.
    pub fn satisfied_count(&self) -> usize {
        self.shifts.iter().filter(|s| s.satisfied).count()
    }

    /// Returns the entry for a shift category.
    pub fn shift(&self, shift: ShiftCategory) -> Option<&ShiftSatisfaction> {
        self.shifts.iter().find(|s| s.shift == shift)
    }
}

/// Satisfied versus total preferences for one shift category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTotals {
    /// Employees whose bid for this category was honoured.
    pub satisfied: u32,
    /// Employees with a bid for this category.
    pub total: u32,
}

/// Aggregate figures behind a bid preference analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionTotals {
    /// Number of (employee, shift category) preferences.
    pub preferences_total: u32,
    /// Number of those preferences that were honoured.
    pub preferences_satisfied: u32,
    /// Sum of the weights earned; equals the solver's objective value.
    pub satisfied_weight: Decimal,
    /// Breakdown by shift category.
    pub by_shift: BTreeMap<ShiftCategory, ShiftTotals>,
}

/// Per-employee satisfaction plus totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionReport {
    /// Satisfaction keyed by employee id.
    pub employees: BTreeMap<String, EmployeeSatisfaction>,
    /// Aggregate figures.
    pub totals: SatisfactionTotals,
}

impl SatisfactionReport {
    /// Returns the satisfaction record for an employee.
    pub fn employee(&self, employee_id: &str) -> Option<&EmployeeSatisfaction> {
        self.employees.get(employee_id)
    }

    /// True when the employee's bid for `shift` was honoured. Unknown
    /// employees are reported as not satisfied.
    pub fn is_satisfied(&self, employee_id: &str, shift: ShiftCategory) -> bool {
        self.employee(employee_id)
            .and_then(|e| e.shift(shift))
            .is_some_and(|s| s.satisfied)
    }
}
