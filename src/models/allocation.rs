//! Allocation records and the input snapshot they are derived from.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Bid, Duty, Employee, RotationWeek, Shift, ShiftCategory};

/// "This employee works this duty, in this shift category, in this week of
/// the rotation."
///
/// Allocations are produced only by a successful solve and have no identity
/// beyond their four-key tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Allocation {
    /// The allocated employee.
    pub employee_id: String,
    /// The allocated duty.
    pub duty_id: String,
    /// The shift category worked.
    pub shift: ShiftCategory,
    /// The rotation week ordinal (1-based).
    pub week: u32,
}

/// An allocation together with the weight of the bid it honours, if any.
///
/// This is the "did the employee ask for this" view used by schedule
/// presentations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedAllocation {
    /// The allocation itself.
    #[serde(flatten)]
    pub allocation: Allocation,
    /// Weight of the matching bid, `None` when the allocation was not bid for.
    pub bid_weight: Option<Decimal>,
}

/// The in-memory snapshot an allocation run operates on.
///
/// Callers load this from their own store; the engine never reads or writes
/// external state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllocationInput {
    /// Employees in the rotation.
    pub employees: Vec<Employee>,
    /// Duties to be covered.
    pub duties: Vec<Duty>,
    /// Active shift categories.
    pub shifts: Vec<Shift>,
    /// Rotation weeks.
    pub weeks: Vec<RotationWeek>,
    /// Employees' bids.
    #[serde(default)]
    pub bids: Vec<Bid>,
}
