//! Core data models for the rota allocation engine.
//!
//! This module contains the domain records passed into an allocation run and
//! the result types it returns. No behaviour beyond small accessors.

mod allocation;
mod allocation_result;
mod bid;
mod employee;
mod satisfaction;
mod shift;

pub use allocation::{Allocation, AllocationInput, AnnotatedAllocation};
pub use allocation_result::{
    AllocationResult, AllocationStatus, AuditStep, AuditTrace, AuditWarning, SolverSummary,
};
pub use bid::Bid;
pub use employee::{Duty, Employee};
pub use satisfaction::{
    BidOutcome, EmployeeSatisfaction, SatisfactionReport, SatisfactionTotals, ShiftSatisfaction,
    ShiftTotals,
};
pub use shift::{RotationWeek, Shift, ShiftCategory};
