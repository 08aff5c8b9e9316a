//! Allocation of employees to duty rotations.
//!
//! The pipeline validates an [`AllocationInput`](crate::models::AllocationInput),
//! builds a 0-1 constraint model, hands it to a solver backend, extracts and
//! re-checks the allocations, then scores bid satisfaction. [`allocate`] and
//! [`Allocator`] run the whole pipeline; the stages are exported for callers
//! that want to inspect intermediate results.

mod engine;
mod extract;
mod model;
mod satisfaction;
mod validation;

pub use engine::{Allocator, allocate};
pub use extract::{allocation_weight, extract_allocations, verify_allocations};
pub use model::{
    AllocationModel, ConstraintFamily, ConstraintSense, LinearConstraint, ModelBuilder,
    ModelShape, StructuralMismatch, VarKey, build_model,
};
pub use satisfaction::{annotate_allocations, score_satisfaction};
pub use validation::{BidPreference, RotationIndex, validate_input};

#[cfg(test)]
pub(crate) use model::rotation_model;
