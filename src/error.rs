//! Error types for the rota allocation engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure that stops an allocation run. Infeasibility and solver
//! failures are not errors: they are reported as an
//! [`AllocationStatus`](crate::models::AllocationStatus) on the result.

use thiserror::Error;

use crate::models::ShiftCategory;

/// The main error type for the rota allocation engine.
///
/// # Example
///
/// ```
/// use rota_engine::error::EngineError;
/// use rota_engine::models::ShiftCategory;
///
/// let error = EngineError::MissingBid {
///     employee_id: "emp_001".to_string(),
///     shift: ShiftCategory::Night,
/// };
/// assert_eq!(error.to_string(), "Employee 'emp_001' has no bid for the night shift");
/// assert!(error.is_validation());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// Configuration parsed but holds values the engine cannot use.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// A description of the invalid setting.
        message: String,
    },

    /// A required input collection was empty.
    #[error("No {kind} supplied")]
    EmptyInput {
        /// The kind of record that was missing (e.g. "employees").
        kind: String,
    },

    /// Two reference records share the same identity.
    #[error("Duplicate {kind} '{id}'")]
    DuplicateReference {
        /// The kind of record (employee, duty, shift, week).
        kind: String,
        /// The repeated identifier.
        id: String,
    },

    /// Rotation week ordinals do not form the sequence `1..=W`.
    #[error("Invalid rotation weeks: {message}")]
    InvalidWeeks {
        /// A description of the problem.
        message: String,
    },

    /// A bid referenced an employee, duty or shift that is not part of the rotation.
    #[error("Bid references unknown {kind} '{id}'")]
    UnknownReference {
        /// The kind of record that could not be resolved.
        kind: String,
        /// The unresolved identifier.
        id: String,
    },

    /// An employee has no bid for one of the active shift categories.
    #[error("Employee '{employee_id}' has no bid for the {shift} shift")]
    MissingBid {
        /// The employee missing a bid.
        employee_id: String,
        /// The shift category without a bid.
        shift: ShiftCategory,
    },

    /// An employee submitted conflicting bids for one shift category.
    #[error("Employee '{employee_id}' has more than one {shift} bid: {message}")]
    DuplicateBid {
        /// The employee with the duplicate bids.
        employee_id: String,
        /// The shift category concerned.
        shift: ShiftCategory,
        /// What makes the bids conflict.
        message: String,
    },

    /// A bid was well-referenced but otherwise unusable (e.g. an unweighted rank).
    #[error("Invalid bid from employee '{employee_id}': {message}")]
    InvalidBid {
        /// The employee who submitted the bid.
        employee_id: String,
        /// A description of what made the bid invalid.
        message: String,
    },

    /// Post-solve re-validation failed. Always signals a defect in the
    /// model builder or a solver backend.
    #[error("Internal consistency check failed: {message}")]
    InternalConsistency {
        /// A description of the violated invariant.
        message: String,
    },
}

impl EngineError {
    /// Returns true for errors caused by malformed caller input, which are
    /// always raised before a constraint model is built.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EngineError::EmptyInput { .. }
                | EngineError::DuplicateReference { .. }
                | EngineError::InvalidWeeks { .. }
                | EngineError::UnknownReference { .. }
                | EngineError::MissingBid { .. }
                | EngineError::DuplicateBid { .. }
                | EngineError::InvalidBid { .. }
        )
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
