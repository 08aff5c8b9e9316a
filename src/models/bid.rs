//! Bid model.

use serde::{Deserialize, Serialize};

use super::ShiftCategory;

/// An employee's stated preference: "I want this duty when working this
/// shift category".
///
/// Bids reference employees and duties by id. An employee submits either a
/// single unranked bid per shift category, or several ranked bids (rank 1 is
/// the first choice) on distinct duties.
///
/// # Examples
///
/// ```
/// use rota_engine::models::{Bid, ShiftCategory};
///
/// let bid = Bid::new("emp_001", ShiftCategory::Early, "mail_sorting");
/// assert!(bid.rank.is_none());
///
/// let second_choice = Bid::ranked("emp_001", ShiftCategory::Early, "scanning", 2);
/// assert_eq!(second_choice.rank, Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bid {
    /// The employee submitting the bid.
    pub employee_id: String,
    /// The shift category the bid applies to.
    pub shift: ShiftCategory,
    /// The requested duty.
    pub duty_id: String,
    /// Preference rank when several choices are submitted for one shift.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl Bid {
    /// Creates an unranked bid.
    pub fn new(
        employee_id: impl Into<String>,
        shift: ShiftCategory,
        duty_id: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            shift,
            duty_id: duty_id.into(),
            rank: None,
        }
    }

    /// Creates a ranked bid.
    pub fn ranked(
        employee_id: impl Into<String>,
        shift: ShiftCategory,
        duty_id: impl Into<String>,
        rank: u32,
    ) -> Self {
        Self {
            rank: Some(rank),
            ..Self::new(employee_id, shift, duty_id)
        }
    }
}
