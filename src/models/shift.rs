//! Shift categories and rotation weeks.
//!
//! A rotation is a repeating cycle of `W` weeks. Each week every employee
//! works one shift category; over the whole cycle each employee covers every
//! active category exactly once.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the fixed set of shift categories recurring each week.
///
/// Categories are ordered `Early < Late < Night`, which is the order used
/// for reporting.
///
/// # Examples
///
/// ```
/// use rota_engine::models::ShiftCategory;
///
/// assert_eq!(ShiftCategory::Night.to_string(), "night");
/// assert!(ShiftCategory::Early < ShiftCategory::Late);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftCategory {
    /// Early shift.
    Early,
    /// Late shift.
    Late,
    /// Night shift.
    Night,
}

impl ShiftCategory {
    /// All categories in reporting order.
    pub const ALL: [ShiftCategory; 3] = [
        ShiftCategory::Early,
        ShiftCategory::Late,
        ShiftCategory::Night,
    ];

    /// Returns the lowercase name used in serialized data and messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShiftCategory::Early => "early",
            ShiftCategory::Late => "late",
            ShiftCategory::Night => "night",
        }
    }
}

impl fmt::Display for ShiftCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rotation's instance of a shift category.
///
/// Exactly one `Shift` per category may be active in a rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    /// The category this shift represents.
    pub category: ShiftCategory,
    /// Optional free-text description (e.g. "06:00 - 14:00").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Shift {
    /// Creates a shift for the given category.
    pub fn new(category: ShiftCategory) -> Self {
        Self {
            category,
            description: None,
        }
    }
}

/// A position in the repeating rotation cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationWeek {
    /// 1-based position within the cycle.
    pub ordinal: u32,
    /// Optional display label (e.g. "Week 1").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl RotationWeek {
    /// Creates a rotation week with the given ordinal.
    pub fn new(ordinal: u32) -> Self {
        Self {
            ordinal,
            label: None,
        }
    }

    /// Builds the weeks `1..=count`.
    ///
    /// ```
    /// use rota_engine::models::RotationWeek;
    ///
    /// let weeks = RotationWeek::sequence(3);
    /// assert_eq!(weeks.iter().map(|w| w.ordinal).collect::<Vec<_>>(), vec![1, 2, 3]);
    /// ```
    pub fn sequence(count: u32) -> Vec<RotationWeek> {
        (1..=count).map(RotationWeek::new).collect()
    }
}
