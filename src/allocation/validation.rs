//! Input validation.
//!
//! Checks an [`AllocationInput`] before any constraint model is built and
//! produces a [`RotationIndex`]: dense integer positions for employees,
//! duties, shift categories and weeks, plus each employee's weighted bid
//! preferences per shift category.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::config::BidWeights;
use crate::error::{EngineError, EngineResult};
use crate::models::{AllocationInput, ShiftCategory};

/// A validated bid, resolved to dense indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidPreference {
    /// Position of the requested duty.
    pub duty: usize,
    /// The bid's rank, if ranked.
    pub rank: Option<u32>,
    /// Objective weight earned when the bid is honoured.
    pub weight: Decimal,
}

/// Dense view of a validated allocation input.
///
/// Employees and duties keep their input order. Shift categories are sorted
/// (`Early < Late < Night`) and weeks are ordered by ordinal.
#[derive(Debug, Clone)]
pub struct RotationIndex {
    employee_ids: Vec<String>,
    duty_ids: Vec<String>,
    shifts: Vec<ShiftCategory>,
    weeks: Vec<u32>,
    employee_lookup: HashMap<String, usize>,
    duty_lookup: HashMap<String, usize>,
    /// `preferences[employee][shift]`, sorted by rank.
    preferences: Vec<Vec<Vec<BidPreference>>>,
}

impl RotationIndex {
    /// Number of employees.
    pub fn employee_count(&self) -> usize {
        self.employee_ids.len()
    }

    /// Number of duties.
    pub fn duty_count(&self) -> usize {
        self.duty_ids.len()
    }

    /// Number of active shift categories.
    pub fn shift_count(&self) -> usize {
        self.shifts.len()
    }

    /// Number of rotation weeks.
    pub fn week_count(&self) -> usize {
        self.weeks.len()
    }

    /// Id of the employee at `index`.
    pub fn employee_id(&self, index: usize) -> &str {
        &self.employee_ids[index]
    }

    /// Id of the duty at `index`.
    pub fn duty_id(&self, index: usize) -> &str {
        &self.duty_ids[index]
    }

    /// Shift category at `index`.
    pub fn shift(&self, index: usize) -> ShiftCategory {
        self.shifts[index]
    }

    /// Week ordinal at `index`.
    pub fn week(&self, index: usize) -> u32 {
        self.weeks[index]
    }

    /// Position of an employee id.
    pub fn employee_index(&self, id: &str) -> Option<usize> {
        self.employee_lookup.get(id).copied()
    }

    /// Position of a duty id.
    pub fn duty_index(&self, id: &str) -> Option<usize> {
        self.duty_lookup.get(id).copied()
    }

    /// Position of a shift category.
    pub fn shift_index(&self, shift: ShiftCategory) -> Option<usize> {
        self.shifts.iter().position(|s| *s == shift)
    }

    /// Position of a week ordinal.
    pub fn week_index(&self, ordinal: u32) -> Option<usize> {
        self.weeks.iter().position(|w| *w == ordinal)
    }

    /// The employee's preferences for a shift, first choice first.
    pub fn preferences(&self, employee: usize, shift: usize) -> &[BidPreference] {
        &self.preferences[employee][shift]
    }

    /// Weight earned if `employee` works `duty` on `shift`, if they bid for it.
    pub fn bid_weight(&self, employee: usize, duty: usize, shift: usize) -> Option<Decimal> {
        self.preferences(employee, shift)
            .iter()
            .find(|p| p.duty == duty)
            .map(|p| p.weight)
    }
}

/// Validates an allocation input and builds its [`RotationIndex`].
///
/// # Errors
///
/// - `EmptyInput` when employees, duties, shifts or weeks is empty
/// - `DuplicateReference` for repeated employee/duty ids, shift categories or week ordinals
/// - `InvalidWeeks` when week ordinals are not exactly `1..=W`
/// - `UnknownReference` when a bid names an unknown employee, duty or inactive shift
/// - `InvalidBid` for a rank of zero, a rank without a configured weight, or gapped ranks
/// - `DuplicateBid` for conflicting bids on one shift category
/// - `MissingBid` when an employee has no bid for an active shift category
///
/// # Example
///
/// ```
/// use rota_engine::allocation::validate_input;
/// use rota_engine::config::BidWeights;
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
/// let index = validate_input(&input, &BidWeights::default()).unwrap();
/// assert_eq!(index.employee_count(), 1);
/// ```
pub fn validate_input(
    input: &AllocationInput,
    weights: &BidWeights,
) -> EngineResult<RotationIndex> {
    require_non_empty("employees", input.employees.len())?;
    require_non_empty("duties", input.duties.len())?;
    require_non_empty("shifts", input.shifts.len())?;
    require_non_empty("weeks", input.weeks.len())?;

    let employee_ids: Vec<String> = input.employees.iter().map(|e| e.id.clone()).collect();
    let employee_lookup = unique_lookup("employee", &employee_ids)?;

    let duty_ids: Vec<String> = input.duties.iter().map(|d| d.id.clone()).collect();
    let duty_lookup = unique_lookup("duty", &duty_ids)?;

    let mut shifts: Vec<ShiftCategory> = Vec::with_capacity(input.shifts.len());
    for shift in &input.shifts {
        if shifts.contains(&shift.category) {
            return Err(EngineError::DuplicateReference {
                kind: "shift".to_string(),
                id: shift.category.to_string(),
            });
        }
        shifts.push(shift.category);
    }
    shifts.sort();

    let weeks = validate_weeks(input)?;

    let mut preferences = vec![vec![Vec::new(); shifts.len()]; employee_ids.len()];

    for bid in &input.bids {
        let employee = employee_lookup.get(&bid.employee_id).copied().ok_or_else(|| {
            EngineError::UnknownReference {
                kind: "employee".to_string(),
                id: bid.employee_id.clone(),
            }
        })?;
        let duty = duty_lookup.get(&bid.duty_id).copied().ok_or_else(|| {
            EngineError::UnknownReference {
                kind: "duty".to_string(),
                id: bid.duty_id.clone(),
            }
        })?;
        let shift = shifts
            .iter()
            .position(|s| *s == bid.shift)
            .ok_or_else(|| EngineError::UnknownReference {
                kind: "shift".to_string(),
                id: bid.shift.to_string(),
            })?;

        if bid.rank == Some(0) {
            return Err(EngineError::InvalidBid {
                employee_id: bid.employee_id.clone(),
                message: "ranks start at 1".to_string(),
            });
        }
        let weight = weights
            .weight_for(bid.rank)
            .ok_or_else(|| EngineError::InvalidBid {
                employee_id: bid.employee_id.clone(),
                message: format!(
                    "no weight configured for rank {}",
                    bid.rank.unwrap_or_default()
                ),
            })?;

        preferences[employee][shift].push(BidPreference {
            duty,
            rank: bid.rank,
            weight,
        });
    }

    for (employee, per_shift) in preferences.iter_mut().enumerate() {
        for (shift, prefs) in per_shift.iter_mut().enumerate() {
            check_shift_bids(
                &employee_ids[employee],
                shifts[shift],
                prefs,
                &duty_ids,
            )?;
            prefs.sort_by_key(|p| p.rank);
        }
    }

    Ok(RotationIndex {
        employee_ids,
        duty_ids,
        shifts,
        weeks,
        employee_lookup,
        duty_lookup,
        preferences,
    })
}

fn require_non_empty(kind: &str, len: usize) -> EngineResult<()> {
    if len == 0 {
        return Err(EngineError::EmptyInput {
            kind: kind.to_string(),
        });
    }
    Ok(())
}

fn unique_lookup(kind: &str, ids: &[String]) -> EngineResult<HashMap<String, usize>> {
    let mut lookup = HashMap::with_capacity(ids.len());
    for (i, id) in ids.iter().enumerate() {
        if lookup.insert(id.clone(), i).is_some() {
            return Err(EngineError::DuplicateReference {
                kind: kind.to_string(),
                id: id.clone(),
            });
        }
    }
    Ok(lookup)
}

fn validate_weeks(input: &AllocationInput) -> EngineResult<Vec<u32>> {
    let mut weeks: Vec<u32> = input.weeks.iter().map(|w| w.ordinal).collect();
    weeks.sort_unstable();

    if let Some(pair) = weeks.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(EngineError::DuplicateReference {
            kind: "week".to_string(),
            id: pair[0].to_string(),
        });
    }
    for (expected, ordinal) in (1u32..).zip(&weeks) {
        if *ordinal != expected {
            return Err(EngineError::InvalidWeeks {
                message: format!(
                    "expected week ordinals 1..={} but found {}",
                    weeks.len(),
                    ordinal
                ),
            });
        }
    }
    Ok(weeks)
}

/// Enforces one unranked bid, or distinct ranks `1..=k` on distinct duties.
fn check_shift_bids(
    employee_id: &str,
    shift: ShiftCategory,
    prefs: &[BidPreference],
    duty_ids: &[String],
) -> EngineResult<()> {
    if prefs.is_empty() {
        return Err(EngineError::MissingBid {
            employee_id: employee_id.to_string(),
            shift,
        });
    }
    if prefs.len() == 1 {
        return match prefs[0].rank {
            None | Some(1) => Ok(()),
            Some(rank) => Err(EngineError::InvalidBid {
                employee_id: employee_id.to_string(),
                message: format!("a single {} bid must have rank 1, got {}", shift, rank),
            }),
        };
    }

    let duplicate = |message: String| EngineError::DuplicateBid {
        employee_id: employee_id.to_string(),
        shift,
        message,
    };

    let unranked = prefs.iter().filter(|p| p.rank.is_none()).count();
    if unranked == prefs.len() {
        return Err(duplicate(format!("{} unranked bids", unranked)));
    }
    if unranked > 0 {
        return Err(duplicate("ranked and unranked bids are mixed".to_string()));
    }

    let mut duties = HashSet::with_capacity(prefs.len());
    for p in prefs {
        if !duties.insert(p.duty) {
            return Err(duplicate(format!("duty '{}' is bid more than once", duty_ids[p.duty])));
        }
    }

    let mut ranks: Vec<u32> = prefs.iter().filter_map(|p| p.rank).collect();
    ranks.sort_unstable();
    if let Some(pair) = ranks.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(duplicate(format!("rank {} is used more than once", pair[0])));
    }
    if ranks.iter().zip(1u32..).any(|(rank, expected)| *rank != expected) {
        return Err(EngineError::InvalidBid {
            employee_id: employee_id.to_string(),
            message: format!("{} ranks must run from 1 to {} without gaps", shift, ranks.len()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Bid, Duty, Employee, RotationWeek, Shift};

    fn three_by_three() -> AllocationInput {
        let employees = vec![
            Employee::new("emp_001", "Samuel Brown"),
            Employee::new("emp_002", "Noah Chen"),
            Employee::new("emp_003", "Belissica Gellor"),
        ];
        let bids = employees
            .iter()
            .flat_map(|e| {
                ShiftCategory::ALL
                    .iter()
                    .map(move |s| Bid::new(e.id.clone(), *s, "sorting"))
            })
            .collect();
        AllocationInput {
            employees,
            duties: vec![Duty::new("sorting", "Mail Sorting")],
            shifts: ShiftCategory::ALL.iter().map(|s| Shift::new(*s)).collect(),
            weeks: RotationWeek::sequence(3),
            bids,
        }
    }

    fn validate(input: &AllocationInput) -> EngineResult<RotationIndex> {
        validate_input(input, &BidWeights::default())
    }

    #[test]
    fn test_valid_input_builds_index() {
        let index = validate(&three_by_three()).unwrap();

        assert_eq!(index.employee_count(), 3);
        assert_eq!(index.duty_count(), 1);
        assert_eq!(index.shift_count(), 3);
        assert_eq!(index.week_count(), 3);
        assert_eq!(index.employee_index("emp_002"), Some(1));
        assert_eq!(index.shift_index(ShiftCategory::Night), Some(2));
        assert_eq!(index.bid_weight(0, 0, 0), Some(Decimal::ONE));
    }

    #[test]
    fn test_shifts_are_sorted_and_weeks_ordered() {
        let mut input = three_by_three();
        input.shifts.reverse();
        input.weeks.reverse();

        let index = validate(&input).unwrap();
        assert_eq!(index.shift(0), ShiftCategory::Early);
        assert_eq!(index.week(0), 1);
        assert_eq!(index.week_index(3), Some(2));
    }

    #[test]
    fn test_empty_employees_rejected() {
        let mut input = three_by_three();
        input.employees.clear();
        input.bids.clear();

        match validate(&input) {
            Err(EngineError::EmptyInput { kind }) => assert_eq!(kind, "employees"),
            other => panic!("Expected EmptyInput, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_employee_rejected() {
        let mut input = three_by_three();
        input.employees.push(Employee::new("emp_001", "Someone Else"));

        match validate(&input) {
            Err(EngineError::DuplicateReference { kind, id }) => {
                assert_eq!(kind, "employee");
                assert_eq!(id, "emp_001");
            }
            other => panic!("Expected DuplicateReference, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_shift_category_rejected() {
        let mut input = three_by_three();
        input.shifts.push(Shift::new(ShiftCategory::Late));

        assert!(matches!(
            validate(&input),
            Err(EngineError::DuplicateReference { ref kind, .. }) if kind == "shift"
        ));
    }

    #[test]
    fn test_week_gap_rejected() {
        let mut input = three_by_three();
        input.weeks = vec![RotationWeek::new(1), RotationWeek::new(2), RotationWeek::new(4)];

        assert!(matches!(validate(&input), Err(EngineError::InvalidWeeks { .. })));
    }

    #[test]
    fn test_duplicate_week_rejected() {
        let mut input = three_by_three();
        input.weeks = vec![RotationWeek::new(1), RotationWeek::new(2), RotationWeek::new(2)];

        match validate(&input) {
            Err(EngineError::DuplicateReference { kind, id }) => {
                assert_eq!(kind, "week");
                assert_eq!(id, "2");
            }
            other => panic!("Expected DuplicateReference, got {:?}", other),
        }
    }

    #[test]
    fn test_bid_for_unknown_duty_rejected() {
        let mut input = three_by_three();
        input.bids[0].duty_id = "juggling".to_string();

        match validate(&input) {
            Err(EngineError::UnknownReference { kind, id }) => {
                assert_eq!(kind, "duty");
                assert_eq!(id, "juggling");
            }
            other => panic!("Expected UnknownReference, got {:?}", other),
        }
    }

    #[test]
    fn test_bid_for_unknown_employee_rejected() {
        let mut input = three_by_three();
        input
            .bids
            .push(Bid::new("emp_404", ShiftCategory::Early, "sorting"));

        assert!(matches!(
            validate(&input),
            Err(EngineError::UnknownReference { ref kind, .. }) if kind == "employee"
        ));
    }

    #[test]
    fn test_bid_for_inactive_shift_rejected() {
        let mut input = three_by_three();
        input.shifts.retain(|s| s.category != ShiftCategory::Night);

        match validate(&input) {
            Err(EngineError::UnknownReference { kind, id }) => {
                assert_eq!(kind, "shift");
                assert_eq!(id, "night");
            }
            other => panic!("Expected UnknownReference, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_bid_rejected() {
        let mut input = three_by_three();
        input
            .bids
            .retain(|b| !(b.employee_id == "emp_003" && b.shift == ShiftCategory::Late));

        match validate(&input) {
            Err(EngineError::MissingBid { employee_id, shift }) => {
                assert_eq!(employee_id, "emp_003");
                assert_eq!(shift, ShiftCategory::Late);
            }
            other => panic!("Expected MissingBid, got {:?}", other),
        }
    }

    #[test]
    fn test_two_unranked_bids_rejected() {
        let mut input = three_by_three();
        input.duties.push(Duty::new("scanning", "Scanning"));
        input
            .bids
            .push(Bid::new("emp_001", ShiftCategory::Early, "scanning"));

        match validate(&input) {
            Err(EngineError::DuplicateBid { employee_id, shift, message }) => {
                assert_eq!(employee_id, "emp_001");
                assert_eq!(shift, ShiftCategory::Early);
                assert_eq!(message, "2 unranked bids");
            }
            other => panic!("Expected DuplicateBid, got {:?}", other),
        }
    }

    #[test]
    fn test_mixed_ranked_and_unranked_rejected() {
        let mut input = three_by_three();
        input.duties.push(Duty::new("scanning", "Scanning"));
        input
            .bids
            .push(Bid::ranked("emp_001", ShiftCategory::Early, "scanning", 1));

        assert!(matches!(
            validate(&input),
            Err(EngineError::DuplicateBid { ref message, .. }) if message.contains("mixed")
        ));
    }

    #[test]
    fn test_ranked_bids_sorted_and_weighted() {
        let mut input = three_by_three();
        input.duties.push(Duty::new("scanning", "Scanning"));
        input
            .bids
            .retain(|b| !(b.employee_id == "emp_001" && b.shift == ShiftCategory::Early));
        input
            .bids
            .push(Bid::ranked("emp_001", ShiftCategory::Early, "sorting", 2));
        input
            .bids
            .push(Bid::ranked("emp_001", ShiftCategory::Early, "scanning", 1));

        let index = validate(&input).unwrap();
        let prefs = index.preferences(0, 0);
        assert_eq!(prefs.len(), 2);
        assert_eq!(prefs[0].rank, Some(1));
        assert_eq!(prefs[0].duty, 1);
        assert_eq!(prefs[0].weight, Decimal::new(3, 0));
        assert_eq!(index.bid_weight(0, 0, 0), Some(Decimal::new(2, 0)));
    }

    #[test]
    fn test_gapped_ranks_rejected() {
        let mut input = three_by_three();
        input.duties.push(Duty::new("scanning", "Scanning"));
        input
            .bids
            .retain(|b| !(b.employee_id == "emp_001" && b.shift == ShiftCategory::Early));
        input
            .bids
            .push(Bid::ranked("emp_001", ShiftCategory::Early, "sorting", 1));
        input
            .bids
            .push(Bid::ranked("emp_001", ShiftCategory::Early, "scanning", 3));

        assert!(matches!(validate(&input), Err(EngineError::InvalidBid { .. })));
    }

    #[test]
    fn test_same_duty_ranked_twice_rejected() {
        let mut input = three_by_three();
        input
            .bids
            .retain(|b| !(b.employee_id == "emp_002" && b.shift == ShiftCategory::Night));
        input
            .bids
            .push(Bid::ranked("emp_002", ShiftCategory::Night, "sorting", 1));
        input
            .bids
            .push(Bid::ranked("emp_002", ShiftCategory::Night, "sorting", 2));

        assert!(matches!(
            validate(&input),
            Err(EngineError::DuplicateBid { ref message, .. }) if message.contains("more than once")
        ));
    }

    #[test]
    fn test_rank_zero_rejected() {
        let mut input = three_by_three();
        input.bids[0].rank = Some(0);

        assert!(matches!(validate(&input), Err(EngineError::InvalidBid { .. })));
    }

    #[test]
    fn test_rank_without_weight_rejected() {
        let mut input = three_by_three();
        let weights = BidWeights {
            unranked: Decimal::ONE,
            ranked: vec![],
        };
        input.bids[0].rank = Some(1);

        match validate_input(&input, &weights) {
            Err(EngineError::InvalidBid { message, .. }) => {
                assert_eq!(message, "no weight configured for rank 1");
            }
            other => panic!("Expected InvalidBid, got {:?}", other),
        }
    }
}
