//! Bid satisfaction scoring.
//!
//! Works from the raw input and the final allocations only, so the totals
//! are an independent recomputation of the solver's objective.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;

use crate::config::BidWeights;
use crate::models::{
    Allocation, AllocationInput, AnnotatedAllocation, Bid, BidOutcome, EmployeeSatisfaction,
    SatisfactionReport, SatisfactionTotals, ShiftCategory, ShiftSatisfaction, ShiftTotals,
};

/// Scores every employee's bids against the allocations.
///
/// An (employee, shift category) preference is satisfied when the duty the
/// employee works on that shift matches one of their bids for it. The
/// earned weight is the matching bid's configured weight.
pub fn score_satisfaction(
    input: &AllocationInput,
    allocations: &[Allocation],
    weights: &BidWeights,
) -> SatisfactionReport {
    let mut shifts: Vec<ShiftCategory> = input.shifts.iter().map(|s| s.category).collect();
    shifts.sort();
    shifts.dedup();

    let worked: HashMap<(&str, ShiftCategory), &Allocation> = allocations
        .iter()
        .map(|a| ((a.employee_id.as_str(), a.shift), a))
        .collect();
    let bids = bids_by_preference(&input.bids);

    let mut employees = BTreeMap::new();
    let mut totals = SatisfactionTotals {
        preferences_total: 0,
        preferences_satisfied: 0,
        satisfied_weight: Decimal::ZERO,
        by_shift: shifts.iter().map(|s| (*s, ShiftTotals::default())).collect(),
    };

    for employee in &input.employees {
        let mut entries = Vec::with_capacity(shifts.len());
        for &shift in &shifts {
            let key = (employee.id.as_str(), shift);
            let shift_bids = bids.get(&key).map(Vec::as_slice).unwrap_or_default();
            let allocation = worked.get(&key).copied();

            let entry = score_shift(shift, shift_bids, allocation, weights);

            if !shift_bids.is_empty() {
                totals.preferences_total += 1;
                let by_shift = totals.by_shift.entry(shift).or_default();
                by_shift.total += 1;
                if entry.satisfied {
                    totals.preferences_satisfied += 1;
                    by_shift.satisfied += 1;
                }
            }
            totals.satisfied_weight += entry.weight;
            entries.push(entry);
        }

        employees.insert(
            employee.id.clone(),
            EmployeeSatisfaction {
                employee_id: employee.id.clone(),
                shifts: entries,
            },
        );
    }

    SatisfactionReport { employees, totals }
}

fn score_shift(
    shift: ShiftCategory,
    bids: &[&Bid],
    allocation: Option<&Allocation>,
    weights: &BidWeights,
) -> ShiftSatisfaction {
    let allocated_duty = allocation.map(|a| a.duty_id.as_str());
    let honoured = bids.iter().find(|b| Some(b.duty_id.as_str()) == allocated_duty);

    ShiftSatisfaction {
        shift,
        satisfied: honoured.is_some(),
        honoured_rank: honoured.and_then(|b| b.rank),
        week: allocation.map(|a| a.week),
        allocated_duty_id: match honoured {
            Some(_) => None,
            None => allocated_duty.map(str::to_string),
        },
        weight: honoured
            .and_then(|b| weights.weight_for(b.rank))
            .unwrap_or(Decimal::ZERO),
        bids: bids
            .iter()
            .map(|b| BidOutcome {
                duty_id: b.duty_id.clone(),
                rank: b.rank,
                allocated: Some(b.duty_id.as_str()) == allocated_duty,
            })
            .collect(),
    }
}

/// Groups bids by (employee, shift), first choice first.
fn bids_by_preference(bids: &[Bid]) -> HashMap<(&str, ShiftCategory), Vec<&Bid>> {
    let mut grouped: HashMap<(&str, ShiftCategory), Vec<&Bid>> = HashMap::new();
    for bid in bids {
        grouped
            .entry((bid.employee_id.as_str(), bid.shift))
            .or_default()
            .push(bid);
    }
    for group in grouped.values_mut() {
        group.sort_by_key(|b| b.rank);
    }
    grouped
}

/// Pairs each allocation with the weight of the bid it honours, if any.
pub fn annotate_allocations(
    allocations: &[Allocation],
    bids: &[Bid],
    weights: &BidWeights,
) -> Vec<AnnotatedAllocation> {
    let grouped = bids_by_preference(bids);
    allocations
        .iter()
        .map(|allocation| {
            let bid_weight = grouped
                .get(&(allocation.employee_id.as_str(), allocation.shift))
                .and_then(|group| group.iter().find(|b| b.duty_id == allocation.duty_id))
                .and_then(|b| weights.weight_for(b.rank));
            AnnotatedAllocation {
                allocation: allocation.clone(),
                bid_weight,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Duty, Employee, RotationWeek, Shift};

    fn allocation(employee: &str, duty: &str, shift: ShiftCategory, week: u32) -> Allocation {
        Allocation {
            employee_id: employee.to_string(),
            duty_id: duty.to_string(),
            shift,
            week,
        }
    }

    fn input() -> AllocationInput {
        AllocationInput {
            employees: vec![Employee::new("a", "A"), Employee::new("b", "B")],
            duties: vec![Duty::new("sorting", "Sorting"), Duty::new("scanning", "Scanning")],
            shifts: vec![Shift::new(ShiftCategory::Early)],
            weeks: RotationWeek::sequence(1),
            bids: vec![
                Bid::new("a", ShiftCategory::Early, "sorting"),
                Bid::ranked("b", ShiftCategory::Early, "scanning", 2),
                Bid::ranked("b", ShiftCategory::Early, "sorting", 1),
            ],
        }
    }

    #[test]
    fn test_satisfied_and_unsatisfied_preferences() {
        let allocations = vec![
            allocation("a", "sorting", ShiftCategory::Early, 1),
            allocation("b", "scanning", ShiftCategory::Early, 1),
        ];
        let report = score_satisfaction(&input(), &allocations, &BidWeights::default());

        assert!(report.is_satisfied("a", ShiftCategory::Early));
        assert!(report.is_satisfied("b", ShiftCategory::Early));

        let b = report.employee("b").unwrap().shift(ShiftCategory::Early).unwrap();
        assert_eq!(b.honoured_rank, Some(2));
        assert_eq!(b.weight, Decimal::new(2, 0));
        assert_eq!(b.bids[0].duty_id, "sorting");
        assert!(!b.bids[0].allocated);
        assert!(b.bids[1].allocated);

        assert_eq!(report.totals.preferences_total, 2);
        assert_eq!(report.totals.preferences_satisfied, 2);
        assert_eq!(report.totals.satisfied_weight, Decimal::new(3, 0));
    }

    #[test]
    fn test_unmatched_allocation_reports_duty() {
        let allocations = vec![
            allocation("a", "scanning", ShiftCategory::Early, 1),
            allocation("b", "sorting", ShiftCategory::Early, 1),
        ];
        let report = score_satisfaction(&input(), &allocations, &BidWeights::default());

        let a = report.employee("a").unwrap().shift(ShiftCategory::Early).unwrap();
        assert!(!a.satisfied);
        assert_eq!(a.allocated_duty_id.as_deref(), Some("scanning"));
        assert_eq!(a.weight, Decimal::ZERO);

        let totals = report.totals.by_shift[&ShiftCategory::Early];
        assert_eq!(totals, ShiftTotals { satisfied: 1, total: 2 });
        assert_eq!(report.totals.satisfied_weight, Decimal::new(3, 0));
    }

    #[test]
    fn test_no_allocations_scores_zero() {
        let report = score_satisfaction(&input(), &[], &BidWeights::default());

        assert_eq!(report.totals.preferences_satisfied, 0);
        assert_eq!(report.totals.satisfied_weight, Decimal::ZERO);
        let a = report.employee("a").unwrap().shift(ShiftCategory::Early).unwrap();
        assert_eq!(a.week, None);
        assert_eq!(a.allocated_duty_id, None);
    }

    #[test]
    fn test_annotations_carry_bid_weight() {
        let allocations = vec![
            allocation("a", "scanning", ShiftCategory::Early, 1),
            allocation("b", "sorting", ShiftCategory::Early, 1),
        ];
        let annotated = annotate_allocations(&allocations, &input().bids, &BidWeights::default());

        assert_eq!(annotated[0].bid_weight, None);
        assert_eq!(annotated[1].bid_weight, Some(Decimal::new(3, 0)));
        assert_eq!(annotated[1].allocation, allocations[1]);
    }
}
