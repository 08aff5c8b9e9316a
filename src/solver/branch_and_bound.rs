//! Generic 0-1 branch and bound.
//!
//! Depth-first search over unit-coefficient `=` and `<=` rows. Each node
//! picks the unsatisfied equality row with the fewest free variables and
//! branches on its most valuable free variable, trying 1 before 0. After
//! every decision, rows that became full fix their remaining variables to 0
//! and equality rows with exactly enough free variables fix them to 1.
//! Decisions are recorded on a trail and undone on backtrack.
//!
//! The bound packs the free variables into disjoint rows: a row can still
//! take at most `rhs - count` more ones, each worth at most its best free
//! coefficient. Two packings are tried (rows in order and in reverse) and
//! the tighter one is used.
//!
//! The search recurses once per decision, so its depth is bounded by the
//! variable count. Models above [`MAX_SEARCH_VARIABLES`] are refused as
//! unsupported; the matching backend handles full-size rotations.

use rust_decimal::Decimal;

use crate::allocation::{AllocationModel, ConstraintSense};

use super::limits::{LimitMonitor, SolveLimits};
use super::{SolveOutcome, Solution, Solver, SolverFailure};

/// Largest model the recursive search accepts.
pub const MAX_SEARCH_VARIABLES: usize = 4_096;

/// Exact backend for any model with unit-coefficient rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBoundSolver;

impl BranchAndBoundSolver {
    /// Creates the backend.
    pub fn new() -> Self {
        Self
    }
}

impl Solver for BranchAndBoundSolver {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    fn solve(&self, model: &AllocationModel, limits: &SolveLimits) -> SolveOutcome {
        let mut search = match Search::new(model, limits.start()) {
            Ok(search) => search,
            Err(reason) => {
                return SolveOutcome::Failed {
                    failure: SolverFailure::UnsupportedModel {
                        backend: self.name().to_string(),
                        reason,
                    },
                    stats: limits.start().stats(),
                };
            }
        };

        let all_rows: Vec<usize> = (0..model.constraints().len()).collect();
        if !search.propagate(all_rows) {
            return SolveOutcome::Infeasible {
                stats: search.monitor.stats(),
            };
        }

        if let Err(failure) = search.search() {
            return SolveOutcome::Failed {
                failure,
                stats: search.monitor.stats(),
            };
        }

        let stats = search.monitor.stats();
        match search.best {
            Some(Incumbent {
                assignment,
                objective,
            }) => SolveOutcome::Optimal(Solution {
                assignment,
                objective,
                stats,
            }),
            None => SolveOutcome::Infeasible { stats },
        }
    }
}

/// Disjoint rows plus the variables none of them contain.
struct Cover {
    rows: Vec<usize>,
    loose: Vec<usize>,
}

struct Incumbent {
    assignment: Vec<bool>,
    objective: Decimal,
}

struct Search<'m> {
    model: &'m AllocationModel,
    objective: &'m [Decimal],
    rows_of: Vec<Vec<usize>>,
    /// Variables at 1 per row.
    count: Vec<u32>,
    /// Unassigned variables per row.
    free: Vec<u32>,
    value: Vec<Option<bool>>,
    trail: Vec<usize>,
    current: Decimal,
    covers: Vec<Cover>,
    best: Option<Incumbent>,
    monitor: LimitMonitor,
}

impl<'m> Search<'m> {
    fn new(model: &'m AllocationModel, monitor: LimitMonitor) -> Result<Self, String> {
        let n = model.variable_count();
        if n > MAX_SEARCH_VARIABLES {
            return Err(format!(
                "{} variables exceed the search limit of {}",
                n, MAX_SEARCH_VARIABLES
            ));
        }
        let constraints = model.constraints();
        let mut rows_of = vec![Vec::new(); n];

        for (r, constraint) in constraints.iter().enumerate() {
            let mut terms = constraint.terms.clone();
            terms.sort_unstable();
            if terms.windows(2).any(|pair| pair[0] == pair[1]) {
                return Err(format!("constraint {} repeats a variable", constraint.name));
            }
            if let Some(&term) = terms.iter().find(|&&t| t >= n) {
                return Err(format!(
                    "constraint {} references variable {} of {}",
                    constraint.name, term, n
                ));
            }
            for &term in &constraint.terms {
                rows_of[term].push(r);
            }
        }

        let forward = Self::cover(model, 0..constraints.len());
        let backward = Self::cover(model, (0..constraints.len()).rev());

        Ok(Self {
            model,
            objective: model.objective(),
            rows_of,
            count: vec![0; constraints.len()],
            free: constraints.iter().map(|c| c.terms.len() as u32).collect(),
            value: vec![None; n],
            trail: Vec::with_capacity(n),
            current: Decimal::ZERO,
            covers: vec![forward, backward],
            best: None,
            monitor,
        })
    }

    fn cover(model: &AllocationModel, order: impl Iterator<Item = usize>) -> Cover {
        let constraints = model.constraints();
        let mut covered = vec![false; model.variable_count()];
        let mut rows = Vec::new();

        for r in order {
            let terms = &constraints[r].terms;
            if terms.iter().all(|&t| !covered[t]) {
                for &t in terms {
                    covered[t] = true;
                }
                rows.push(r);
            }
        }

        let loose = (0..covered.len()).filter(|&v| !covered[v]).collect();
        Cover { rows, loose }
    }

    fn row_consistent(&self, r: usize) -> bool {
        let constraint = &self.model.constraints()[r];
        if self.count[r] > constraint.rhs {
            return false;
        }
        constraint.sense != ConstraintSense::Equal
            || self.count[r] + self.free[r] >= constraint.rhs
    }

    /// Sets a variable, returning false if any of its rows became
    /// unsatisfiable. Bookkeeping is complete either way so `undo` stays
    /// symmetric.
    fn assign(&mut self, var: usize, on: bool) -> bool {
        self.value[var] = Some(on);
        self.trail.push(var);
        if on {
            self.current += self.objective[var];
        }

        for &r in &self.rows_of[var] {
            self.free[r] -= 1;
            if on {
                self.count[r] += 1;
            }
        }
        self.rows_of[var].iter().all(|&r| self.row_consistent(r))
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            let Some(var) = self.trail.pop() else {
                break;
            };
            let on = self.value[var].take() == Some(true);
            if on {
                self.current -= self.objective[var];
            }
            for &r in &self.rows_of[var] {
                self.free[r] += 1;
                if on {
                    self.count[r] -= 1;
                }
            }
        }
    }

    fn propagate(&mut self, mut pending: Vec<usize>) -> bool {
        let model = self.model;
        let constraints = model.constraints();
        while let Some(r) = pending.pop() {
            if !self.row_consistent(r) {
                return false;
            }
            if self.free[r] == 0 {
                continue;
            }

            let constraint = &constraints[r];
            let forced = if self.count[r] == constraint.rhs {
                false
            } else if constraint.sense == ConstraintSense::Equal
                && self.count[r] + self.free[r] == constraint.rhs
            {
                true
            } else {
                continue;
            };

            for &t in &constraint.terms {
                if self.value[t].is_some() {
                    continue;
                }
                if !self.assign(t, forced) {
                    return false;
                }
                pending.extend(self.rows_of[t].iter().copied());
            }
        }
        true
    }

    fn bound(&self) -> Decimal {
        let constraints = self.model.constraints();
        let gain = |v: usize| -> Option<Decimal> {
            let c = self.objective[v];
            (self.value[v].is_none() && c > Decimal::ZERO).then_some(c)
        };

        let mut tightest: Option<Decimal> = None;
        for cover in &self.covers {
            let mut total = Decimal::ZERO;
            for &r in &cover.rows {
                let remaining = constraints[r].rhs.saturating_sub(self.count[r]).min(self.free[r]);
                if remaining == 0 {
                    continue;
                }
                if let Some(top) = constraints[r].terms.iter().filter_map(|&t| gain(t)).max() {
                    total += top * Decimal::from(remaining);
                }
            }
            total += cover.loose.iter().filter_map(|&v| gain(v)).sum::<Decimal>();
            tightest = Some(tightest.map_or(total, |t| t.min(total)));
        }

        self.current + tightest.unwrap_or(Decimal::ZERO)
    }

    /// Unsatisfied equality row with the fewest free variables.
    fn select_row(&self) -> Option<usize> {
        self.model
            .constraints()
            .iter()
            .enumerate()
            .filter(|(r, c)| c.sense == ConstraintSense::Equal && self.count[*r] < c.rhs)
            .min_by_key(|(r, _)| self.free[*r])
            .map(|(r, _)| r)
    }

    fn most_valuable_free(&self, r: usize) -> Option<usize> {
        let mut best: Option<usize> = None;
        for &t in &self.model.constraints()[r].terms {
            if self.value[t].is_some() {
                continue;
            }
            if best.is_none_or(|b| self.objective[t] > self.objective[b]) {
                best = Some(t);
            }
        }
        best
    }

    fn next_variable(&self) -> Option<usize> {
        match self.select_row() {
            Some(r) => self.most_valuable_free(r),
            None => (0..self.value.len())
                .find(|&v| self.value[v].is_none() && self.objective[v] > Decimal::ZERO),
        }
    }

    fn search(&mut self) -> Result<(), SolverFailure> {
        self.monitor.tick()?;

        if let Some(best) = &self.best
            && self.bound() <= best.objective
        {
            return Ok(());
        }

        match self.next_variable() {
            Some(var) => self.branch(var),
            None => {
                self.record();
                Ok(())
            }
        }
    }

    fn branch(&mut self, var: usize) -> Result<(), SolverFailure> {
        for on in [true, false] {
            let mark = self.trail.len();
            if self.assign(var, on) && self.propagate(self.rows_of[var].clone()) {
                self.search()?;
            }
            self.undo(mark);
        }
        Ok(())
    }

    /// Stores the current assignment, unassigned variables at 0, when it
    /// beats the incumbent. Equal objectives keep the earlier solution.
    fn record(&mut self) {
        let improves = self
            .best
            .as_ref()
            .is_none_or(|best| self.current > best.objective);
        if improves {
            self.best = Some(Incumbent {
                assignment: self.value.iter().map(|v| *v == Some(true)).collect(),
                objective: self.current,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{
        ConstraintFamily, LinearConstraint, ModelShape, build_model, rotation_model,
        validate_input,
    };
    use crate::config::BidWeights;
    use crate::models::{AllocationInput, Bid, Duty, Employee, RotationWeek, Shift, ShiftCategory};
    use crate::solver::RotationMatchingSolver;
    use proptest::prelude::*;
    use std::time::Duration;

    fn limits() -> SolveLimits {
        SolveLimits::new(Duration::from_secs(10))
    }

    fn optimal(outcome: SolveOutcome) -> Solution {
        match outcome {
            SolveOutcome::Optimal(solution) => solution,
            other => panic!("Expected Optimal, got {:?}", other),
        }
    }

    fn uniform_model() -> AllocationModel {
        let employees: Vec<Employee> = ["a", "b", "c"]
            .iter()
            .map(|id| Employee::new(*id, id.to_uppercase()))
            .collect();
        let bids = employees
            .iter()
            .flat_map(|e| {
                ShiftCategory::ALL
                    .iter()
                    .map(move |s| Bid::new(e.id.clone(), *s, "sorting"))
            })
            .collect();
        let input = AllocationInput {
            employees,
            duties: vec![Duty::new("sorting", "Mail Sorting")],
            shifts: ShiftCategory::ALL.iter().map(|s| Shift::new(*s)).collect(),
            weeks: RotationWeek::sequence(3),
            bids,
        };
        let index = validate_input(&input, &BidWeights::default()).unwrap();
        build_model(&index).unwrap()
    }

    fn shape(employees: usize, duties: usize, shifts: usize, weeks: usize) -> ModelShape {
        ModelShape {
            employees,
            duties,
            shifts,
            weeks,
        }
    }

    #[test]
    fn test_rotation_with_all_bids_honoured() {
        let model = uniform_model();
        let solution = optimal(BranchAndBoundSolver::new().solve(&model, &limits()));

        assert_eq!(solution.objective, Decimal::new(9, 0));
        assert!(model.violated_constraints(&solution.assignment).is_empty());
    }

    #[test]
    fn test_at_most_row_knapsack() {
        let row = LinearConstraint {
            name: "pick_two".to_string(),
            family: ConstraintFamily::SlotOccupancy,
            terms: vec![0, 1, 2],
            sense: ConstraintSense::AtMost,
            rhs: 2,
        };
        let objective = vec![Decimal::new(3, 0), Decimal::new(2, 0), Decimal::new(4, 0)];
        let model = AllocationModel::from_parts("pick", shape(1, 1, 1, 3), objective, vec![row]);

        let solution = optimal(BranchAndBoundSolver::new().solve(&model, &limits()));
        assert_eq!(solution.objective, Decimal::new(7, 0));
        assert_eq!(solution.assignment, vec![true, false, true]);
    }

    #[test]
    fn test_overstaffed_rotation_infeasible() {
        let s = shape(2, 1, 1, 1);
        let model = rotation_model(s, vec![Decimal::ONE; 2], ConstraintSense::AtMost);

        assert!(matches!(
            BranchAndBoundSolver::new().solve(&model, &limits()),
            SolveOutcome::Infeasible { .. }
        ));
    }

    #[test]
    fn test_week_mismatch_infeasible() {
        let s = shape(3, 1, 3, 2);
        let ones = vec![Decimal::ONE; s.variable_count()];
        let model = rotation_model(s, ones, ConstraintSense::AtMost);

        assert!(matches!(
            BranchAndBoundSolver::new().solve(&model, &limits()),
            SolveOutcome::Infeasible { .. }
        ));
    }

    #[test]
    fn test_understaffed_slack_rotation_solved() {
        let s = shape(2, 1, 3, 3);
        let ones = vec![Decimal::ONE; s.variable_count()];
        let model = rotation_model(s, ones, ConstraintSense::AtMost);

        let solution = optimal(BranchAndBoundSolver::new().solve(&model, &limits()));
        assert_eq!(solution.objective, Decimal::new(6, 0));
        assert!(model.violated_constraints(&solution.assignment).is_empty());
    }

    #[test]
    fn test_node_limit_reported() {
        let model = uniform_model();
        let tight = limits().with_node_limit(1);

        assert!(matches!(
            BranchAndBoundSolver::new().solve(&model, &tight),
            SolveOutcome::Failed {
                failure: SolverFailure::NodeLimitExceeded { limit: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_term_unsupported() {
        let row = LinearConstraint {
            name: "twice".to_string(),
            family: ConstraintFamily::EmployeeWeek,
            terms: vec![0, 0],
            sense: ConstraintSense::Equal,
            rhs: 1,
        };
        let model =
            AllocationModel::from_parts("bad", shape(1, 1, 1, 1), vec![Decimal::ONE], vec![row]);

        assert!(matches!(
            BranchAndBoundSolver::new().solve(&model, &limits()),
            SolveOutcome::Failed {
                failure: SolverFailure::UnsupportedModel { .. },
                ..
            }
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_agrees_with_matching_on_square_rotations(
            dims in prop_oneof![Just((2usize, 1usize, 2usize)), Just((3, 1, 3)), Just((4, 2, 2))],
            weights in proptest::collection::vec(0i64..4, 36),
        ) {
            let (employees, duties, shifts) = dims;
            let s = shape(employees, duties, shifts, shifts);
            let mut objective = vec![Decimal::ZERO; s.variable_count()];
            for e in 0..employees {
                for d in 0..duties {
                    for sh in 0..shifts {
                        let w = Decimal::new(weights[(e * duties + d) * shifts + sh], 0);
                        for week in 0..shifts {
                            objective[s.var_index(e, d, sh, week)] = w;
                        }
                    }
                }
            }
            let model = rotation_model(s, objective, ConstraintSense::Equal);

            let exact = optimal(BranchAndBoundSolver::new().solve(&model, &limits()));
            let matched = optimal(RotationMatchingSolver::new().solve(&model, &limits()));

            prop_assert!(model.violated_constraints(&exact.assignment).is_empty());
            prop_assert!(model.violated_constraints(&matched.assignment).is_empty());
            prop_assert_eq!(exact.objective, matched.objective);
        }
    }

    #[test]
    fn test_oversized_model_unsupported() {
        let s = shape(1, 1, 1, MAX_SEARCH_VARIABLES + 1);
        let model = AllocationModel::from_parts(
            "wide",
            s,
            vec![Decimal::ONE; s.variable_count()],
            Vec::new(),
        );

        match BranchAndBoundSolver::new().solve(&model, &limits()) {
            SolveOutcome::Failed {
                failure: SolverFailure::UnsupportedModel { backend, reason },
                ..
            } => {
                assert_eq!(backend, "branch_and_bound");
                assert!(reason.contains("search limit"));
            }
            other => panic!("Expected UnsupportedModel, got {:?}", other),
        }
    }
}
