//! Maximum-weight perfect assignment on a square matrix.
//!
//! Shortest augmenting path formulation of the Hungarian method with row
//! and column potentials, `O(n^3)`. Weights stay in [`Decimal`] so the
//! optimum is exact.

use rust_decimal::Decimal;

use super::SolverFailure;
use super::limits::LimitMonitor;

/// Assigns every row to a distinct column, maximising the total weight.
///
/// Returns `columns` where `columns[row]` is the column chosen for `row`.
/// Among equally good assignments the result is deterministic for a given
/// matrix: earlier columns win ties.
///
/// The clock is read once per row, so a spent time budget stops the
/// assignment within one row's work.
///
/// # Errors
///
/// - `SolverFailure::Internal` when the matrix is not square
/// - `SolverFailure::TimeLimitExceeded` when the monitor's budget runs out
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rota_engine::solver::{SolveLimits, max_weight_assignment};
/// use rust_decimal::Decimal;
///
/// let w = |v: i64| Decimal::new(v, 0);
/// let profit = vec![vec![w(1), w(5)], vec![w(4), w(2)]];
/// let monitor = SolveLimits::new(Duration::from_secs(1)).start();
///
/// assert_eq!(max_weight_assignment(&profit, &monitor).unwrap(), vec![1, 0]);
/// ```
pub fn max_weight_assignment(
    profit: &[Vec<Decimal>],
    monitor: &LimitMonitor,
) -> Result<Vec<usize>, SolverFailure> {
    let n = profit.len();
    if let Some(row) = profit.iter().position(|r| r.len() != n) {
        return Err(SolverFailure::Internal {
            message: format!(
                "assignment matrix row {} has {} columns, expected {}",
                row,
                profit[row].len(),
                n
            ),
        });
    }
    if n == 0 {
        return Ok(Vec::new());
    }

    // 1-based potentials; column 0 is the virtual start of each augmenting path.
    let mut u = vec![Decimal::ZERO; n + 1];
    let mut v = vec![Decimal::ZERO; n + 1];
    let mut row_of = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for row in 1..=n {
        monitor.check_time()?;
        row_of[0] = row;
        let mut col = 0usize;
        let mut min_slack: Vec<Option<Decimal>> = vec![None; n + 1];
        let mut used = vec![false; n + 1];

        loop {
            used[col] = true;
            let current_row = row_of[col];
            let mut delta: Option<Decimal> = None;
            let mut next_col = 0usize;

            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = -profit[current_row - 1][j - 1] - u[current_row] - v[j];
                if min_slack[j].is_none_or(|m| reduced < m) {
                    min_slack[j] = Some(reduced);
                    way[j] = col;
                }
                if let Some(slack) = min_slack[j]
                    && delta.is_none_or(|d| slack < d)
                {
                    delta = Some(slack);
                    next_col = j;
                }
            }

            let Some(delta) = delta else {
                return Err(SolverFailure::Internal {
                    message: format!("no free column left while placing row {}", row),
                });
            };

            for j in 0..=n {
                if used[j] {
                    u[row_of[j]] += delta;
                    v[j] -= delta;
                } else if let Some(slack) = min_slack[j].as_mut() {
                    *slack -= delta;
                }
            }

            col = next_col;
            if row_of[col] == 0 {
                break;
            }
        }

        loop {
            let prev = way[col];
            row_of[col] = row_of[prev];
            col = prev;
            if col == 0 {
                break;
            }
        }
    }

    let mut columns = vec![0usize; n];
    for j in 1..=n {
        columns[row_of[j] - 1] = j - 1;
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolveLimits;
    use proptest::prelude::*;
    use std::time::Duration;

    fn w(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn assign(profit: &[Vec<Decimal>]) -> Result<Vec<usize>, SolverFailure> {
        let monitor = SolveLimits::new(Duration::from_secs(60)).start();
        max_weight_assignment(profit, &monitor)
    }

    fn total(profit: &[Vec<Decimal>], columns: &[usize]) -> Decimal {
        columns.iter().enumerate().map(|(r, c)| profit[r][*c]).sum()
    }

    fn brute_force_best(profit: &[Vec<Decimal>]) -> Decimal {
        fn go(profit: &[Vec<Decimal>], row: usize, used: &mut Vec<bool>) -> Decimal {
            if row == profit.len() {
                return Decimal::ZERO;
            }
            let mut best: Option<Decimal> = None;
            for c in 0..profit.len() {
                if !used[c] {
                    used[c] = true;
                    let value = profit[row][c] + go(profit, row + 1, used);
                    used[c] = false;
                    best = Some(best.map_or(value, |b: Decimal| b.max(value)));
                }
            }
            best.unwrap_or(Decimal::ZERO)
        }
        go(profit, 0, &mut vec![false; profit.len()])
    }

    #[test]
    fn test_empty_matrix() {
        assert_eq!(assign(&[]).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn test_single_cell() {
        assert_eq!(assign(&[vec![w(7)]]).unwrap(), vec![0]);
    }

    #[test]
    fn test_three_by_three() {
        let profit = vec![
            vec![w(1), w(0), w(0)],
            vec![w(1), w(0), w(0)],
            vec![w(0), w(1), w(0)],
        ];
        let columns = assign(&profit).unwrap();

        assert_eq!(total(&profit, &columns), w(2));
        let mut sorted = columns.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![0, 1, 2]);
    }

    #[test]
    fn test_all_zero_is_identity() {
        let profit = vec![vec![Decimal::ZERO; 3]; 3];
        assert_eq!(assign(&profit).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_fractional_weights() {
        let profit = vec![
            vec![Decimal::new(15, 1), Decimal::new(14, 1)],
            vec![Decimal::new(10, 1), Decimal::new(2, 1)],
        ];
        let columns = assign(&profit).unwrap();
        assert_eq!(total(&profit, &columns), Decimal::new(24, 1));
    }

    #[test]
    fn test_ragged_matrix_rejected() {
        let profit = vec![vec![w(1), w(2)], vec![w(3)]];
        assert!(matches!(
            assign(&profit),
            Err(SolverFailure::Internal { .. })
        ));
    }

    #[test]
    fn test_time_limit_stops_within_a_row() {
        let n = 400;
        let profit: Vec<Vec<Decimal>> = (0..n)
            .map(|r| (0..n).map(|c| w(((r * 31 + c * 17) % 23) as i64)).collect())
            .collect();
        let monitor = SolveLimits::new(Duration::from_millis(1)).start();

        let result = max_weight_assignment(&profit, &monitor);

        assert_eq!(result, Err(SolverFailure::TimeLimitExceeded { limit_ms: 1 }));
        // A full 400x400 solve takes far longer than this.
        assert!(
            monitor.elapsed() < Duration::from_millis(250),
            "stopped after {:?}",
            monitor.elapsed()
        );
    }

    proptest! {
        #[test]
        fn prop_matches_brute_force(
            n in 1usize..6,
            cells in proptest::collection::vec(0i64..20, 36),
        ) {
            let profit: Vec<Vec<Decimal>> = (0..n)
                .map(|r| (0..n).map(|c| w(cells[r * 6 + c])).collect())
                .collect();
            let columns = assign(&profit).unwrap();

            let mut seen = columns.clone();
            seen.sort_unstable();
            seen.dedup();
            prop_assert_eq!(seen.len(), n);
            prop_assert_eq!(total(&profit, &columns), brute_force_best(&profit));
        }
    }
}
