//! Decomposition of a regular bipartite graph into perfect matchings.
//!
//! By König's theorem a `k`-regular bipartite graph splits into `k`
//! disjoint perfect matchings. Removing any perfect matching leaves a
//! `(k - 1)`-regular graph, so repeatedly finding one with Kuhn's
//! augmenting path algorithm always succeeds. Paths are searched with an
//! explicit stack, so path length is not bounded by the thread's stack.

use super::SolverFailure;
use super::limits::LimitMonitor;

/// Splits the edges of a `degree`-regular bipartite graph with `side`
/// vertices on each side into `degree` perfect matchings.
///
/// `edges[i] = (left, right)`. Each returned round lists edge indices,
/// ordered by left vertex. Edge order decides which matching is found
/// first, so the split is deterministic. The clock is read before every
/// augmenting path search.
///
/// # Errors
///
/// - `SolverFailure::Internal` when an endpoint is out of range or the graph
///   is not `degree`-regular
/// - `SolverFailure::TimeLimitExceeded` when the monitor's budget runs out
///
/// # Example
///
/// ```
/// use std::time::Duration;
///
/// use rota_engine::solver::{SolveLimits, decompose_regular};
///
/// // Complete bipartite graph K(2,2).
/// let edges = vec![(0, 0), (0, 1), (1, 0), (1, 1)];
/// let monitor = SolveLimits::new(Duration::from_secs(1)).start();
/// let rounds = decompose_regular(2, &edges, 2, &monitor).unwrap();
///
/// assert_eq!(rounds, vec![vec![1, 2], vec![0, 3]]);
/// ```
pub fn decompose_regular(
    side: usize,
    edges: &[(usize, usize)],
    degree: usize,
    monitor: &LimitMonitor,
) -> Result<Vec<Vec<usize>>, SolverFailure> {
    let mut graph = RegularGraph::new(side, edges, degree)?;
    let mut rounds = Vec::with_capacity(degree);
    for round in 0..degree {
        let matching =
            graph
                .perfect_matching(monitor)?
                .ok_or_else(|| SolverFailure::Internal {
                    message: format!("no perfect matching left in round {}", round + 1),
                })?;
        for &edge in &matching {
            graph.alive[edge] = false;
        }
        rounds.push(matching);
    }
    Ok(rounds)
}

struct RegularGraph<'a> {
    side: usize,
    edges: &'a [(usize, usize)],
    /// Edge indices leaving each left vertex.
    adjacency: Vec<Vec<usize>>,
    alive: Vec<bool>,
}

impl<'a> RegularGraph<'a> {
    fn new(
        side: usize,
        edges: &'a [(usize, usize)],
        degree: usize,
    ) -> Result<Self, SolverFailure> {
        let mut adjacency = vec![Vec::with_capacity(degree); side];
        let mut right_degree = vec![0usize; side];

        for (i, &(left, right)) in edges.iter().enumerate() {
            if left >= side || right >= side {
                return Err(SolverFailure::Internal {
                    message: format!("edge {} ({}, {}) is out of range", i, left, right),
                });
            }
            adjacency[left].push(i);
            right_degree[right] += 1;
        }

        let irregular = adjacency
            .iter()
            .map(Vec::len)
            .chain(right_degree.iter().copied())
            .any(|d| d != degree);
        if irregular {
            return Err(SolverFailure::Internal {
                message: format!("graph is not {}-regular", degree),
            });
        }

        Ok(Self {
            side,
            edges,
            adjacency,
            alive: vec![true; edges.len()],
        })
    }

    fn perfect_matching(
        &self,
        monitor: &LimitMonitor,
    ) -> Result<Option<Vec<usize>>, SolverFailure> {
        let mut matched_edge: Vec<Option<usize>> = vec![None; self.side];
        for left in 0..self.side {
            monitor.check_time()?;
            let mut visited = vec![false; self.side];
            if !self.augment(left, &mut visited, &mut matched_edge) {
                return Ok(None);
            }
        }

        let Some(mut matching) = matched_edge.into_iter().collect::<Option<Vec<usize>>>() else {
            return Ok(None);
        };
        matching.sort_by_key(|&edge| self.edges[edge].0);
        Ok(Some(matching))
    }

    /// Depth-first search for an augmenting path from `start`. On success
    /// every edge on the path is matched to its right vertex.
    fn augment(
        &self,
        start: usize,
        visited: &mut [bool],
        matched_edge: &mut [Option<usize>],
    ) -> bool {
        // (left vertex, next adjacency position); path[i] leads from frame i
        // to the right vertex currently matched to frame i + 1.
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        let mut path: Vec<usize> = Vec::new();

        while let Some(frame) = stack.last_mut() {
            let (left, position) = *frame;
            let Some(&edge) = self.adjacency[left].get(position) else {
                stack.pop();
                path.pop();
                continue;
            };
            frame.1 += 1;

            if !self.alive[edge] {
                continue;
            }
            let right = self.edges[edge].1;
            if visited[right] {
                continue;
            }
            visited[right] = true;

            path.push(edge);
            match matched_edge[right] {
                None => {
                    for &step in &path {
                        matched_edge[self.edges[step].1] = Some(step);
                    }
                    return true;
                }
                Some(current) => stack.push((self.edges[current].0, 0)),
            }
        }
        false
    }
}
