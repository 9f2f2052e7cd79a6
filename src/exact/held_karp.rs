//! Held-Karp dynamic programming over vertex subsets.
//!
//! Vertex 0 is fixed as the start and end of the tour. For every non-empty
//! subset `S` of `{1, .., n-1}` and every `v` in `S`, `dp[S][v]` is the cost
//! of the cheapest path that leaves 0, visits exactly `S` and stops at `v`:
//!
//! ```text
//! dp[{v}][v] = c(0, v)
//! dp[S][v]   = min_{u in S \ {v}} dp[S \ {v}][u] + c(u, v)
//! tour       = min_{v} dp[{1..n-1}][v] + c(v, 0)
//! ```
//!
//! Subsets are filled layer by layer in increasing size, so every entry only
//! reads entries from the previous layer. Time is O(2^n * n^2) and the table
//! takes O(2^n * n) space, which is why the solver refuses instances above
//! [`SolverConfig::max_vertices`] unless the caller raises the bound.

use super::subsets::{Bits, Combinations};
use super::{ExactResult, ExactSolver, SolverConfig};
use crate::error::{Result, SolverError};
use crate::instance::CostMatrix;
use crate::weight::{Accumulator, Weight};
use rayon::prelude::*;
use std::mem::size_of;

/// Default bound on the instance size accepted without opt-in.
pub const DEFAULT_MAX_VERTICES: usize = 20;

/// Absolute bound; subset masks over `n - 1` vertices must fit comfortably in a `usize`.
pub const HARD_MAX_VERTICES: usize = 32;

const NO_PARENT: u8 = u8::MAX;

/// Exact solver based on the Held-Karp recurrence
#[derive(Debug, Clone, Default)]
pub struct HeldKarpSolver {
    pub config: SolverConfig,
}

impl HeldKarpSolver {
    pub fn new(config: SolverConfig) -> Self {
        HeldKarpSolver { config }
    }

    /// Effective bound on `n`.
    pub fn vertex_limit(&self) -> usize {
        self.config.max_vertices.min(HARD_MAX_VERTICES)
    }

    fn check_preconditions<W: Weight>(&self, matrix: &CostMatrix<W>) -> Result<()> {
        let n = matrix.dimension();
        let limit = self.vertex_limit();
        if n > limit {
            return Err(SolverError::ResourceExhaustion { vertices: n, limit });
        }
        if self.config.require_symmetric && !matrix.is_symmetric() {
            return Err(SolverError::InvalidInput(
                "matrix is not symmetric".to_string(),
            ));
        }
        Ok(())
    }
}

impl ExactSolver for HeldKarpSolver {
    fn solve<W: Weight>(&self, matrix: &CostMatrix<W>) -> Result<ExactResult<W::Acc>> {
        self.check_preconditions(matrix)?;

        let n = matrix.dimension();
        if n == 1 {
            return Ok(ExactResult {
                cost: <W::Acc as Accumulator>::ZERO,
                order: self.config.reconstruct_path.then(|| vec![0]),
            });
        }

        let mut table = DpTable::<W::Acc>::allocate(n, self.config.reconstruct_path)?;
        log::debug!(
            "Held-Karp: {} vertices, {} table entries, parallel={}",
            n,
            table.cost.len(),
            self.config.parallel
        );

        table.seed(matrix);
        for size in 2..n {
            if self.config.parallel {
                table.fill_layer_parallel(matrix, size);
            } else {
                table.fill_layer(matrix, size);
            }
            log::trace!("Held-Karp: layer {} of {} done", size, n - 1);
        }

        let (cost, last) = table.close_tour(matrix);
        if Accumulator::is_unreachable(cost) {
            return Err(SolverError::NoTourExists);
        }

        let order = table.parent.as_ref().map(|parent| table.backtrack(parent, last));
        Ok(ExactResult { cost, order })
    }

    fn name(&self) -> &str {
        if self.config.parallel {
            "HeldKarp-Parallel"
        } else {
            "HeldKarp"
        }
    }
}

/// Flat DP arena indexed by `mask * m + (v - 1)` with `m = n - 1`; bit `v - 1`
/// of `mask` stands for vertex `v`.
struct DpTable<A> {
    m: usize,
    cost: Vec<A>,
    parent: Option<Vec<u8>>,
}

impl<A: Accumulator> DpTable<A> {
    fn allocate(n: usize, with_parent: bool) -> Result<Self> {
        let m = n - 1;
        let per_entry = size_of::<A>() + if with_parent { size_of::<u8>() } else { 0 };
        let entries = 1usize
            .checked_shl(m as u32)
            .and_then(|rows| rows.checked_mul(m));
        let bytes = entries.and_then(|e| e.checked_mul(per_entry));
        let (entries, bytes) = match (entries, bytes) {
            (Some(e), Some(b)) => (e, b),
            _ => {
                return Err(SolverError::AllocationFailed {
                    vertices: n,
                    bytes: usize::MAX,
                })
            }
        };
        let alloc_err = || SolverError::AllocationFailed { vertices: n, bytes };

        let mut cost = Vec::new();
        cost.try_reserve_exact(entries).map_err(|_| alloc_err())?;
        cost.resize(entries, A::UNREACHABLE);

        let parent = if with_parent {
            let mut parent = Vec::new();
            parent.try_reserve_exact(entries).map_err(|_| alloc_err())?;
            parent.resize(entries, NO_PARENT);
            Some(parent)
        } else {
            None
        };

        Ok(DpTable { m, cost, parent })
    }

    #[inline]
    fn index(&self, mask: usize, v: usize) -> usize {
        mask * self.m + (v - 1)
    }

    /// Singleton subsets: the direct edge out of vertex 0.
    fn seed<W: Weight<Acc = A>>(&mut self, matrix: &CostMatrix<W>) {
        for v in 1..=self.m {
            let idx = self.index(1 << (v - 1), v);
            self.cost[idx] = matrix.cost(0, v).widen();
        }
    }

    fn fill_layer<W: Weight<Acc = A>>(&mut self, matrix: &CostMatrix<W>, size: usize) {
        let m = self.m;
        let mut scratch = vec![NO_PARENT; m];

        for mask in Combinations::new(m, size) {
            // S \ {v} < S, so every row this one reads lies before it
            let (done, rest) = self.cost.split_at_mut(mask * m);
            let row = &mut rest[..m];
            match self.parent.as_mut() {
                Some(parent) => {
                    let parents = &mut parent[mask * m..(mask + 1) * m];
                    relax_row(matrix, m, done, mask, row, parents);
                }
                None => relax_row(matrix, m, done, mask, row, &mut scratch),
            }
        }
    }

    fn fill_layer_parallel<W: Weight<Acc = A>>(&mut self, matrix: &CostMatrix<W>, size: usize) {
        let m = self.m;
        let masks: Vec<usize> = Combinations::new(m, size).collect();

        let cost = &self.cost;
        let rows: Vec<(Vec<A>, Vec<u8>)> = masks
            .par_iter()
            .map(|&mask| {
                let mut row = vec![A::UNREACHABLE; m];
                let mut parents = vec![NO_PARENT; m];
                relax_row(matrix, m, cost, mask, &mut row, &mut parents);
                (row, parents)
            })
            .collect();

        for (mask, (row, parents)) in masks.into_iter().zip(rows) {
            let start = mask * m;
            self.cost[start..start + m].copy_from_slice(&row);
            if let Some(parent) = self.parent.as_mut() {
                parent[start..start + m].copy_from_slice(&parents);
            }
        }
    }

    /// Add the edge back to vertex 0 and pick the cheapest last vertex.
    fn close_tour<W: Weight<Acc = A>>(&self, matrix: &CostMatrix<W>) -> (A, usize) {
        let full = (1usize << self.m) - 1;
        let mut best = A::UNREACHABLE;
        let mut last = 1;

        for v in 1..=self.m {
            let candidate = matrix.cost(v, 0).extend(self.cost[self.index(full, v)]);
            if candidate < best {
                best = candidate;
                last = v;
            }
        }

        (best, last)
    }

    fn backtrack(&self, parent: &[u8], last: usize) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.m + 1);
        let mut mask = (1usize << self.m) - 1;
        let mut v = last;

        loop {
            order.push(v);
            let prev = parent[self.index(mask, v)];
            mask ^= 1 << (v - 1);
            if mask == 0 {
                break;
            }
            debug_assert_ne!(prev, NO_PARENT, "finite entry without predecessor");
            v = prev as usize;
        }

        order.push(0);
        order.reverse();
        order
    }
}

/// Compute `dp[mask][v]` for every `v` in `mask` from the rows of `mask \ {v}`.
///
/// `done` must contain every row below `mask`. Candidates are scanned in
/// increasing vertex order with a strict comparison, so ties go to the
/// lowest predecessor.
fn relax_row<W: Weight>(
    matrix: &CostMatrix<W>,
    m: usize,
    done: &[W::Acc],
    mask: usize,
    row: &mut [W::Acc],
    parents: &mut [u8],
) {
    for vb in Bits(mask) {
        let v = vb + 1;
        let prev = mask ^ (1 << vb);
        let mut best = <W::Acc as Accumulator>::UNREACHABLE;
        let mut best_u = NO_PARENT;

        for ub in Bits(prev) {
            let u = ub + 1;
            let candidate = matrix.cost(u, v).extend(done[prev * m + ub]);
            if candidate < best {
                best = candidate;
                best_u = u as u8;
            }
        }

        row[vb] = best;
        parents[vb] = best_u;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exact::BruteForceSolver;
    use crate::instance::random_matrix;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn solver() -> HeldKarpSolver {
        HeldKarpSolver::default()
    }

    #[test]
    fn test_single_vertex() {
        let m = CostMatrix::new(vec![vec![0u32]]).unwrap();
        let result = solver().solve(&m).unwrap();
        assert_eq!(result.cost, 0);
        assert_eq!(result.order, Some(vec![0]));
    }

    #[test]
    fn test_two_vertices() {
        let m = CostMatrix::new(vec![vec![0u32, 5], vec![5, 0]]).unwrap();
        let result = solver().solve(&m).unwrap();
        assert_eq!(result.cost, 10);
        assert_eq!(result.order, Some(vec![0, 1]));

        let directed = CostMatrix::new(vec![vec![0u32, 3], vec![7, 0]]).unwrap();
        assert_eq!(solver().solve(&directed).unwrap().cost, 10);
    }

    #[test]
    fn test_four_cities() {
        // 0 -> 2 -> 3 -> 1 -> 0 = 15 + 30 + 25 + 10 = 80, tied with its reverse
        let m = CostMatrix::new(vec![
            vec![0u32, 10, 15, 20],
            vec![10, 0, 35, 25],
            vec![15, 35, 0, 30],
            vec![20, 25, 30, 0],
        ])
        .unwrap();

        let result = solver().solve(&m).unwrap();
        assert_eq!(result.cost, 80);
        let order = result.order.unwrap();
        assert_eq!(order, vec![0, 2, 3, 1]);
        assert_eq!(m.tour_cost(&order), 80);

        let brute = BruteForceSolver::default().solve(&m).unwrap();
        assert_eq!(brute.cost, 80);
    }

    #[test]
    fn test_matches_brute_force_on_random_instances() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for n in 1..=10 {
            for _ in 0..3 {
                let m = random_matrix(n, 100, &mut rng).unwrap();
                let hk = solver().solve(&m).unwrap();
                let bf = BruteForceSolver::default().solve(&m).unwrap();
                assert_eq!(hk.cost, bf.cost, "n = {}", n);

                let order = hk.order.unwrap();
                assert_eq!(order.len(), n);
                assert_eq!(order[0], 0);
                assert_eq!(m.tour_cost(&order), hk.cost);
            }
        }
    }

    #[test]
    fn test_asymmetric_matches_brute_force() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for n in 3..=8 {
            let rows: Vec<Vec<u32>> = (0..n)
                .map(|i| {
                    (0..n)
                        .map(|j| if i == j { 0 } else { rng.gen_range(1..=50) })
                        .collect()
                })
                .collect();
            let m = CostMatrix::new(rows).unwrap();
            let hk = solver().solve(&m).unwrap();
            let bf = BruteForceSolver::default().solve(&m).unwrap();
            assert_eq!(hk.cost, bf.cost);
            assert_eq!(m.tour_cost(&hk.order.unwrap()), hk.cost);
        }
    }

    #[test]
    fn test_float_weights() {
        let m = CostMatrix::new(vec![
            vec![0.0f64, 1.5, 2.5],
            vec![1.5, 0.0, 1.0],
            vec![2.5, 1.0, 0.0],
        ])
        .unwrap();
        let result = solver().solve(&m).unwrap();
        assert!((result.cost - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_idempotent() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let m = random_matrix(10, 10, &mut rng).unwrap();
        let first = solver().solve(&m).unwrap();
        let second = solver().solve(&m).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let parallel = HeldKarpSolver::new(SolverConfig {
            parallel: true,
            ..Default::default()
        });
        for n in [1, 2, 5, 9, 12] {
            let m = random_matrix(n, 1000, &mut rng).unwrap();
            assert_eq!(solver().solve(&m).unwrap(), parallel.solve(&m).unwrap());
        }
    }

    #[test]
    fn test_without_path_reconstruction() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let m = random_matrix(8, 20, &mut rng).unwrap();
        let no_path = HeldKarpSolver::new(SolverConfig {
            reconstruct_path: false,
            ..Default::default()
        });
        let without = no_path.solve(&m).unwrap();
        let with = solver().solve(&m).unwrap();
        assert_eq!(without.order, None);
        assert_eq!(without.cost, with.cost);
    }

    #[test]
    fn test_resource_bound() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let m = random_matrix(DEFAULT_MAX_VERTICES + 1, 10, &mut rng).unwrap();
        match solver().solve(&m) {
            Err(SolverError::ResourceExhaustion { vertices, limit }) => {
                assert_eq!(vertices, DEFAULT_MAX_VERTICES + 1);
                assert_eq!(limit, DEFAULT_MAX_VERTICES);
            }
            other => panic!("expected ResourceExhaustion, got {:?}", other),
        }

        let small_limit = HeldKarpSolver::new(SolverConfig {
            max_vertices: 4,
            ..Default::default()
        });
        let m = random_matrix(5, 10, &mut rng).unwrap();
        assert!(small_limit.solve(&m).unwrap_err().is_resource_exhaustion());

        let beyond_hard = HeldKarpSolver::new(SolverConfig {
            max_vertices: usize::MAX,
            ..Default::default()
        });
        assert_eq!(beyond_hard.vertex_limit(), HARD_MAX_VERTICES);
    }

    #[test]
    fn test_disconnected_graph_has_no_tour() {
        // Vertex 3 is only reachable from vertex 0, so no cycle can pass through it
        let x = u32::MISSING;
        let m = CostMatrix::new(vec![
            vec![0, 1, 1, 1],
            vec![1, 0, 1, x],
            vec![1, 1, 0, x],
            vec![1, x, x, 0],
        ])
        .unwrap();
        assert!(matches!(solver().solve(&m), Err(SolverError::NoTourExists)));

        let inf = f64::INFINITY;
        let m = CostMatrix::new(vec![vec![0.0, inf], vec![inf, 0.0]]).unwrap();
        assert!(matches!(solver().solve(&m), Err(SolverError::NoTourExists)));
    }

    #[test]
    fn test_missing_edges_are_avoided() {
        let x = u32::MISSING;
        // Only 0 -> 1 -> 2 -> 3 -> 0 (18) and its reverse (21) are finite
        let m = CostMatrix::new(vec![
            vec![0, 2, x, 9],
            vec![5, 0, 4, x],
            vec![x, 4, 0, 3],
            vec![9, x, 3, 0],
        ])
        .unwrap();
        let result = solver().solve(&m).unwrap();
        assert_eq!(result.cost, 18);
        assert_eq!(result.order, Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_require_symmetric() {
        let strict = HeldKarpSolver::new(SolverConfig {
            require_symmetric: true,
            ..Default::default()
        });
        let m = CostMatrix::new(vec![vec![0u32, 3], vec![7, 0]]).unwrap();
        assert!(matches!(strict.solve(&m), Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_solve_timed() {
        let m = CostMatrix::new(vec![vec![0u32, 5], vec![5, 0]]).unwrap();
        let tour = solver().solve_timed(&m).unwrap();
        assert_eq!(tour.cost, 10);
        assert_eq!(tour.algorithm, "HeldKarp");
        assert!(tour.is_complete(2));
    }
}
