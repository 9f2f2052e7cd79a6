//! Exhaustive enumeration of all `(n - 1)!` tours that start at vertex 0.

use super::{ExactResult, ExactSolver};
use crate::error::{Result, SolverError};
use crate::instance::CostMatrix;
use crate::weight::{Accumulator, Weight};

/// Largest instance the brute-force solver accepts by default.
pub const BRUTE_FORCE_MAX_VERTICES: usize = 12;

/// Reference solver that tries every permutation
#[derive(Debug, Clone)]
pub struct BruteForceSolver {
    pub max_vertices: usize,
}

impl BruteForceSolver {
    pub fn new(max_vertices: usize) -> Self {
        BruteForceSolver { max_vertices }
    }
}

impl Default for BruteForceSolver {
    fn default() -> Self {
        Self::new(BRUTE_FORCE_MAX_VERTICES)
    }
}

impl ExactSolver for BruteForceSolver {
    fn solve<W: Weight>(&self, matrix: &CostMatrix<W>) -> Result<ExactResult<W::Acc>> {
        let n = matrix.dimension();
        if n > self.max_vertices {
            return Err(SolverError::ResourceExhaustion {
                vertices: n,
                limit: self.max_vertices,
            });
        }

        let mut tour: Vec<usize> = (0..n).collect();
        let mut best = matrix.tour_cost(&tour);
        let mut best_tour = tour.clone();

        // Vertex 0 stays in front; permute the rest in lexicographic order
        while next_permutation(&mut tour[1..]) {
            let cost = matrix.tour_cost(&tour);
            if cost < best {
                best = cost;
                best_tour.copy_from_slice(&tour);
            }
        }

        if Accumulator::is_unreachable(best) {
            return Err(SolverError::NoTourExists);
        }

        Ok(ExactResult {
            cost: best,
            order: Some(best_tour),
        })
    }

    fn name(&self) -> &str {
        "BruteForce"
    }
}

/// Rearrange `items` into the next lexicographic permutation.
/// Returns `false` (leaving `items` sorted ascending) once the last one was reached.
pub fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    if items.len() < 2 {
        return false;
    }

    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        items.reverse();
        return false;
    }

    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}
