//! Exact solvers module.
//!
//! [`HeldKarpSolver`] is the production solver; [`BruteForceSolver`]
//! enumerates every tour and serves as a reference for small instances.

mod brute_force;
mod held_karp;
pub mod subsets;

pub use brute_force::*;
pub use held_karp::*;

use crate::error::Result;
use crate::instance::CostMatrix;
use crate::solution::Tour;
use crate::weight::{Accumulator, Weight};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Optimal tour cost and, when requested, the visiting order that achieves it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExactResult<A> {
    pub cost: A,
    /// `[0, v1, .., v_{n-1}]`, the return to 0 being implicit
    pub order: Option<Vec<usize>>,
}

impl<A: Accumulator> ExactResult<A> {
    pub fn into_tour(self, algorithm: &str) -> Tour<A> {
        Tour::new(self.order.unwrap_or_default(), self.cost, algorithm)
    }
}

/// Solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Largest instance accepted; raising it is the explicit opt-in for big instances
    pub max_vertices: usize,
    /// Keep the predecessor table and return the optimal order
    pub reconstruct_path: bool,
    /// Fill each subset-size layer with rayon
    pub parallel: bool,
    /// Reject matrices where `cost(i, j) != cost(j, i)`
    pub require_symmetric: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_vertices: DEFAULT_MAX_VERTICES,
            reconstruct_path: true,
            parallel: false,
            require_symmetric: false,
        }
    }
}

pub trait ExactSolver {
    fn solve<W: Weight>(&self, matrix: &CostMatrix<W>) -> Result<ExactResult<W::Acc>>;
    fn name(&self) -> &str;

    /// Solve and time the call, returning a [`Tour`].
    fn solve_timed<W: Weight>(&self, matrix: &CostMatrix<W>) -> Result<Tour<W::Acc>> {
        let start = Instant::now();
        let result = self.solve(matrix)?;
        let elapsed_ns = start.elapsed().as_nanos();

        let mut tour = result.into_tour(self.name());
        tour.elapsed_ns = elapsed_ns;
        Ok(tour)
    }
}
