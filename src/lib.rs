//! Held-Karp TSP Solver Library
//!
//! Exact solver for the Traveling Salesman Problem based on the Held-Karp
//! dynamic program over vertex subsets, together with the harness used to
//! benchmark it.
//!
//! # Features
//!
//! - Held-Karp solver with optional tour reconstruction and a rayon layer-parallel fill
//! - Brute-force reference solver for cross-checking small instances
//! - Integer and floating-point cost matrices, summed in a wider accumulator
//! - Random-instance sweep producing the `Number of vertices, execution time [ns]` CSV
//! - Instance-file tests against known optima
//!
//! # Example
//!
//! ```no_run
//! use held_karp_solver::exact::{ExactSolver, HeldKarpSolver};
//! use held_karp_solver::instance::TspInstance;
//!
//! let instance = TspInstance::from_file("instances/tsp_10.txt").unwrap();
//!
//! let solver = HeldKarpSolver::default();
//! let tour = solver.solve_timed(&instance.matrix).unwrap();
//!
//! println!("Tour cost: {} ({})", tour.cost, tour.path_string());
//! ```

pub mod benchmark;
pub mod error;
pub mod exact;
pub mod instance;
pub mod solution;
pub mod weight;

pub use error::{Result, SolverError};
pub use exact::{ExactSolver, HeldKarpSolver, SolverConfig};
pub use instance::{CostMatrix, TspInstance};
pub use solution::Tour;
