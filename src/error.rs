//! Error types shared by the solvers, instance loading and the benchmark harness.

use thiserror::Error;

/// Errors produced while validating input, solving, or reading/writing benchmark data.
///
/// Every solver failure is reported before a result is returned; no solver ever
/// hands back a sentinel or a partially filled tour.
#[derive(Error, Debug)]
pub enum SolverError {
    /// Malformed cost matrix: empty, non-square, negative or NaN entries.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The instance is larger than the configured bound, or the DP table cannot be allocated.
    #[error("instance with {vertices} vertices exceeds the limit of {limit} (raise max_vertices to opt in)")]
    ResourceExhaustion { vertices: usize, limit: usize },

    /// The DP table for `vertices` vertices would not fit in memory.
    #[error("cannot allocate DP table for {vertices} vertices ({bytes} bytes requested)")]
    AllocationFailed { vertices: usize, bytes: usize },

    /// Every Hamiltonian cycle uses at least one unreachable edge.
    #[error("no finite-cost Hamiltonian cycle exists")]
    NoTourExists,

    /// Some instances did not reach their stored optimum.
    #[error("{failed} of {total} instances failed verification")]
    VerificationFailed { failed: usize, total: usize },

    /// Instance file could not be parsed.
    #[error("parse error in {source_name}: {message}")]
    Parse { source_name: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SolverError {
    /// True for the errors that mean "the instance is too big", as opposed to bad input.
    pub fn is_resource_exhaustion(&self) -> bool {
        matches!(
            self,
            SolverError::ResourceExhaustion { .. } | SolverError::AllocationFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SolverError>;
