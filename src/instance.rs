//! Module for parsing and representing TSP instances.
//!
//! A TSP instance is a dense cost matrix over `n` labeled vertices. Instance
//! files use a plain whitespace-separated layout: the instance name, the
//! vertex count, `n * n` integer weights in row-major order and, optionally,
//! the known optimal tour cost.

use crate::error::{Result, SolverError};
use crate::weight::{Accumulator, Weight};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Dense, immutable cost matrix stored row-major in a flat vector.
///
/// Deserialization goes through [`CostMatrix::from_flat`], so a loaded matrix
/// is validated exactly like one built in code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawCostMatrix<W>",
    bound(deserialize = "W: Weight + Deserialize<'de>")
)]
pub struct CostMatrix<W> {
    dimension: usize,
    weights: Vec<W>,
}

#[derive(Deserialize)]
struct RawCostMatrix<W> {
    dimension: usize,
    weights: Vec<W>,
}

impl<W: Weight> TryFrom<RawCostMatrix<W>> for CostMatrix<W> {
    type Error = SolverError;

    fn try_from(raw: RawCostMatrix<W>) -> Result<Self> {
        CostMatrix::from_flat(raw.dimension, raw.weights)
    }
}

impl<W: Weight> CostMatrix<W> {
    /// Build a matrix from rows, rejecting empty, ragged or negative input.
    pub fn new(rows: Vec<Vec<W>>) -> Result<Self> {
        let n = rows.len();
        if n == 0 {
            return Err(SolverError::InvalidInput("matrix has no vertices".into()));
        }

        let mut weights = Vec::with_capacity(n * n);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::InvalidInput(format!(
                    "matrix is not square: row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            weights.extend(row);
        }

        Self::from_flat(n, weights)
    }

    /// Build a matrix from `n * n` row-major weights.
    pub fn from_flat(dimension: usize, weights: Vec<W>) -> Result<Self> {
        if dimension == 0 {
            return Err(SolverError::InvalidInput("matrix has no vertices".into()));
        }
        let expected = dimension.checked_mul(dimension).ok_or_else(|| {
            SolverError::InvalidInput(format!("dimension {} is too large", dimension))
        })?;
        if weights.len() != expected {
            return Err(SolverError::InvalidInput(format!(
                "matrix is not square: {} entries for dimension {}",
                weights.len(),
                dimension
            )));
        }

        if let Some(pos) = weights.iter().position(|w| w.is_invalid()) {
            return Err(SolverError::InvalidInput(format!(
                "invalid cost {:?} at ({}, {})",
                weights[pos],
                pos / dimension,
                pos % dimension
            )));
        }

        Ok(CostMatrix { dimension, weights })
    }

    /// Number of vertices.
    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Cost of the edge `i -> j`.
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> W {
        self.weights[i * self.dimension + j]
    }

    /// True when `cost(i, j) == cost(j, i)` for every pair.
    pub fn is_symmetric(&self) -> bool {
        let n = self.dimension;
        (0..n).all(|i| (i + 1..n).all(|j| self.cost(i, j) == self.cost(j, i)))
    }

    /// Cost of the closed tour visiting `tour` in order and returning to its first vertex.
    pub fn tour_cost(&self, tour: &[usize]) -> W::Acc {
        if tour.len() < 2 {
            return <W::Acc as Accumulator>::ZERO;
        }

        let mut total = <W::Acc as Accumulator>::ZERO;
        for pair in tour.windows(2) {
            total = self.cost(pair[0], pair[1]).extend(total);
        }
        self.cost(tour[tour.len() - 1], tour[0]).extend(total)
    }

    /// Summary of the off-diagonal edge costs.
    pub fn statistics(&self) -> MatrixStatistics {
        let n = self.dimension;
        let mut finite: Vec<f64> = Vec::with_capacity(n * n.saturating_sub(1));
        let mut missing_edges = 0;

        for i in 0..n {
            for j in 0..n {
                if i == j {
                    continue;
                }
                let w = self.cost(i, j);
                if w.is_missing_edge() {
                    missing_edges += 1;
                } else {
                    finite.push(w.widen().to_f64());
                }
            }
        }

        let (min_cost, max_cost, avg_cost) = if finite.is_empty() {
            (0.0, 0.0, 0.0)
        } else {
            let min = finite.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = finite.iter().cloned().fold(0.0, f64::max);
            (min, max, finite.iter().sum::<f64>() / finite.len() as f64)
        };

        MatrixStatistics {
            dimension: n,
            symmetric: self.is_symmetric(),
            missing_edges,
            min_cost,
            max_cost,
            avg_cost,
        }
    }
}

/// Statistics about a cost matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixStatistics {
    pub dimension: usize,
    pub symmetric: bool,
    pub missing_edges: usize,
    pub min_cost: f64,
    pub max_cost: f64,
    pub avg_cost: f64,
}

impl std::fmt::Display for MatrixStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "  Vertices: {}", self.dimension)?;
        writeln!(f, "  Symmetric: {}", self.symmetric)?;
        writeln!(f, "  Missing edges: {}", self.missing_edges)?;
        writeln!(f, "  Min cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Max cost: {:.2}", self.max_cost)?;
        writeln!(f, "  Avg cost: {:.2}", self.avg_cost)
    }
}

/// A named instance with integer weights and, when known, its optimal tour cost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TspInstance {
    pub name: String,
    pub matrix: CostMatrix<u32>,
    pub optimum: Option<u64>,
}

impl TspInstance {
    pub fn new(name: impl Into<String>, matrix: CostMatrix<u32>) -> Self {
        TspInstance {
            name: name.into(),
            matrix,
            optimum: None,
        }
    }

    pub fn dimension(&self) -> usize {
        self.matrix.dimension()
    }

    /// Load an instance file from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Self::parse(&path.display().to_string(), &text)
    }

    /// Parse the instance text format.
    ///
    /// Negative entries on the diagonal (commonly `-1`) mean "no self loop"
    /// and are stored as zero; a negative entry anywhere else is rejected.
    pub fn parse(source_name: &str, text: &str) -> Result<Self> {
        let parse_err = |message: String| SolverError::Parse {
            source_name: source_name.to_string(),
            message,
        };

        let mut tokens = text.split_whitespace();

        let name = tokens
            .next()
            .ok_or_else(|| parse_err("missing instance name".into()))?
            .to_string();

        let dimension: usize = tokens
            .next()
            .ok_or_else(|| parse_err("missing vertex count".into()))?
            .parse()
            .map_err(|_| parse_err("invalid vertex count".into()))?;

        let entries = dimension
            .checked_mul(dimension)
            .ok_or_else(|| parse_err(format!("vertex count {} is too large", dimension)))?;
        // Every weight needs at least two bytes of text
        let mut weights = Vec::with_capacity(entries.min(text.len() / 2));
        for i in 0..dimension {
            for j in 0..dimension {
                let token = tokens.next().ok_or_else(|| {
                    parse_err(format!("missing weight at ({}, {})", i, j))
                })?;
                let value: i64 = token.parse().map_err(|_| {
                    parse_err(format!("invalid weight '{}' at ({}, {})", token, i, j))
                })?;

                let weight = match value {
                    v if v < 0 && i == j => 0,
                    v if v < 0 => {
                        return Err(SolverError::InvalidInput(format!(
                            "negative cost {} at ({}, {})",
                            v, i, j
                        )))
                    }
                    v => u32::try_from(v).map_err(|_| {
                        parse_err(format!("weight {} at ({}, {}) is out of range", v, i, j))
                    })?,
                };
                weights.push(weight);
            }
        }

        let optimum = match tokens.next() {
            Some(token) => Some(
                token
                    .parse::<u64>()
                    .map_err(|_| parse_err(format!("invalid optimum '{}'", token)))?,
            ),
            None => None,
        };

        let matrix = CostMatrix::from_flat(dimension, weights)?;

        log::debug!(
            "Loaded instance {} ({} vertices, optimum {:?})",
            name,
            dimension,
            optimum
        );

        Ok(TspInstance {
            name,
            matrix,
            optimum,
        })
    }

    /// Random symmetric instance with weights uniform in `1..=max_weight`.
    pub fn random(dimension: usize, max_weight: u32, seed: u64) -> Result<Self> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let matrix = random_matrix(dimension, max_weight, &mut rng)?;
        Ok(TspInstance::new(
            format!("random_{}_{}", dimension, seed),
            matrix,
        ))
    }
}

/// Draw a symmetric matrix with zero diagonal and weights uniform in `1..=max_weight`.
pub fn random_matrix<R: Rng + ?Sized>(
    dimension: usize,
    max_weight: u32,
    rng: &mut R,
) -> Result<CostMatrix<u32>> {
    if dimension == 0 {
        return Err(SolverError::InvalidInput("matrix has no vertices".into()));
    }
    // u32::MAX is reserved for missing edges
    if max_weight == 0 || max_weight == u32::MAX {
        return Err(SolverError::InvalidInput(format!(
            "max weight must be in 1..{}, got {}",
            u32::MAX,
            max_weight
        )));
    }

    let n = dimension;
    let mut weights = vec![0u32; n * n];
    for i in 0..n {
        for j in i + 1..n {
            let w = rng.gen_range(1..=max_weight);
            weights[i * n + j] = w;
            weights[j * n + i] = w;
        }
    }

    CostMatrix::from_flat(n, weights)
}
