//! Solved tours and helpers for reporting them.

use crate::weight::Accumulator;
use serde::Serialize;

/// Represents a solved tour
#[derive(Debug, Clone, Serialize)]
pub struct Tour<A> {
    /// Visiting order starting at vertex 0; the return to 0 is implicit
    pub order: Vec<usize>,
    /// Total cost of the closed tour
    pub cost: A,
    /// Algorithm that produced this tour
    pub algorithm: String,
    /// Wall-clock solve time in nanoseconds
    pub elapsed_ns: u128,
}

impl<A: Accumulator> Tour<A> {
    pub fn new(order: Vec<usize>, cost: A, algorithm: &str) -> Self {
        Tour {
            order,
            cost,
            algorithm: algorithm.to_string(),
            elapsed_ns: 0,
        }
    }

    /// Render the order as `0->3->1->2`.
    pub fn path_string(&self) -> String {
        path_string(&self.order)
    }

    /// Percentage relative deviation from a known optimum.
    pub fn prd(&self, optimum: f64) -> f64 {
        prd(self.cost.to_f64(), optimum)
    }

    /// Check that the order visits each of `dimension` vertices once, starting at 0.
    pub fn is_complete(&self, dimension: usize) -> bool {
        if self.order.len() != dimension || self.order.first() != Some(&0) {
            return false;
        }
        let mut seen = vec![false; dimension];
        for &v in &self.order {
            if v >= dimension || seen[v] {
                return false;
            }
            seen[v] = true;
        }
        true
    }
}

impl<A: Accumulator> std::fmt::Display for Tour<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Tour ({})", self.algorithm)?;
        writeln!(f, "  Cost: {}", self.cost)?;
        writeln!(f, "  Time: {} ns", self.elapsed_ns)?;
        writeln!(f, "  Path: {}", self.path_string())
    }
}

pub fn path_string(order: &[usize]) -> String {
    order
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("->")
}

/// `100 * (value - optimum) / optimum`; zero when both are zero.
pub fn prd(value: f64, optimum: f64) -> f64 {
    if optimum == 0.0 {
        return if value == 0.0 { 0.0 } else { f64::INFINITY };
    }
    100.0 * (value - optimum) / optimum
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_string() {
        let tour = Tour::new(vec![0, 3, 1, 2], 12u64, "HeldKarp");
        assert_eq!(tour.path_string(), "0->3->1->2");
        assert_eq!(path_string(&[0]), "0");
    }

    #[test]
    fn test_prd() {
        let tour = Tour::new(vec![0, 1, 2], 110u64, "HeldKarp");
        assert!((tour.prd(100.0) - 10.0).abs() < 1e-10);
        assert_eq!(prd(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_is_complete() {
        assert!(Tour::new(vec![0, 2, 1], 0u64, "x").is_complete(3));
        assert!(!Tour::new(vec![1, 0, 2], 0u64, "x").is_complete(3));
        assert!(!Tour::new(vec![0, 1, 1], 0u64, "x").is_complete(3));
        assert!(!Tour::new(vec![0, 1], 0u64, "x").is_complete(3));
    }
}
