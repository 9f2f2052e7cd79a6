//! Edge weight types and the wider accumulators their path sums are computed in.
//!
//! Each weight type names an accumulator at least as wide as itself so that
//! summing up to `n` edges never truncates. The accumulator's maximum (or
//! `+inf` for floats) doubles as the "unreachable" marker, and additions
//! saturate to it, so an unreachable edge poisons every path that uses it.

use serde::Serialize;
use std::fmt::{Debug, Display};

/// Numeric type in which path costs are summed and compared.
pub trait Accumulator:
    Copy + PartialOrd + Debug + Display + Serialize + Send + Sync + 'static
{
    const ZERO: Self;
    const UNREACHABLE: Self;

    fn is_unreachable(self) -> bool;

    fn to_f64(self) -> f64;
}

/// Entry type of a cost matrix.
pub trait Weight: Copy + PartialOrd + Debug + Display + Send + Sync + 'static {
    type Acc: Accumulator;

    /// Value used to mark a missing edge.
    const MISSING: Self;

    fn is_missing_edge(self) -> bool;

    /// Negative values and NaN are never valid edge costs.
    fn is_invalid(self) -> bool;

    /// `acc + self`, saturating to `Acc::UNREACHABLE`.
    fn extend(self, acc: Self::Acc) -> Self::Acc;

    fn widen(self) -> Self::Acc {
        self.extend(<Self::Acc as Accumulator>::ZERO)
    }
}

macro_rules! int_accumulator {
    ($($acc:ty),*) => {$(
        impl Accumulator for $acc {
            const ZERO: Self = 0;
            const UNREACHABLE: Self = <$acc>::MAX;

            #[inline]
            fn is_unreachable(self) -> bool {
                self == <$acc>::MAX
            }

            #[inline]
            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    )*};
}

int_accumulator!(u64, u128, i64, i128);

impl Accumulator for f64 {
    const ZERO: Self = 0.0;
    const UNREACHABLE: Self = f64::INFINITY;

    #[inline]
    fn is_unreachable(self) -> bool {
        self == f64::INFINITY
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

macro_rules! int_weight {
    ($($w:ty => $acc:ty),*) => {$(
        impl Weight for $w {
            type Acc = $acc;
            const MISSING: Self = <$w>::MAX;

            #[inline]
            fn is_missing_edge(self) -> bool {
                self == <$w>::MAX
            }

            #[inline]
            #[allow(unused_comparisons)]
            fn is_invalid(self) -> bool {
                self < 0
            }

            #[inline]
            fn extend(self, acc: $acc) -> $acc {
                if self.is_missing_edge() || Accumulator::is_unreachable(acc) {
                    return <$acc as Accumulator>::UNREACHABLE;
                }
                acc.saturating_add(self as $acc)
            }
        }
    )*};
}

int_weight!(u32 => u64, u64 => u128, i32 => i64, i64 => i128);

macro_rules! float_weight {
    ($($w:ty),*) => {$(
        impl Weight for $w {
            type Acc = f64;
            const MISSING: Self = <$w>::INFINITY;

            #[inline]
            fn is_missing_edge(self) -> bool {
                self == <$w>::INFINITY
            }

            #[inline]
            fn is_invalid(self) -> bool {
                self.is_nan() || self < 0.0
            }

            #[inline]
            fn extend(self, acc: f64) -> f64 {
                acc + self as f64
            }
        }
    )*};
}

float_weight!(f32, f64);
