//! Bitmask subset enumeration.

/// Iterates over all `size`-element subsets of `{0, .., universe - 1}` as
/// bitmasks in increasing numeric order (Gosper's hack).
#[derive(Debug, Clone)]
pub struct Combinations {
    next: Option<usize>,
    limit: usize,
}

impl Combinations {
    pub fn new(universe: usize, size: usize) -> Self {
        debug_assert!(universe < usize::BITS as usize);
        let limit = 1usize << universe;
        let next = if size > universe {
            None
        } else {
            Some((1usize << size) - 1)
        };
        Combinations { next, limit }
    }
}

impl Iterator for Combinations {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.next?;
        if current == 0 {
            self.next = None;
            return Some(0);
        }

        let lowest = current & current.wrapping_neg();
        self.next = current.checked_add(lowest).and_then(|ripple| {
            let candidate = (((ripple ^ current) >> 2) / lowest) | ripple;
            (candidate < self.limit).then_some(candidate)
        });
        Some(current)
    }
}

/// Iterates over the indices of the set bits of a mask, lowest first.
#[derive(Debug, Clone, Copy)]
pub struct Bits(pub usize);

impl Iterator for Bits {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        if self.0 == 0 {
            return None;
        }
        let bit = self.0.trailing_zeros() as usize;
        self.0 &= self.0 - 1;
        Some(bit)
    }
}
