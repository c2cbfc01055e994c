//! # Symmetric Sequencer
//!
//! Expands every triangle tuple into each of its distinct permutations,
//! recovering the full cartesian product `[start, stop]^n` while keeping the
//! triangle's small-maximum-first traversal.
//!
//! Triangle tuples arrive sorted ascending, which is exactly the first
//! permutation in lexicographic order. Stepping with the classic
//! next-permutation algorithm then visits every distinct arrangement of the
//! multiset once, so repeated coordinates never produce duplicates and
//! nothing is filtered. Memory stays at one tuple.

use crate::error::Result;
use crate::sequence::triangled::Triangled;
use crate::sequence::Bounds;

#[derive(Debug, Clone)]
pub struct Squared {
    triangle: Triangled,
    permutation: Option<Vec<i64>>,
}

impl Squared {
    pub fn new(n: usize, bounds: Bounds) -> Result<Self> {
        Ok(Self {
            triangle: Triangled::new(n, bounds)?,
            permutation: None,
        })
    }
}

impl Iterator for Squared {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        if let Some(permutation) = self.permutation.as_mut() {
            if next_permutation(permutation) {
                return Some(permutation.clone());
            }
        }
        let base = self.triangle.next()?;
        self.permutation = Some(base.clone());
        Some(base)
    }
}

/// Rearrange `items` into the next lexicographically greater permutation.
///
/// Returns false (leaving `items` untouched) when `items` is already the
/// last permutation, i.e. sorted descending.
pub(crate) fn next_permutation(items: &mut [i64]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let Some(pivot) = (0..items.len() - 1).rev().find(|&i| items[i] < items[i + 1]) else {
        return false;
    };
    let Some(successor) = (pivot + 1..items.len())
        .rev()
        .find(|&j| items[j] > items[pivot])
    else {
        return false;
    };
    items.swap(pivot, successor);
    items[pivot + 1..].reverse();
    true
}

/// Every `n`-tuple over `[start, stop]`, ordered by triangle tuple.
pub fn squared(n: usize, start: Option<i64>, stop: Option<i64>) -> Result<Squared> {
    Squared::new(n, Bounds::new(start, stop)?)
}
