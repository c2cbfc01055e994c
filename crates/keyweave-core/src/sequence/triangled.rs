//! # Diagonal Sequencer
//!
//! Enumerates the "triangle" of `[start, stop]^n`: the tuples whose
//! coordinates are non-decreasing left to right. Naively truncating the full
//! cartesian product pins every early tuple to `coordinate[0] == start`; the
//! triangle instead advances the largest coordinate roughly every `n`
//! tuples, so a short prefix already touches every axis.
//!
//! The order is the one produced by the recursive construction
//!
//! ```text
//! triangled(1)     = (k)              for k in count(start, stop)
//! triangled(n > 1) = (ext, t0, ...)   for (t0, ...) in triangled(n - 1)
//!                                     for ext in count(start, t0)
//! ```
//!
//! i.e. by the last (largest) coordinate first, then by each earlier
//! coordinate from right to left. The iterator keeps only the current tuple
//! and computes its successor in place.

use crate::error::{KeyweaveError, Result};
use crate::sequence::Bounds;

/// Lazy iterator over non-decreasing `n`-tuples inside the bounds.
#[derive(Debug, Clone)]
pub struct Triangled {
    current: Option<Vec<i64>>,
    start: i64,
    upper: i64,
    started: bool,
}

impl Triangled {
    pub fn new(n: usize, bounds: Bounds) -> Result<Self> {
        if n == 0 {
            return Err(KeyweaveError::ZeroDimension);
        }
        Ok(Self {
            current: Some(vec![bounds.start(); n]),
            start: bounds.start(),
            upper: bounds.stop().unwrap_or(i64::MAX),
            started: false,
        })
    }

    pub fn dimension(&self) -> Option<usize> {
        self.current.as_ref().map(Vec::len)
    }

    /// Advance `current` to the next tuple, or clear it when exhausted.
    ///
    /// The lowest coordinate that may still grow is the first one strictly
    /// below its right neighbour (or the last coordinate, below `upper`).
    /// It is incremented and every coordinate to its left resets to `start`.
    fn advance(&mut self) {
        let Some(tuple) = self.current.as_mut() else {
            return;
        };
        let last = tuple.len() - 1;
        let pivot = (0..tuple.len()).find(|&i| {
            if i < last {
                tuple[i] < tuple[i + 1]
            } else {
                tuple[i] < self.upper
            }
        });

        match pivot {
            Some(i) => {
                tuple[i] += 1;
                for coord in &mut tuple[..i] {
                    *coord = self.start;
                }
            }
            None => self.current = None,
        }
    }
}

impl Iterator for Triangled {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        if self.started {
            self.advance();
        }
        self.started = true;
        self.current.clone()
    }
}

/// Non-decreasing `n`-tuples over `[start, stop]` (start defaults to 1, an
/// unset stop means unbounded).
pub fn triangled(n: usize, start: Option<i64>, stop: Option<i64>) -> Result<Triangled> {
    Triangled::new(n, Bounds::new(start, stop)?)
}
