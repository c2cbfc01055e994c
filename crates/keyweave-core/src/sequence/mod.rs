//! # Anti-Degenerate Sequencers
//!
//! Tools for the "monotonic sequencing problem": the easiest key sequences
//! to produce hold most coordinates constant, so a short run of generated
//! rows references only a sliver of the available keys. With foreign keys
//! `a` and `b` over `1..=10`, the first 10 items of the plain product all
//! have `a == 1`.
//!
//! - [`count`]: ascending integers, bounded or not
//! - [`triangled`]: non-decreasing tuples, ordered by their largest coordinate
//! - [`squared`]: every distinct permutation of each triangle tuple
//! - [`labeled`]: either of the above, yielded as `{label: value}` maps

pub mod counter;
pub mod labeled;
pub mod squared;
pub mod triangled;

use serde::{Deserialize, Serialize};

use crate::error::{KeyweaveError, Result};

pub use counter::{count, Counter};
pub use labeled::Labeled;
pub use squared::{squared, Squared};
pub use triangled::{triangled, Triangled};

/// Default first value of every sequence.
pub const DEFAULT_START: i64 = 1;

/// Validated `(start, stop)` pair. `stop == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    start: i64,
    stop: Option<i64>,
}

impl Bounds {
    /// Apply the default start and reject `start > stop`.
    pub fn new(start: Option<i64>, stop: Option<i64>) -> Result<Self> {
        let start = start.unwrap_or(DEFAULT_START);
        if let Some(stop) = stop {
            if start > stop {
                return Err(KeyweaveError::InvalidBounds { start, stop });
            }
        }
        Ok(Self { start, stop })
    }

    pub fn unbounded() -> Self {
        Self {
            start: DEFAULT_START,
            stop: None,
        }
    }

    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn stop(&self) -> Option<i64> {
        self.stop
    }

    /// Number of integers covered, or `None` when unbounded.
    pub fn size(&self) -> Option<u64> {
        self.stop.map(|stop| stop.abs_diff(self.start).saturating_add(1))
    }

    pub fn is_bounded(&self) -> bool {
        self.stop.is_some()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Which enumeration to run over the key space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sequencer {
    /// Non-decreasing tuples only; a fraction of the product.
    Triangled,
    /// The full product, in triangle order.
    #[default]
    Squared,
}

impl Sequencer {
    pub fn tuples(self, n: usize, bounds: Bounds) -> Result<Tuples> {
        Ok(match self {
            Sequencer::Triangled => Tuples::Triangled(Triangled::new(n, bounds)?),
            Sequencer::Squared => Tuples::Squared(Squared::new(n, bounds)?),
        })
    }

    pub fn labeled<S: AsRef<str>>(self, labels: &[S], bounds: Bounds) -> Result<Labeled> {
        let tuples = self.tuples(labels.len(), bounds)?;
        let labels = labels.iter().map(|l| l.as_ref().to_string()).collect();
        Ok(Labeled::new(labels, tuples))
    }
}

impl std::fmt::Display for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sequencer::Triangled => write!(f, "triangled"),
            Sequencer::Squared => write!(f, "squared"),
        }
    }
}

/// Tuple stream produced by either sequencer.
#[derive(Debug, Clone)]
pub enum Tuples {
    Triangled(Triangled),
    Squared(Squared),
}

impl Iterator for Tuples {
    type Item = Vec<i64>;

    fn next(&mut self) -> Option<Vec<i64>> {
        match self {
            Tuples::Triangled(t) => t.next(),
            Tuples::Squared(s) => s.next(),
        }
    }
}

/// Run `sequencer` over `labels.len()` dimensions, tagging coordinates with
/// their labels.
pub fn labeled<S: AsRef<str>>(
    sequencer: Sequencer,
    labels: &[S],
    start: Option<i64>,
    stop: Option<i64>,
) -> Result<Labeled> {
    sequencer.labeled(labels, Bounds::new(start, stop)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_defaults() {
        let bounds = Bounds::new(None, None).unwrap();
        assert_eq!(bounds.start(), 1);
        assert_eq!(bounds.stop(), None);
        assert_eq!(bounds.size(), None);
        assert_eq!(bounds, Bounds::default());
    }

    #[test]
    fn test_bounds_size() {
        assert_eq!(Bounds::new(Some(3), Some(7)).unwrap().size(), Some(5));
        assert_eq!(Bounds::new(Some(-2), Some(2)).unwrap().size(), Some(5));
    }

    #[test]
    fn test_bounds_reject_inverted_range() {
        assert_eq!(
            Bounds::new(Some(2), Some(1)).unwrap_err(),
            KeyweaveError::InvalidBounds { start: 2, stop: 1 }
        );
    }

    #[test]
    fn test_sequencer_serde_names() {
        #[derive(Deserialize)]
        struct Wrapper {
            sequencer: Sequencer,
        }
        let w: Wrapper = toml::from_str("sequencer = \"triangled\"").unwrap();
        assert_eq!(w.sequencer, Sequencer::Triangled);
        assert_eq!(Sequencer::default(), Sequencer::Squared);
        assert_eq!(Sequencer::Squared.to_string(), "squared");
    }

    #[test]
    fn test_triangle_is_subset_of_square() {
        let bounds = Bounds::new(None, Some(3)).unwrap();
        let triangle: Vec<Vec<i64>> = Sequencer::Triangled.tuples(3, bounds).unwrap().collect();
        let square: Vec<Vec<i64>> = Sequencer::Squared.tuples(3, bounds).unwrap().collect();
        assert!(triangle.iter().all(|t| square.contains(t)));
        assert_eq!(square.len(), 27);
    }
}
