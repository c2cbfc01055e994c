use crate::error::Result;
use crate::sequence::Bounds;

/// Ascending integers `start, start + 1, ...`, inclusive of `stop` when one
/// is set.
///
/// An unbounded counter runs until `i64::MAX`, which no caller will reach.
#[derive(Debug, Clone)]
pub struct Counter {
    next: Option<i64>,
    stop: Option<i64>,
}

impl Counter {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            next: Some(bounds.start()),
            stop: bounds.stop(),
        }
    }
}

impl Iterator for Counter {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        let k = self.next?;
        self.next = match self.stop {
            Some(stop) if k >= stop => None,
            _ => k.checked_add(1),
        };
        Some(k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let Some(k) = self.next else {
            return (0, Some(0));
        };
        let remaining = self
            .stop
            .unwrap_or(i64::MAX)
            .checked_sub(k)
            .and_then(|d| d.checked_add(1))
            .and_then(|d| usize::try_from(d).ok());
        match remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (usize::MAX, None),
        }
    }
}

/// Count from `start` (default 1) up to and including `stop`, or forever.
///
/// Fails before yielding anything if `start > stop`.
pub fn count(start: Option<i64>, stop: Option<i64>) -> Result<Counter> {
    Ok(Counter::new(Bounds::new(start, stop)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyweaveError;

    #[test]
    fn test_bounded_count_is_inclusive() {
        let values: Vec<i64> = count(Some(3), Some(6)).unwrap().collect();
        assert_eq!(values, vec![3, 4, 5, 6]);
    }

    #[test]
    fn test_default_start_is_one() {
        let values: Vec<i64> = count(None, Some(3)).unwrap().collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_explicit_zero_start_is_kept() {
        let values: Vec<i64> = count(Some(0), Some(2)).unwrap().collect();
        assert_eq!(values, vec![0, 1, 2]);
    }

    #[test]
    fn test_single_value() {
        let values: Vec<i64> = count(Some(5), Some(5)).unwrap().collect();
        assert_eq!(values, vec![5]);
    }

    #[test]
    fn test_unbounded_count() {
        let values: Vec<i64> = count(None, None).unwrap().take(1000).collect();
        assert_eq!(values.len(), 1000);
        assert_eq!(values[999], 1000);
    }

    #[test]
    fn test_start_after_stop_fails_eagerly() {
        let err = count(Some(4), Some(2)).unwrap_err();
        assert_eq!(err, KeyweaveError::InvalidBounds { start: 4, stop: 2 });
    }

    #[test]
    fn test_counters_are_independent() {
        let mut a = count(None, Some(3)).unwrap();
        let b = count(None, Some(3)).unwrap();
        a.next();
        a.next();
        assert_eq!(b.collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(a.collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn test_size_hint() {
        let mut counter = count(Some(1), Some(4)).unwrap();
        assert_eq!(counter.size_hint(), (4, Some(4)));
        counter.next();
        assert_eq!(counter.size_hint(), (3, Some(3)));
        assert_eq!(
            count(Some(i64::MAX - 2), None).unwrap().size_hint(),
            (3, Some(3))
        );
    }

    #[test]
    fn test_stops_at_i64_max() {
        let values: Vec<i64> = count(Some(i64::MAX - 1), None).unwrap().collect();
        assert_eq!(values, vec![i64::MAX - 1, i64::MAX]);
    }
}
