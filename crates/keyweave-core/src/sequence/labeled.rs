use indexmap::IndexMap;

use crate::sequence::Tuples;

/// A tuple sequence whose coordinates are tagged with caller-supplied labels.
///
/// Each item maps `labels[i]` to coordinate `i`, in label order. This is the
/// form the key iteration engine consumes, with column names as labels.
#[derive(Debug, Clone)]
pub struct Labeled {
    labels: Vec<String>,
    tuples: Tuples,
}

impl Labeled {
    pub(crate) fn new(labels: Vec<String>, tuples: Tuples) -> Self {
        Self { labels, tuples }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl Iterator for Labeled {
    type Item = IndexMap<String, i64>;

    fn next(&mut self) -> Option<Self::Item> {
        let tuple = self.tuples.next()?;
        Some(self.labels.iter().cloned().zip(tuple).collect())
    }
}
