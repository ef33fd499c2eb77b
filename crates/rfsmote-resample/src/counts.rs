//! Per-class row counts.

use std::collections::BTreeMap;
use std::fmt;

/// Row count per label, ordered by label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassCounts {
    counts: BTreeMap<usize, usize>,
}

impl ClassCounts {
    /// Count occurrences of every label.
    #[must_use]
    pub fn from_labels(labels: &[usize]) -> Self {
        let mut counts = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Count for `class`, 0 if absent.
    #[must_use]
    pub fn get(&self, class: usize) -> usize {
        self.counts.get(&class).copied().unwrap_or(0)
    }

    /// The `(label, count)` with the highest count; ties go to the smaller label.
    #[must_use]
    pub fn majority(&self) -> Option<(usize, usize)> {
        self.iter()
            .fold(None, |best, (label, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((label, count)),
            })
    }

    /// Iterate `(label, count)` in ascending label order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.counts.iter().map(|(&label, &count)| (label, count))
    }

    /// Return the labels in ascending order.
    pub fn labels(&self) -> impl Iterator<Item = usize> + '_ {
        self.counts.keys().copied()
    }

    /// Number of distinct labels.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.counts.len()
    }

    /// Total number of rows counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Whether no rows were counted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl fmt::Display for ClassCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (label, count)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{label}: {count}")?;
        }
        write!(f, "}}")
    }
}
