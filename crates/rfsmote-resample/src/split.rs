//! Stratified train/test splitting.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::counts::ClassCounts;
use crate::error::ResampleError;
use crate::shape::validate_matrix;

/// Configuration for a seeded stratified split.
///
/// | Parameter       | Default |
/// |-----------------|---------|
/// | `test_fraction` | (required) |
/// | `seed`          | 42      |
#[derive(Debug, Clone)]
pub struct StratifiedSplit {
    test_fraction: f64,
    seed: u64,
}

/// The two partitions produced by [`StratifiedSplit::split`].
///
/// Rows keep their original relative order within each partition.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    /// Training feature rows.
    pub train_features: Vec<Vec<f64>>,
    /// Training labels.
    pub train_labels: Vec<usize>,
    /// Test feature rows.
    pub test_features: Vec<Vec<f64>>,
    /// Test labels.
    pub test_labels: Vec<usize>,
}

/// Test-row allotment for one class.
#[derive(Debug)]
struct Allotment {
    label: usize,
    count: usize,
    n_test: usize,
    remainder: usize,
}

impl StratifiedSplit {
    /// Create a split holding out `test_fraction` of the rows.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::InvalidTestFraction`] unless `0 < test_fraction < 1`.
    pub fn new(test_fraction: f64) -> Result<Self, ResampleError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ResampleError::InvalidTestFraction { test_fraction });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the test fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Split rows into train and test partitions with matching class proportions.
    ///
    /// The test partition holds `ceil(n * test_fraction)` rows. Every class
    /// gets at least one row in each partition.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ResampleError::EmptyDataset`] | zero rows |
    /// | [`ResampleError::LabelCountMismatch`] | labels and rows differ in length |
    /// | [`ResampleError::FeatureCountMismatch`] | ragged feature rows |
    /// | [`ResampleError::ClassTooSmallToSplit`] | a class has a single member |
    /// | [`ResampleError::PartitionTooSmall`] | a partition cannot hold every class |
    #[instrument(skip_all, fields(n_samples = features.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<TrainTestSplit, ResampleError> {
        validate_matrix(features, labels)?;

        let n = labels.len();
        let counts = ClassCounts::from_labels(labels);
        if let Some((class, count)) = counts.iter().find(|&(_, count)| count < 2) {
            return Err(ResampleError::ClassTooSmallToSplit { class, count });
        }

        let n_classes = counts.n_classes();
        let n_test = (n as f64 * self.test_fraction).ceil() as usize;
        let n_train = n - n_test.min(n);
        if n_test < n_classes {
            return Err(ResampleError::PartitionTooSmall {
                partition: "test",
                size: n_test,
                n_classes,
            });
        }
        if n_train < n_classes {
            return Err(ResampleError::PartitionTooSmall {
                partition: "train",
                size: n_train,
                n_classes,
            });
        }

        let allotments = allot_test_rows(&counts, n, n_test);

        let mut rows_by_class: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (row, &label) in labels.iter().enumerate() {
            rows_by_class.entry(label).or_default().push(row);
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut is_test = vec![false; n];
        for allotment in &allotments {
            let Some(rows) = rows_by_class.get_mut(&allotment.label) else {
                continue;
            };
            rows.shuffle(&mut rng);
            for &row in &rows[..allotment.n_test] {
                is_test[row] = true;
            }
            debug!(
                class = allotment.label,
                count = allotment.count,
                n_test = allotment.n_test,
                "class allotment"
            );
        }

        let mut out = TrainTestSplit {
            train_features: Vec::with_capacity(n_train),
            train_labels: Vec::with_capacity(n_train),
            test_features: Vec::with_capacity(n_test),
            test_labels: Vec::with_capacity(n_test),
        };
        for ((row, &label), test) in features.iter().zip(labels).zip(is_test) {
            if test {
                out.test_features.push(row.clone());
                out.test_labels.push(label);
            } else {
                out.train_features.push(row.clone());
                out.train_labels.push(label);
            }
        }
        Ok(out)
    }
}

/// Distribute `n_test` rows across classes in proportion to their counts.
///
/// Each class starts from `floor(n_test * count / n)`, raised to 1. Any
/// excess is taken back from the largest allotments; any shortfall is handed
/// out by descending remainder (ties to the smaller label), never exceeding
/// `count - 1`. Callers guarantee `n_classes <= n_test <= n - n_classes`.
fn allot_test_rows(counts: &ClassCounts, n: usize, n_test: usize) -> Vec<Allotment> {
    let mut allotments: Vec<Allotment> = counts
        .iter()
        .map(|(label, count)| {
            let share = n_test * count;
            Allotment {
                label,
                count,
                n_test: (share / n).max(1),
                remainder: share % n,
            }
        })
        .collect();

    let mut total: usize = allotments.iter().map(|a| a.n_test).sum();
    while total > n_test {
        let Some(largest) = allotments
            .iter_mut()
            .filter(|a| a.n_test > 1)
            .max_by(|a, b| a.n_test.cmp(&b.n_test).then(b.remainder.cmp(&a.remainder)))
        else {
            break;
        };
        largest.n_test -= 1;
        total -= 1;
    }

    let mut order: Vec<usize> = (0..allotments.len()).collect();
    order.sort_by(|&a, &b| {
        allotments[b]
            .remainder
            .cmp(&allotments[a].remainder)
            .then(allotments[a].label.cmp(&allotments[b].label))
    });
    while total < n_test {
        let before = total;
        for &i in &order {
            if total == n_test {
                break;
            }
            let a = &mut allotments[i];
            if a.n_test + 1 < a.count {
                a.n_test += 1;
                total += 1;
            }
        }
        if total == before {
            break;
        }
    }
    allotments
}
