//! SMOTE oversampling: synthetic minority rows interpolated toward
//! same-class nearest neighbors.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::counts::ClassCounts;
use crate::error::ResampleError;
use crate::shape::validate_matrix;

/// Target row count per class after oversampling.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Every class except the majority is brought up to this count.
    NotMajority(usize),
    /// Explicit `label -> target` counts. Every label must be present.
    Explicit(BTreeMap<usize, usize>),
}

impl SamplingStrategy {
    /// Resolve to `label -> target` for the given class counts.
    ///
    /// # Errors
    ///
    /// Returns [`ResampleError::UnknownClass`] when an explicit target names
    /// a label with no rows.
    pub fn targets(&self, counts: &ClassCounts) -> Result<BTreeMap<usize, usize>, ResampleError> {
        match self {
            SamplingStrategy::NotMajority(target) => {
                let majority = counts.majority().map(|(label, _)| label);
                Ok(counts
                    .labels()
                    .filter(|&label| Some(label) != majority)
                    .map(|label| (label, *target))
                    .collect())
            }
            SamplingStrategy::Explicit(targets) => {
                if let Some(&class) = targets.keys().find(|&&class| counts.get(class) == 0) {
                    return Err(ResampleError::UnknownClass { class });
                }
                Ok(targets.clone())
            }
        }
    }
}

/// Configuration for SMOTE oversampling.
///
/// | Parameter     | Default |
/// |---------------|---------|
/// | `strategy`    | (required) |
/// | `k_neighbors` | 5       |
/// | `seed`        | 42      |
#[derive(Debug, Clone)]
pub struct SmoteConfig {
    strategy: SamplingStrategy,
    k_neighbors: usize,
    seed: u64,
}

/// Oversampled dataset: the input rows in order, then synthetic rows grouped
/// by ascending label.
#[derive(Debug, Clone)]
pub struct Resampled {
    /// Feature rows.
    pub features: Vec<Vec<f64>>,
    /// Labels, aligned with `features`.
    pub labels: Vec<usize>,
    /// Number of synthetic rows generated per class.
    pub synthetic: BTreeMap<usize, usize>,
}

/// One synthetic row to build: base row, neighbor slot, and step.
#[derive(Debug, Clone, Copy)]
struct Draw {
    row: usize,
    slot: usize,
    step: f64,
}

impl SmoteConfig {
    /// Create a config with the given sampling strategy.
    #[must_use]
    pub fn new(strategy: SamplingStrategy) -> Self {
        Self {
            strategy,
            k_neighbors: 5,
            seed: 42,
        }
    }

    /// Set the number of nearest neighbors to interpolate toward.
    #[must_use]
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    /// Set the random seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the sampling strategy.
    #[must_use]
    pub fn strategy(&self) -> &SamplingStrategy {
        &self.strategy
    }

    /// Return the neighbor count.
    #[must_use]
    pub fn k_neighbors(&self) -> usize {
        self.k_neighbors
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Oversample every class named by the strategy up to its target.
    ///
    /// Classes already at or above their target are left unchanged. All
    /// random draws happen up front from one ChaCha8 stream; the neighbor
    /// search then runs on the rayon pool, so the output does not depend on
    /// the thread count.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ResampleError::InvalidNeighborCount`] | `k_neighbors == 0` |
    /// | [`ResampleError::EmptyDataset`] | zero rows |
    /// | [`ResampleError::LabelCountMismatch`] | labels and rows differ in length |
    /// | [`ResampleError::FeatureCountMismatch`] | ragged feature rows |
    /// | [`ResampleError::UnknownClass`] | explicit target for an absent label |
    /// | [`ResampleError::ClassTooSmallForSmote`] | a class to grow has `<= k_neighbors` rows |
    #[instrument(skip_all, fields(n_samples = features.len(), k_neighbors = self.k_neighbors))]
    pub fn resample(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<Resampled, ResampleError> {
        let k = self.k_neighbors;
        if k == 0 {
            return Err(ResampleError::InvalidNeighborCount { k_neighbors: k });
        }
        validate_matrix(features, labels)?;

        let counts = ClassCounts::from_labels(labels);
        let targets = self.strategy.targets(&counts)?;

        let plan: Vec<(usize, usize)> = targets
            .iter()
            .map(|(&class, &target)| (class, target.saturating_sub(counts.get(class))))
            .filter(|&(_, n_new)| n_new > 0)
            .collect();
        for &(class, _) in &plan {
            let count = counts.get(class);
            if count <= k {
                return Err(ResampleError::ClassTooSmallForSmote {
                    class,
                    count,
                    k_neighbors: k,
                });
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut out_features = features.to_vec();
        let mut out_labels = labels.to_vec();
        let mut synthetic = BTreeMap::new();

        for (class, n_new) in plan {
            let members: Vec<&[f64]> = features
                .iter()
                .zip(labels)
                .filter(|&(_, &label)| label == class)
                .map(|(row, _)| row.as_slice())
                .collect();

            let draws: Vec<Draw> = (0..n_new)
                .map(|_| {
                    let idx = rng.gen_range(0..members.len() * k);
                    Draw {
                        row: idx / k,
                        slot: idx % k,
                        step: rng.r#gen::<f64>(),
                    }
                })
                .collect();

            let neighbors = neighbors_of_drawn(&members, &draws, k);
            for draw in &draws {
                let base = members[draw.row];
                let nn = members[neighbors[draw.row][draw.slot]];
                out_features.push(
                    base.iter()
                        .zip(nn)
                        .map(|(&x, &y)| x + draw.step * (y - x))
                        .collect(),
                );
                out_labels.push(class);
            }

            debug!(class, count = members.len(), n_new, "class oversampled");
            synthetic.insert(class, n_new);
        }

        info!(
            n_input = labels.len(),
            n_output = out_labels.len(),
            "smote resampling complete"
        );

        Ok(Resampled {
            features: out_features,
            labels: out_labels,
            synthetic,
        })
    }
}

/// Neighbor lists for every row referenced by `draws`; other entries stay empty.
fn neighbors_of_drawn(members: &[&[f64]], draws: &[Draw], k: usize) -> Vec<Vec<usize>> {
    let mut needed = vec![false; members.len()];
    for draw in draws {
        needed[draw.row] = true;
    }
    let rows: Vec<usize> = (0..members.len()).filter(|&r| needed[r]).collect();

    let found: Vec<(usize, Vec<usize>)> = rows
        .into_par_iter()
        .map(|row| (row, k_nearest(members, row, k)))
        .collect();

    let mut neighbors = vec![Vec::new(); members.len()];
    for (row, list) in found {
        neighbors[row] = list;
    }
    neighbors
}

/// The `k` rows closest to `members[row]` by Euclidean distance, nearest
/// first, excluding `row` itself. Equal distances order by index.
fn k_nearest(members: &[&[f64]], row: usize, k: usize) -> Vec<usize> {
    let origin = members[row];
    let mut candidates: Vec<(f64, usize)> = members
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != row)
        .map(|(j, other)| (squared_distance(origin, other), j))
        .collect();

    let by_distance = |a: &(f64, usize), b: &(f64, usize)| -> Ordering {
        a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
    };
    if candidates.len() > k {
        candidates.select_nth_unstable_by(k - 1, by_distance);
        candidates.truncate(k);
    }
    candidates.sort_by(by_distance);
    candidates.into_iter().map(|(_, j)| j).collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Class 0 on a line at y = 0, class 1 on a line at y = 10.
    fn lines(n0: usize, n1: usize) -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n0 {
            features.push(vec![i as f64, 0.0]);
            labels.push(0);
        }
        for i in 0..n1 {
            features.push(vec![i as f64, 10.0]);
            labels.push(1);
        }
        (features, labels)
    }

    #[test]
    fn grows_minority_to_target() {
        let (features, labels) = lines(40, 8);
        let out = SmoteConfig::new(SamplingStrategy::NotMajority(30))
            .with_k_neighbors(3)
            .resample(&features, &labels)
            .unwrap();
        let counts = ClassCounts::from_labels(&out.labels);
        assert_eq!(counts.get(0), 40);
        assert_eq!(counts.get(1), 30);
        assert_eq!(out.synthetic.get(&1), Some(&22));
        assert_eq!(&out.features[..48], &features[..]);
    }

    #[test]
    fn synthetic_rows_stay_within_class_segment() {
        let (features, labels) = lines(20, 10);
        let out = SmoteConfig::new(SamplingStrategy::NotMajority(50))
            .with_k_neighbors(2)
            .resample(&features, &labels)
            .unwrap();
        for row in &out.features[30..] {
            assert_eq!(row[1], 10.0);
            assert!(row[0] >= 0.0 && row[0] <= 9.0);
        }
    }

    #[test]
    fn class_at_or_above_target_is_untouched() {
        let (features, labels) = lines(40, 35);
        let out = SmoteConfig::new(SamplingStrategy::NotMajority(30))
            .resample(&features, &labels)
            .unwrap();
        assert_eq!(out.labels.len(), 75);
        assert!(out.synthetic.is_empty());
    }

    #[test]
    fn deterministic_for_seed() {
        let (features, labels) = lines(30, 10);
        let run = |seed| {
            SmoteConfig::new(SamplingStrategy::NotMajority(25))
                .with_seed(seed)
                .resample(&features, &labels)
                .unwrap()
                .features
        };
        assert_eq!(run(9), run(9));
        assert_ne!(run(9), run(10));
    }

    #[test]
    fn nearest_neighbors_break_ties_by_index() {
        let pts = [vec![0.0], vec![1.0], vec![-1.0], vec![2.0]];
        let members: Vec<&[f64]> = pts.iter().map(Vec::as_slice).collect();
        assert_eq!(k_nearest(&members, 0, 2), vec![1, 2]);
        assert_eq!(k_nearest(&members, 1, 3), vec![0, 3, 2]);
    }

    #[test]
    fn explicit_strategy_validation() {
        let (features, labels) = lines(10, 10);
        let unknown = SmoteConfig::new(SamplingStrategy::Explicit(BTreeMap::from([(7, 20)])))
            .resample(&features, &labels);
        assert!(matches!(unknown, Err(ResampleError::UnknownClass { class: 7 })));

        let (features, labels) = lines(10, 4);
        let small = SmoteConfig::new(SamplingStrategy::NotMajority(20)).resample(&features, &labels);
        assert!(matches!(
            small,
            Err(ResampleError::ClassTooSmallForSmote { class: 1, count: 4, k_neighbors: 5 })
        ));

        let zero_k = SmoteConfig::new(SamplingStrategy::NotMajority(20))
            .with_k_neighbors(0)
            .resample(&features, &labels);
        assert!(matches!(zero_k, Err(ResampleError::InvalidNeighborCount { .. })));
    }
}
