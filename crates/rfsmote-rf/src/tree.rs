use std::collections::VecDeque;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::{
    RfError,
    histogram::FeatureBins,
    node::{Node, NodeIndex, NodeStats},
    split::{SplitContext, SplitCriterion, SplitMethod, find_split},
};

/// Growth settings for one class-weighted CART tree.
///
/// Out of the box a tree uses Gini impurity and exact split search, grows
/// until its leaves are pure, looks at every column at every split and
/// seeds its column sampling with 42. Inside a forest this is the template
/// each tree clones and reseeds.
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) criterion: SplitCriterion,
    pub(crate) split_method: SplitMethod,
    pub(crate) max_depth: Option<usize>,
    pub(crate) min_samples_split: usize,
    pub(crate) min_samples_leaf: usize,
    pub(crate) max_features: Option<usize>,
    pub(crate) seed: u64,
}

impl DecisionTreeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            criterion: SplitCriterion::Gini,
            split_method: SplitMethod::Exact,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    #[must_use]
    pub fn with_split_method(mut self, split_method: SplitMethod) -> Self {
        self.split_method = split_method;
        self
    }

    /// Depth cap, counting the root as depth 0. `None` grows until pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Rows (not weight) a node needs before a split is tried.
    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    /// Rows (not weight) each child of a split must keep.
    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.min_samples_leaf = min_samples_leaf;
        self
    }

    /// Columns sampled per split. `None` means all of them.
    #[must_use]
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    /// Seed for per-split column sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject settings no tree can honour and return the per-split column
    /// count for a table `n_features` wide.
    pub(crate) fn validate(&self, n_features: usize) -> Result<usize, RfError> {
        match *self {
            Self {
                max_depth: Some(0), ..
            } => Err(RfError::InvalidMaxDepth { max_depth: 0 }),
            Self {
                min_samples_split, ..
            } if min_samples_split < 2 => Err(RfError::InvalidMinSamplesSplit { min_samples_split }),
            Self {
                min_samples_leaf: 0, ..
            } => Err(RfError::InvalidMinSamplesLeaf { min_samples_leaf: 0 }),
            Self {
                split_method: SplitMethod::Histogram { n_bins },
                ..
            } if n_bins < 2 => Err(RfError::InvalidBinCount { n_bins }),
            Self { max_features, .. } => {
                let columns = max_features.unwrap_or(n_features);
                if (1..=n_features).contains(&columns) {
                    Ok(columns)
                } else {
                    Err(RfError::InvalidMaxFeatures {
                        max_features: columns,
                        n_features,
                    })
                }
            }
        }
    }

    /// Train an unweighted tree on a row-major dataset.
    ///
    /// # Errors
    ///
    /// See [`DecisionTreeConfig::fit_weighted`].
    pub fn fit(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<DecisionTree, RfError> {
        let n_classes = n_classes(labels);
        self.fit_weighted(features, labels, &vec![1.0; n_classes])
    }

    /// Train a tree where every row of class `c` weighs `class_weights[c]`.
    ///
    /// # Errors
    ///
    /// | Variant                             | When                                            |
    /// |-------------------------------------|-------------------------------------------------|
    /// | [`RfError::EmptyDataset`]           | `features` is empty                             |
    /// | [`RfError::ZeroFeatures`]           | rows have zero feature columns                  |
    /// | [`RfError::LabelCountMismatch`]     | `labels.len() != features.len()`                |
    /// | [`RfError::FeatureCountMismatch`]   | rows have inconsistent lengths                  |
    /// | [`RfError::NonFiniteValue`]         | any value is NaN or infinite                    |
    /// | [`RfError::MissingClassWeight`]     | weight vector shorter than the class count      |
    /// | [`RfError::InvalidMaxFeatures`]     | `max_features` resolves outside [1, n_features] |
    /// | [`RfError::InvalidMaxDepth`]        | `max_depth` is `Some(0)`                        |
    /// | [`RfError::InvalidMinSamplesSplit`] | `min_samples_split` < 2                         |
    /// | [`RfError::InvalidMinSamplesLeaf`]  | `min_samples_leaf` < 1                          |
    #[instrument(skip_all, fields(n_samples = features.len()))]
    pub fn fit_weighted(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        class_weights: &[f64],
    ) -> Result<DecisionTree, RfError> {
        let n_features = validate_matrix(features, labels)?;
        let n_classes = n_classes(labels);
        if class_weights.len() < n_classes {
            return Err(RfError::MissingClassWeight {
                class: class_weights.len(),
            });
        }
        let max_features = self.validate(n_features)?;

        let col_features = to_columns(features, n_features);
        let rows: Vec<usize> = (0..features.len()).collect();
        Ok(self.grow(&col_features, labels, class_weights, n_classes, max_features, &rows))
    }

    /// Grow a tree over `rows` (which may repeat, as in a bootstrap draw).
    ///
    /// Inputs must already be validated.
    pub(crate) fn grow(
        &self,
        col_features: &[Vec<f64>],
        labels: &[usize],
        class_weights: &[f64],
        n_classes: usize,
        max_features: usize,
        rows: &[usize],
    ) -> DecisionTree {
        let bins = match self.split_method {
            SplitMethod::Histogram { n_bins } => {
                let sampled: Vec<Vec<f64>> = col_features
                    .iter()
                    .map(|col| rows.iter().map(|&r| col[r]).collect())
                    .collect();
                Some(FeatureBins::build(&sampled, n_bins))
            }
            SplitMethod::Exact => None,
        };

        let mut builder = TreeBuilder {
            ctx: SplitContext {
                col_features,
                labels,
                class_weights,
                n_classes,
                criterion: self.criterion,
                max_features,
                min_samples_leaf: self.min_samples_leaf,
            },
            config: self,
            bins,
            rng: ChaCha8Rng::seed_from_u64(self.seed),
            arena: Vec::new(),
        };
        builder.grow(rows, 0);

        debug!(n_nodes = builder.arena.len(), "decision tree built");

        DecisionTree {
            nodes: builder.arena,
            n_features: col_features.len(),
            n_classes,
        }
    }
}

impl Default for DecisionTreeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of classes implied by zero-based labels.
pub(crate) fn n_classes(labels: &[usize]) -> usize {
    labels.iter().max().copied().unwrap_or(0) + 1
}

/// Index of the first maximum.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Check shape and finiteness of a row-major matrix; return its column count.
pub(crate) fn validate_matrix(features: &[Vec<f64>], labels: &[usize]) -> Result<usize, RfError> {
    if features.is_empty() {
        return Err(RfError::EmptyDataset);
    }
    if labels.len() != features.len() {
        return Err(RfError::LabelCountMismatch {
            n_samples: features.len(),
            n_labels: labels.len(),
        });
    }
    let n_features = features[0].len();
    if n_features == 0 {
        return Err(RfError::ZeroFeatures);
    }
    for (sample_index, row) in features.iter().enumerate() {
        if row.len() != n_features {
            return Err(RfError::FeatureCountMismatch {
                expected: n_features,
                got: row.len(),
                sample_index,
            });
        }
        if let Some(feature_index) = row.iter().position(|v| !v.is_finite()) {
            return Err(RfError::NonFiniteValue {
                sample_index,
                feature_index,
            });
        }
    }
    Ok(n_features)
}

/// Transpose row-major features to column-major.
pub(crate) fn to_columns(features: &[Vec<f64>], n_features: usize) -> Vec<Vec<f64>> {
    (0..n_features)
        .map(|f| features.iter().map(|row| row[f]).collect())
        .collect()
}

/// Recursive arena builder for one tree.
struct TreeBuilder<'a> {
    ctx: SplitContext<'a>,
    config: &'a DecisionTreeConfig,
    bins: Option<FeatureBins>,
    rng: ChaCha8Rng,
    arena: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn grow(&mut self, rows: &[usize], depth: usize) -> NodeIndex {
        let n_samples = rows.len();
        let mass = self.ctx.class_mass(rows);
        let weight: f64 = mass.iter().sum();
        let impurity = self.ctx.criterion.impurity(&mass, weight);

        let pure = mass.iter().filter(|&&m| m > 0.0).count() <= 1;
        let too_few = n_samples < self.config.min_samples_split;
        let too_deep = self.config.max_depth.is_some_and(|d| depth >= d);

        let split = if pure || too_few || too_deep {
            None
        } else {
            find_split(
                &self.ctx,
                rows,
                self.config.split_method,
                self.bins.as_ref(),
                &mut self.rng,
            )
        };

        let stats = NodeStats {
            impurity,
            n_samples,
            weight,
        };
        let Some(split) = split else {
            let distribution: Vec<f64> = if weight > 0.0 {
                mass.iter().map(|&m| m / weight).collect()
            } else {
                vec![0.0; mass.len()]
            };
            let idx = self.arena.len();
            self.arena.push(Node::Leaf {
                prediction: argmax(&mass),
                distribution,
                stats,
            });
            return NodeIndex::new(idx);
        };

        // Reserve the slot so children get higher indices, then patch it.
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            prediction: 0,
            distribution: Vec::new(),
            stats,
        });
        let left = self.grow(&split.left_indices, depth + 1);
        let right = self.grow(&split.right_indices, depth + 1);

        self.arena[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
            impurity_decrease: split.impurity_decrease,
            stats,
        };
        NodeIndex::new(idx)
    }
}

/// A fitted CART decision tree stored as a node arena rooted at index 0.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
}

impl DecisionTree {
    /// Class of the leaf `sample` lands in.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict(&self, sample: &[f64]) -> Result<usize, RfError> {
        self.leaf(sample).map(|(prediction, _)| prediction)
    }

    /// Class-weighted distribution of the leaf `sample` lands in.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::PredictionFeatureMismatch`] when `sample.len() != n_features`.
    pub fn predict_proba(&self, sample: &[f64]) -> Result<&[f64], RfError> {
        self.leaf(sample).map(|(_, distribution)| distribution)
    }

    /// Mean decrease in impurity per column, normalized to sum to 1.
    ///
    /// A lone root leaf yields all zeros.
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut decrease = vec![0.0f64; self.n_features];
        let splits = self.nodes.iter().filter_map(|node| match node {
            Node::Split {
                feature,
                impurity_decrease,
                ..
            } => Some((feature.index(), impurity_decrease.max(0.0))),
            Node::Leaf { .. } => None,
        });
        for (column, gain) in splits {
            decrease[column] += gain;
        }
        let total: f64 = decrease.iter().sum();
        if total > 0.0 {
            for d in &mut decrease {
                *d /= total;
            }
        }
        decrease
    }

    /// Node arena; index 0 is the root and children follow their parent.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Splits plus leaves.
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Terminal nodes only.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Longest root-to-leaf path in edges; a lone root leaf has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut max_depth = 0usize;
        let mut queue = VecDeque::from([(NodeIndex::ROOT.index(), 0usize)]);
        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Split { left, right, .. } => {
                    queue.push_back((left.index(), d + 1));
                    queue.push_back((right.index(), d + 1));
                }
            }
        }
        max_depth
    }

    /// Walk from the root to the leaf `sample` lands in, returning its
    /// prediction and distribution.
    fn leaf(&self, sample: &[f64]) -> Result<(usize, &[f64]), RfError> {
        if sample.len() != self.n_features {
            return Err(RfError::PredictionFeatureMismatch {
                expected: self.n_features,
                got: sample.len(),
            });
        }
        let mut idx = NodeIndex::ROOT.index();
        loop {
            match &self.nodes[idx] {
                Node::Leaf {
                    prediction,
                    distribution,
                    ..
                } => return Ok((*prediction, distribution)),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    idx = if sample[feature.index()] <= *threshold {
                        left.index()
                    } else {
                        right.index()
                    };
                }
            }
        }
    }
}
