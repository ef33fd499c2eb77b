//! Forest-level hyperparameters layered over a per-tree template.

use crate::class_weight::ClassWeight;
use crate::error::RfError;
use crate::result::RandomForestResult;
use crate::split::{SplitCriterion, SplitMethod};
use crate::tree::DecisionTreeConfig;

/// How many candidate columns each split may look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaxFeatures {
    /// `ceil(sqrt(n_features))`, the usual classification default.
    Sqrt,
    /// `ceil(log2(n_features))`, at least 1.
    Log2,
    /// `ceil(n_features * f)` for `f` in (0, 1].
    Fraction(f64),
    /// Exactly this many.
    Fixed(usize),
    /// Every column.
    All,
}

impl MaxFeatures {
    /// Turn the strategy into a column count for a table `n_features` wide.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidMaxFeatures`] unless the count lands in
    /// `1..=n_features`.
    pub fn resolve(self, n_features: usize) -> Result<usize, RfError> {
        let width = n_features as f64;
        let count = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Fixed(n) => n,
            MaxFeatures::Sqrt => width.sqrt().ceil() as usize,
            MaxFeatures::Log2 => width.log2().ceil().max(1.0) as usize,
            MaxFeatures::Fraction(f) => (width * f).ceil() as usize,
        };
        if (1..=n_features).contains(&count) {
            Ok(count)
        } else {
            Err(RfError::InvalidMaxFeatures {
                max_features: count,
                n_features,
            })
        }
    }
}

/// Random Forest hyperparameters.
///
/// Per-tree growth limits live in a [`DecisionTreeConfig`] template that is
/// cloned and reseeded for every tree; the forest adds the ensemble size, the
/// column-subsampling rule, class weighting and the master seed.
///
/// Defaults: `max_features = Sqrt`, `class_weight = Uniform`, `seed = 42`,
/// and [`DecisionTreeConfig::new`] for everything else.
#[derive(Debug, Clone)]
pub struct RandomForestConfig {
    pub(crate) n_trees: usize,
    pub(crate) max_features: MaxFeatures,
    pub(crate) class_weight: ClassWeight,
    pub(crate) seed: u64,
    pub(crate) tree: DecisionTreeConfig,
}

impl RandomForestConfig {
    /// Start a config for an ensemble of `n_trees`.
    ///
    /// # Errors
    ///
    /// Returns [`RfError::InvalidTreeCount`] for an empty ensemble.
    pub fn new(n_trees: usize) -> Result<Self, RfError> {
        if n_trees == 0 {
            return Err(RfError::InvalidTreeCount { n_trees });
        }
        Ok(Self {
            n_trees,
            max_features: MaxFeatures::Sqrt,
            class_weight: ClassWeight::Uniform,
            seed: 42,
            tree: DecisionTreeConfig::new(),
        })
    }

    #[must_use]
    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    #[must_use]
    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    /// Seed of the master stream every tree's seed is drawn from.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Depth cap for every tree. `None` grows until leaves are pure.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.tree = self.tree.with_max_depth(max_depth);
        self
    }

    #[must_use]
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.tree = self.tree.with_min_samples_split(min_samples_split);
        self
    }

    #[must_use]
    pub fn with_min_samples_leaf(mut self, min_samples_leaf: usize) -> Self {
        self.tree = self.tree.with_min_samples_leaf(min_samples_leaf);
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: SplitCriterion) -> Self {
        self.tree = self.tree.with_criterion(criterion);
        self
    }

    #[must_use]
    pub fn with_split_method(mut self, split_method: SplitMethod) -> Self {
        self.tree = self.tree.with_split_method(split_method);
        self
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.n_trees
    }

    #[must_use]
    pub fn max_features(&self) -> MaxFeatures {
        self.max_features
    }

    #[must_use]
    pub fn class_weight(&self) -> &ClassWeight {
        &self.class_weight
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn max_depth(&self) -> Option<usize> {
        self.tree.max_depth
    }

    #[must_use]
    pub fn split_method(&self) -> SplitMethod {
        self.tree.split_method
    }

    /// Borrow the per-tree template.
    #[must_use]
    pub fn tree(&self) -> &DecisionTreeConfig {
        &self.tree
    }

    /// Fit the ensemble on row-major `features` with zero-based `labels`.
    ///
    /// `feature_names` must name every column; they label the importance
    /// ranking.
    ///
    /// # Errors
    ///
    /// Input shape problems surface as [`RfError::EmptyDataset`],
    /// [`RfError::ZeroFeatures`], [`RfError::LabelCountMismatch`],
    /// [`RfError::FeatureCountMismatch`], [`RfError::FeatureNameMismatch`] or
    /// [`RfError::NonFiniteValue`]. Hyperparameters that cannot apply to the
    /// data surface as [`RfError::InvalidMaxFeatures`],
    /// [`RfError::InvalidMaxDepth`], [`RfError::InvalidMinSamplesSplit`],
    /// [`RfError::InvalidMinSamplesLeaf`], [`RfError::InvalidBinCount`] or
    /// [`RfError::InvalidClassWeight`].
    pub fn fit(
        &self,
        features: &[Vec<f64>],
        labels: &[usize],
        feature_names: &[String],
    ) -> Result<RandomForestResult, RfError> {
        crate::forest::train(self, features, labels, feature_names)
    }
}
