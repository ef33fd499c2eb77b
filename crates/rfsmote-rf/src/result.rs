use crate::forest::RandomForest;
use crate::importance::RankedFeature;

/// What a fit saw and produced, beyond the forest itself.
#[derive(Debug, Clone)]
pub struct TrainingMetadata {
    /// Training rows (after any oversampling and capping upstream).
    pub n_samples: usize,
    /// `max label + 1`.
    pub n_classes: usize,
    /// Candidate columns per split after resolving [`crate::MaxFeatures`].
    pub max_features: usize,
    /// Weight applied to each row of class `c`, indexed by `c`.
    pub class_weights: Vec<f64>,
    /// Nodes across all trees.
    pub total_nodes: usize,
    /// Depth of the deepest tree.
    pub deepest: usize,
}

/// A fitted forest together with its ranked importances.
#[derive(Debug)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            metadata,
        }
    }

    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Mean decrease in impurity per feature, rank 1 first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// `(name, importance)` pairs in rank order, the shape the report
    /// writers take.
    #[must_use]
    pub fn ranked_pairs(&self) -> Vec<(&str, f64)> {
        self.importances
            .iter()
            .map(|f| (f.name.as_str(), f.importance))
            .collect()
    }

    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
