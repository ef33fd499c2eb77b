//! Bagged, class-weighted CART ensemble and its parallel fit.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, info, instrument};

use crate::config::RandomForestConfig;
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, n_classes, to_columns, validate_matrix};

/// Trees fitted on bootstrap draws of one training table. Predictions
/// average their leaf distributions.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

impl RandomForest {
    /// Width of the rows the forest was fitted on.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Fitted trees in seed order.
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

/// Draw `n_samples` row indices with replacement.
fn bootstrap_rows(n_samples: usize, rng: &mut impl Rng) -> Vec<usize> {
    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
}

/// Fit every tree of the ensemble.
///
/// Every tree sees a bootstrap draw of the rows and its own seed from a
/// master ChaCha8 stream, so the fitted forest is independent of the
/// rayon pool size.
#[instrument(skip_all, fields(n_trees = config.n_trees, n_samples = features.len()))]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_matrix(features, labels)?;
    if feature_names.len() != n_features {
        return Err(RfError::FeatureNameMismatch {
            n_features,
            n_names: feature_names.len(),
        });
    }

    let n_samples = features.len();
    let n_classes = n_classes(labels);
    let class_weights = config.class_weight.resolve(labels, n_classes)?;
    let max_features = config.max_features.resolve(n_features)?;

    let tree_template = config.tree.clone().with_max_features(Some(max_features));
    tree_template.validate(n_features)?;

    info!(
        n_trees = config.n_trees,
        n_samples,
        n_features,
        n_classes,
        max_features,
        max_depth = ?config.tree.max_depth,
        class_weights = ?class_weights,
        "fitting forest"
    );

    let col_features = to_columns(features, n_features);

    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let trees: Vec<DecisionTree> = tree_seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let rows = bootstrap_rows(n_samples, &mut rng);
            tree_template
                .clone()
                .with_seed(rng.r#gen())
                .grow(&col_features, labels, &class_weights, n_classes, max_features, &rows)
        })
        .collect();

    let total_nodes: usize = trees.iter().map(DecisionTree::n_nodes).sum();
    let deepest = trees.iter().map(DecisionTree::depth).max().unwrap_or(0);
    debug!(total_nodes, deepest, "tree training complete");

    let per_tree: Vec<Vec<f64>> = trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree, feature_names);

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };

    let metadata = TrainingMetadata {
        n_samples,
        n_classes,
        max_features,
        class_weights,
        total_nodes,
        deepest,
    };

    info!(n_trees = forest.trees.len(), "random forest training complete");

    Ok(RandomForestResult::new(forest, importances, metadata))
}

#[cfg(test)]
mod tests {
    use crate::class_weight::ClassWeight;
    use crate::config::{MaxFeatures, RandomForestConfig};
    use crate::split::SplitMethod;
    use crate::RfError;

    /// Three well-separated classes along `x`; `y` is noise-free filler.
    fn three_bands() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for (class, offset) in [(0usize, 0.0), (1, 10.0), (2, 20.0)] {
            for i in 0..20 {
                features.push(vec![offset + i as f64 * 0.15, 0.5]);
                labels.push(class);
            }
        }
        (features, labels, vec!["x".to_string(), "y".to_string()])
    }

    fn accuracy(predictions: &[usize], labels: &[usize]) -> f64 {
        let correct = predictions.iter().zip(labels).filter(|(p, l)| p == l).count();
        correct as f64 / labels.len() as f64
    }

    #[test]
    fn three_class_separable_accuracy() {
        let (features, labels, names) = three_bands();
        for method in [SplitMethod::Exact, SplitMethod::Histogram { n_bins: 32 }] {
            let result = RandomForestConfig::new(30)
                .unwrap()
                .with_max_features(MaxFeatures::All)
                .with_split_method(method)
                .fit(&features, &labels, &names)
                .unwrap();
            let predictions = result.forest().predict_batch(&features).unwrap();
            let acc = accuracy(&predictions, &labels);
            assert!(acc > 0.9, "{method:?} accuracy = {acc}");
        }
    }

    #[test]
    fn feature_importances_sum_to_one_and_rank_signal_first() {
        let (features, labels, names) = three_bands();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .with_class_weight(ClassWeight::Balanced)
            .fit(&features, &labels, &names)
            .unwrap();

        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert!(result.importances().iter().all(|f| f.importance >= 0.0));
        assert_eq!(result.importances()[0].name, "x");
        assert_eq!(result.importances()[0].rank, 1);
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = three_bands();
        let fit = || {
            RandomForestConfig::new(10)
                .unwrap()
                .with_seed(99)
                .with_class_weight(ClassWeight::Balanced)
                .fit(&features, &labels, &names)
                .unwrap()
        };
        let (a, b) = (fit(), fit());
        assert_eq!(
            a.forest().predict_batch(&features).unwrap(),
            b.forest().predict_batch(&features).unwrap()
        );
        let ia: Vec<f64> = a.importances().iter().map(|f| f.importance).collect();
        let ib: Vec<f64> = b.importances().iter().map(|f| f.importance).collect();
        assert_eq!(ia, ib);
    }

    #[test]
    fn balanced_weights_recorded_in_metadata() {
        let (features, mut labels, names) = three_bands();
        // Make class 2 rare: relabel most of it as class 1.
        for label in labels.iter_mut().skip(45) {
            *label = 1;
        }
        let result = RandomForestConfig::new(5)
            .unwrap()
            .with_class_weight(ClassWeight::Balanced)
            .fit(&features, &labels, &names)
            .unwrap();
        let w = &result.metadata().class_weights;
        // counts: 20, 35, 5 over 60 rows.
        assert!((w[0] - 60.0 / 60.0).abs() < 1e-12);
        assert!((w[1] - 60.0 / 105.0).abs() < 1e-12);
        assert!((w[2] - 60.0 / 15.0).abs() < 1e-12);
    }

    #[test]
    fn max_depth_respected_by_every_tree() {
        let (features, labels, names) = three_bands();
        let result = RandomForestConfig::new(8)
            .unwrap()
            .with_max_depth(Some(2))
            .fit(&features, &labels, &names)
            .unwrap();
        assert!(result.forest().trees.iter().all(|t| t.depth() <= 2));
        assert!(result.metadata().deepest <= 2);
        assert_eq!(
            result.metadata().total_nodes,
            result.forest().trees.iter().map(|t| t.n_nodes()).sum::<usize>()
        );
    }

    #[test]
    fn feature_name_mismatch_error() {
        let (features, labels, _) = three_bands();
        let err = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &["only_one".to_string()])
            .unwrap_err();
        assert!(matches!(
            err,
            RfError::FeatureNameMismatch { n_features: 2, n_names: 1 }
        ));
    }

    #[test]
    fn empty_dataset_error() {
        let err = RandomForestConfig::new(10).unwrap().fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, RfError::EmptyDataset));
    }
}
