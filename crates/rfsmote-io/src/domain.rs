//! Domain types for rfsmote-io.

use std::collections::BTreeMap;

use serde::Serialize;

/// A numeric feature matrix with an integer class label per row.
///
/// Produced by [`DatasetReader`](crate::DatasetReader). `features[i]`
/// carries the values of `feature_names` for row `i`, labelled `labels[i]`.
#[derive(Debug, Clone)]
pub struct LabeledDataset {
    target: String,
    feature_names: Vec<String>,
    features: Vec<Vec<f64>>,
    labels: Vec<usize>,
    dropped_columns: Vec<String>,
}

impl LabeledDataset {
    pub(crate) fn new(
        target: String,
        feature_names: Vec<String>,
        features: Vec<Vec<f64>>,
        labels: Vec<usize>,
        dropped_columns: Vec<String>,
    ) -> Self {
        Self {
            target,
            feature_names,
            features,
            labels,
            dropped_columns,
        }
    }

    /// Return the target column name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Return the feature column names in file order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Return the feature matrix (row-major).
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Return the class labels.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Return the non-numeric columns that were left out of the features.
    #[must_use]
    pub fn dropped_columns(&self) -> &[String] {
        &self.dropped_columns
    }

    /// Return the number of rows.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.labels.len()
    }

    /// Return the number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Consume the dataset, returning `(feature_names, features, labels)`.
    #[must_use]
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<f64>>, Vec<usize>) {
        (self.feature_names, self.features, self.labels)
    }
}

/// Precision, recall, F1, and support for one class.
#[derive(Debug, Clone, Serialize)]
pub struct ClassScore {
    /// Class label.
    pub class: usize,
    /// Precision.
    pub precision: f64,
    /// Recall.
    pub recall: f64,
    /// F1 score.
    pub f1: f64,
    /// Number of true rows in the class.
    pub support: usize,
}

/// An averaged precision/recall/F1 triple.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AverageScore {
    /// Averaged precision.
    pub precision: f64,
    /// Averaged recall.
    pub recall: f64,
    /// Averaged F1.
    pub f1: f64,
}

/// One entry of the importance ranking.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureScore<'a> {
    /// Feature column name.
    pub feature: &'a str,
    /// Normalized importance.
    pub importance: f64,
    /// 1-based rank.
    pub rank: usize,
}

/// Everything written to the optional metrics JSON file.
///
/// Holds primitives only, so this crate has no dependency on the model crate.
#[derive(Debug, Clone, Serialize)]
pub struct RunMetrics<'a> {
    /// Test-set accuracy.
    pub accuracy: f64,
    /// Per-class scores in label order.
    pub classes: Vec<ClassScore>,
    /// Unweighted mean over classes.
    pub macro_avg: AverageScore,
    /// Support-weighted mean over classes.
    pub weighted_avg: AverageScore,
    /// Labels indexing the confusion matrix rows and columns.
    pub labels: &'a [usize],
    /// Confusion matrix, `[true][predicted]`.
    pub confusion_matrix: &'a [Vec<usize>],
    /// Class counts per pipeline stage, keyed by stage name.
    pub class_distribution: BTreeMap<&'a str, BTreeMap<usize, usize>>,
    /// Ranked feature importances, most important first.
    pub importances: Vec<FeatureScore<'a>>,
}
