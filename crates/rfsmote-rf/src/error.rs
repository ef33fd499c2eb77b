use std::path::PathBuf;

/// Everything that can go wrong fitting, applying, scoring or persisting a
/// forest.
#[derive(Debug, thiserror::Error)]
pub enum RfError {
    // Hyperparameters.
    #[error("a forest needs at least one tree, got n_trees = {n_trees}")]
    InvalidTreeCount { n_trees: usize },

    #[error("max_depth must be at least 1, got {max_depth}")]
    InvalidMaxDepth { max_depth: usize },

    #[error("min_samples_split must be at least 2, got {min_samples_split}")]
    InvalidMinSamplesSplit { min_samples_split: usize },

    #[error("min_samples_leaf must be at least 1, got {min_samples_leaf}")]
    InvalidMinSamplesLeaf { min_samples_leaf: usize },

    /// `max_features` resolved outside `1..=n_features`.
    #[error("max_features resolved to {max_features}, outside 1..={n_features}")]
    InvalidMaxFeatures {
        max_features: usize,
        n_features: usize,
    },

    #[error("histogram split search needs at least 2 bins, got {n_bins}")]
    InvalidBinCount { n_bins: usize },

    /// A custom class weight that is negative, NaN or infinite.
    #[error("class {class} has weight {weight}; weights must be finite and >= 0")]
    InvalidClassWeight { class: usize, weight: f64 },

    /// A tree was handed fewer weights than there are classes.
    #[error("no class weight supplied for class {class}")]
    MissingClassWeight { class: usize },

    // Training data.
    #[error("no training rows")]
    EmptyDataset,

    #[error("training rows have no feature columns")]
    ZeroFeatures,

    #[error("{n_labels} labels for {n_samples} rows")]
    LabelCountMismatch { n_samples: usize, n_labels: usize },

    #[error("{n_names} feature names for {n_features} columns")]
    FeatureNameMismatch { n_features: usize, n_names: usize },

    /// A ragged row; `sample_index` is zero-based.
    #[error("row {sample_index} has {got} values, expected {expected}")]
    FeatureCountMismatch {
        expected: usize,
        got: usize,
        sample_index: usize,
    },

    #[error("NaN or infinite value at row {sample_index}, column {feature_index}")]
    NonFiniteValue {
        sample_index: usize,
        feature_index: usize,
    },

    // Prediction and scoring.
    #[error("row to predict has {got} values, forest was fitted on {expected}")]
    PredictionFeatureMismatch { expected: usize, got: usize },

    #[error("{n_predicted} predictions for {n_true} true labels")]
    PredictionCountMismatch { n_true: usize, n_predicted: usize },

    // Model files.
    #[error("failed to encode model")]
    SerializeModel { source: Box<bincode::ErrorKind> },

    #[error("failed to decode model from {path}")]
    DeserializeModel {
        path: PathBuf,
        source: Box<bincode::ErrorKind>,
    },

    #[error("failed to write model to {path}")]
    WriteModel {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read model from {path}")]
    ReadModel {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file header carries a format version this build cannot decode.
    #[error("{path} holds model format v{found}, this build reads v{expected}")]
    IncompatibleModelVersion {
        expected: u32,
        found: u32,
        path: PathBuf,
    },
}
