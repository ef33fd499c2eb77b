/// Errors from splitting, oversampling, and capping a labeled dataset.
#[derive(Debug, thiserror::Error)]
pub enum ResampleError {
    /// Returned when the input has zero rows.
    #[error("dataset has zero samples")]
    EmptyDataset,

    /// Returned when the label vector and the feature matrix disagree in length.
    #[error("got {n_labels} labels for {n_samples} samples")]
    LabelCountMismatch {
        /// Number of feature rows.
        n_samples: usize,
        /// Number of labels.
        n_labels: usize,
    },

    /// Returned when a row has a different width than the first row.
    #[error("sample {sample_index} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        got: usize,
        /// The zero-based index of the offending row.
        sample_index: usize,
    },

    /// Returned when the test fraction is not strictly between 0 and 1.
    #[error("test fraction must lie in (0, 1), got {test_fraction}")]
    InvalidTestFraction {
        /// The invalid fraction.
        test_fraction: f64,
    },

    /// Returned when a class has too few members to appear in both partitions.
    #[error("class {class} has {count} member(s); stratified splitting needs at least 2")]
    ClassTooSmallToSplit {
        /// The under-populated class.
        class: usize,
        /// Its member count.
        count: usize,
    },

    /// Returned when a partition cannot hold one row of every class.
    #[error("{partition} size {size} is smaller than the number of classes {n_classes}")]
    PartitionTooSmall {
        /// Either `"train"` or `"test"`.
        partition: &'static str,
        /// Rows allotted to the partition.
        size: usize,
        /// Number of distinct classes.
        n_classes: usize,
    },

    /// Returned when k_neighbors is zero.
    #[error("k_neighbors must be at least 1, got {k_neighbors}")]
    InvalidNeighborCount {
        /// The invalid k_neighbors value.
        k_neighbors: usize,
    },

    /// Returned when a class to oversample has no more than k_neighbors members.
    #[error(
        "class {class} has {count} member(s); SMOTE with k_neighbors={k_neighbors} needs at least {min}",
        min = .k_neighbors + 1
    )]
    ClassTooSmallForSmote {
        /// The class being oversampled.
        class: usize,
        /// Its member count.
        count: usize,
        /// The configured neighbor count.
        k_neighbors: usize,
    },

    /// Returned when an explicit sampling strategy names a label absent from the data.
    #[error("sampling strategy names class {class}, which is absent from the labels")]
    UnknownClass {
        /// The absent class.
        class: usize,
    },

    /// Returned when the row cap is zero.
    #[error("row cap must be at least 1, got {max_rows}")]
    InvalidRowCap {
        /// The invalid cap.
        max_rows: usize,
    },
}
