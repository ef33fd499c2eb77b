//! Failures while loading the indicator table or writing run artifacts.

use std::path::PathBuf;

/// Errors raised by [`crate::DatasetReader`] and [`crate::ReportWriter`].
///
/// Every variant names the file involved; row indices count data rows from
/// zero, header excluded.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input CSV could not be opened.
    #[error("data file {path} not found or unreadable")]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The CSV reader rejected a record.
    #[error("malformed CSV in {path} near byte {offset}")]
    CsvParse {
        path: PathBuf,
        /// Byte position the reader had reached.
        offset: u64,
        source: csv::Error,
    },

    /// Header present, no data rows.
    #[error("{path} has a header but no data rows")]
    EmptyDataset { path: PathBuf },

    /// The target is absent, or present but not numeric.
    #[error("target column \"{target}\" is not a numeric column of {path}")]
    MissingTargetColumn { path: PathBuf, target: String },

    /// Nothing numeric is left once the target is set aside.
    #[error("{path} has no numeric feature column besides \"{target}\"")]
    NoFeatureColumns { path: PathBuf, target: String },

    #[error("{path}: row {row_index} has {got} cells, header has {expected}")]
    InconsistentRowLength {
        path: PathBuf,
        row_index: usize,
        expected: usize,
        got: usize,
    },

    /// An empty, NaN or infinite cell in a numeric column.
    #[error("{path}: row {row_index}, column \"{column}\" holds \"{raw}\", not a finite number")]
    NonFiniteValue {
        path: PathBuf,
        row_index: usize,
        column: String,
        /// Cell text as read.
        raw: String,
    },

    /// A target value that is negative or has a fractional part.
    #[error("{path}: row {row_index} has class label {value}, expected a non-negative integer")]
    InvalidLabel {
        path: PathBuf,
        row_index: usize,
        value: f64,
    },

    #[error("failed to create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write importance table {path}")]
    WriteCsv { path: PathBuf, source: csv::Error },

    #[error("failed to encode metrics for {path}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// plotters reported a drawing or encoding failure.
    #[error("failed to render chart {path}: {message}")]
    Chart { path: PathBuf, message: String },
}
